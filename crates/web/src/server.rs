//! Dashboard web server

use crate::live::{handle_socket, RunCoordinator};
use crate::static_files;
use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use portal_e2e_common::{DashboardConfig, TestDataSource, VERSION};
use portal_e2e_runner::{list_reports, Orchestrator};

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<AppState>,
}

struct AppState {
    coordinator: RunCoordinator,
    public_dir: PathBuf,
    reports_dir: PathBuf,
    test_data: TestDataSource,
}

/// Run the dashboard server until it fails
pub async fn serve(config: DashboardConfig) -> anyhow::Result<()> {
    let addr = config.listen;
    WebServer::new(&config).serve(addr).await
}

impl WebServer {
    pub fn new(config: &DashboardConfig) -> Self {
        Self::with_orchestrator(config, Orchestrator::from_config(config))
    }

    /// Build around a preconfigured orchestrator
    pub fn with_orchestrator(config: &DashboardConfig, orchestrator: Orchestrator) -> Self {
        Self {
            state: Arc::new(AppState {
                coordinator: RunCoordinator::new(Arc::new(orchestrator)),
                public_dir: config.public_path(),
                reports_dir: config.reports_path(),
                test_data: config.test_data_source(),
            }),
        }
    }

    /// Create router
    pub fn router(&self) -> Router {
        Router::new()
            // Dashboard page; also accepts the live channel upgrade
            .route("/", get(root_handler))
            .route("/ws", get(ws_handler))
            // API endpoints
            .route("/api/health", get(health_handler))
            .route("/api/suites", get(suites_handler))
            .route("/api/tests", get(tests_handler))
            .route("/api/emails", get(emails_handler))
            .route("/api/countries", get(countries_handler))
            .route("/api/reports", get(reports_handler))
            .route("/api/run", get(run_status_handler))
            // Generated HTML/JSON reports
            .nest_service("/reports", ServeDir::new(&self.state.reports_dir))
            // Dashboard assets
            .fallback_service(ServeDir::new(&self.state.public_dir))
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Dashboard starting on http://{}", addr);
        info!("Public dir: {}", self.state.public_dir.display());
        info!("Reports dir: {}", self.state.reports_dir.display());

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

// ============================================================================
// Live channel
// ============================================================================

async fn root_handler(State(state): State<Arc<AppState>>, ws: Option<WebSocketUpgrade>) -> Response {
    match ws {
        Some(ws) => upgrade(ws, &state),
        None => static_files::index(&state.public_dir).await,
    }
}

async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    upgrade(ws, &state)
}

fn upgrade(ws: WebSocketUpgrade, state: &AppState) -> Response {
    let coordinator = state.coordinator.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "portal-e2e-web",
        "version": VERSION,
    }))
}

async fn suites_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.coordinator.catalog().suites().to_vec())
}

#[derive(Debug, Deserialize)]
struct TestsQuery {
    #[serde(rename = "type")]
    suite: Option<String>,
}

async fn tests_handler(State(state): State<Arc<AppState>>, Query(query): Query<TestsQuery>) -> Response {
    let Some(name) = query.suite.filter(|s| !s.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "missing 'type' query parameter" })),
        )
            .into_response();
    };

    match state.coordinator.catalog().get(&name) {
        Some(suite) => Json(suite.tests.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown suite: {}", name) })),
        )
            .into_response(),
    }
}

async fn emails_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.test_data.load_or_default().emails)
}

async fn countries_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.test_data.load_or_default().countries)
}

async fn reports_handler(State(state): State<Arc<AppState>>) -> Response {
    match list_reports(&state.reports_dir) {
        Ok(reports) => Json(reports).into_response(),
        Err(e) => {
            error!("Failed to list reports: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn run_status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "running": state.coordinator.is_running() }))
}
