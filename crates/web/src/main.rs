use std::path::PathBuf;

use tracing::info;

use portal_e2e_common::config::ENV_CONFIG;
use portal_e2e_common::DashboardConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // PORTAL_E2E_CONFIG points at an optional TOML file; PORTAL_E2E_ADDR and
    // friends override individual settings.
    let config_path = std::env::var(ENV_CONFIG)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref())?;

    info!(
        "Starting Portal E2E dashboard on http://{} (project: {})",
        config.listen,
        config.project_dir.display()
    );

    portal_e2e_web::serve(config).await
}
