//! Live channel over WebSocket
//!
//! Bridges one client connection to the run coordinator: inbound text
//! frames are parsed as run commands, outbound messages are drained from
//! the connection's event channel and written as JSON text frames.

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use portal_e2e_common::{ClientMessage, RunRequest, ServerMessage, Severity, SuiteCatalog, ValidationError};
use portal_e2e_runner::{EventChannel, Orchestrator, RunSession};

/// Why a run command was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(ValidationError),
    Busy,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Invalid(e) => write!(f, "Invalid run request: {}", e),
            Rejection::Busy => write!(f, "A test run is already in progress; wait for it to complete"),
        }
    }
}

/// Admits at most one run at a time across every connection
#[derive(Clone)]
pub struct RunCoordinator {
    orchestrator: Arc<Orchestrator>,
    lock: Arc<Mutex<()>>,
}

impl RunCoordinator {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn catalog(&self) -> &SuiteCatalog {
        self.orchestrator.catalog()
    }

    pub fn is_running(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Validate and start a run in the background.
    ///
    /// The run keeps going if the client disconnects; its output is then
    /// dropped.
    pub fn submit(&self, request: RunRequest, channel: EventChannel) -> Result<JoinHandle<RunSession>, Rejection> {
        let normalized = request.validate(self.catalog()).map_err(Rejection::Invalid)?;
        let guard = self.lock.clone().try_lock_owned().map_err(|_| Rejection::Busy)?;

        let orchestrator = self.orchestrator.clone();
        Ok(tokio::spawn(async move {
            let _guard = guard;
            orchestrator.run_all(&normalized, &channel).await
        }))
    }

    /// Handle one inbound text frame; malformed or refused commands
    /// produce a single error LOG to the sender.
    pub fn handle_frame(&self, text: &str, channel: &EventChannel) -> Option<JoinHandle<RunSession>> {
        let request = match ClientMessage::from_json(text) {
            Ok(ClientMessage::RunTests(request)) => request,
            Err(e) => {
                debug!(error = %e, "Ignoring malformed live-channel frame");
                channel.log(Severity::Error, format!("Error: {}", e));
                return None;
            }
        };

        match self.submit(request, channel.clone()) {
            Ok(handle) => Some(handle),
            Err(rejection) => {
                info!(reason = %rejection, "Run request refused");
                channel.log(Severity::Error, format!("✗ {}", rejection));
                None
            }
        }
    }
}

/// Upper bound on flushing queued frames once the client has gone
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Serve one WebSocket connection until the client goes away
pub async fn handle_socket(socket: WebSocket, coordinator: RunCoordinator) {
    let (ws_write, ws_read) = socket.split();
    serve_connection(ws_write, ws_read, coordinator).await;
}

/// Pump one connection: inbound frames go to the coordinator, the
/// connection's event channel is written back out as JSON text frames.
///
/// Frames queued before the client leaves are still flushed; events from a
/// run that outlives the connection are dropped.
pub async fn serve_connection<W, R, E>(mut ws_write: W, mut ws_read: R, coordinator: RunCoordinator)
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: std::fmt::Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    info!("Live channel connected");

    let (channel, mut rx) = EventChannel::pair();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let mut writer = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                biased;
                message = rx.recv() => message,
                _ = &mut shutdown_rx => break,
            };
            let Some(message) = message else { break };
            if !send_frame(&mut ws_write, message).await {
                return;
            }
        }
        while let Ok(message) = rx.try_recv() {
            if !send_frame(&mut ws_write, message).await {
                return;
            }
        }
        let _ = ws_write.close().await;
    });

    while let Some(frame) = ws_read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                trace!("Live frame: {} bytes", text.len());
                coordinator.handle_frame(&text, &channel);
            }
            Ok(Message::Binary(_)) => {
                channel.log(Severity::Error, "Error: binary frames are not supported");
            }
            Ok(Message::Close(_)) => {
                debug!("Live channel closed by client");
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                debug!("Live channel error: {}", e);
                break;
            }
        }
    }

    // Any in-flight run keeps its own channel handle and finishes unobserved
    drop(channel);
    let _ = shutdown_tx.send(());
    if tokio::time::timeout(WRITER_FLUSH_TIMEOUT, &mut writer).await.is_err() {
        debug!("Live channel flush timed out");
        writer.abort();
    }
    info!("Live channel disconnected");
}

async fn send_frame<W>(ws_write: &mut W, message: ServerMessage) -> bool
where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    let text = match message.to_json() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to encode live message: {}", e);
            return true;
        }
    };
    match ws_write.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Live channel send failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portal_e2e_common::LogLine;
    use portal_e2e_runner::{ResultAggregator, SuiteExecution, SuiteExecutor, SuiteRun};
    use std::path::Path;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::Notify;

    struct GatedExecutor {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl SuiteExecutor for GatedExecutor {
        async fn run(&self, run: &SuiteRun<'_>, channel: &EventChannel) -> SuiteExecution {
            self.gate.notified().await;
            let line = LogLine::new(Severity::Info, format!("ran {}", run.suite.name));
            channel.line(&line);
            SuiteExecution {
                exit_code: 0,
                lines: vec![line],
            }
        }
    }

    fn coordinator(reports: &Path, gate: Arc<Notify>) -> RunCoordinator {
        let orchestrator = Orchestrator::new(
            Arc::new(SuiteCatalog::builtin()),
            Arc::new(GatedExecutor { gate }),
            ResultAggregator::new(reports),
        );
        RunCoordinator::new(Arc::new(orchestrator))
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    const PROFILE_RUN: &str = r#"{"type":"RUN_TESTS","tests":[{"name":"profile-update-success","suite":"profile"}],"browser":"chromium","headless":true}"#;

    #[tokio::test]
    async fn test_malformed_frames_yield_one_error_each() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(Notify::new()));
        let (channel, mut rx) = EventChannel::pair();

        for frame in ["not json", r#"{"type":"STOP_TESTS"}"#, r#"{"tests":[]}"#] {
            assert!(coordinator.handle_frame(frame, &channel).is_none());
        }

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 3);
        assert!(messages
            .iter()
            .all(|m| matches!(m, ServerMessage::Log { level: Severity::Error, .. })));
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_validation_error_starts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(Notify::new()));
        let (channel, mut rx) = EventChannel::pair();

        let frame = r#"{"type":"RUN_TESTS","tests":[],"browser":"chromium","headless":true}"#;
        assert!(coordinator.handle_frame(frame, &channel).is_none());

        match drain(&mut rx).as_slice() {
            [ServerMessage::Log { level, message }] => {
                assert_eq!(*level, Severity::Error);
                assert!(message.contains("no tests selected"));
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let coordinator = coordinator(dir.path(), gate.clone());

        let (first, mut first_rx) = EventChannel::pair();
        let (second, mut second_rx) = EventChannel::pair();

        let handle = coordinator.handle_frame(PROFILE_RUN, &first).unwrap();
        assert!(coordinator.is_running());
        assert!(coordinator.handle_frame(PROFILE_RUN, &second).is_none());

        gate.notify_one();
        let session = handle.await.unwrap();
        assert!(session.success());
        assert!(!coordinator.is_running());

        let rejected = drain(&mut second_rx);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(&rejected[0], ServerMessage::Log { message, .. } if message.contains("already in progress")));

        let messages = drain(&mut first_rx);
        assert!(messages.last().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_run_accepted_after_previous_completes() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let coordinator = coordinator(dir.path(), gate.clone());
        let (channel, _rx) = EventChannel::pair();

        for _ in 0..2 {
            let handle = coordinator.handle_frame(PROFILE_RUN, &channel).unwrap();
            gate.notify_one();
            handle.await.unwrap();
        }
    }

    fn frames(frames: Vec<Message>) -> impl Stream<Item = Result<Message, axum::Error>> + Unpin {
        futures::stream::iter(frames.into_iter().map(Ok::<Message, axum::Error>))
    }

    fn sent(mut out: futures::channel::mpsc::UnboundedReceiver<Message>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(Some(frame)) = out.try_next() {
            match frame {
                Message::Text(text) => messages.push(serde_json::from_str(&text).unwrap()),
                other => panic!("unexpected frame: {:?}", other),
            }
        }
        messages
    }

    #[tokio::test]
    async fn test_binary_frame_keeps_connection_open() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(Notify::new()));
        let (sink, out) = futures::channel::mpsc::unbounded::<Message>();

        let inbound = frames(vec![
            Message::Binary(vec![1, 2, 3]),
            Message::Text("not json".to_string()),
            Message::Close(None),
        ]);
        serve_connection(sink, inbound, coordinator).await;

        let messages = sent(out);
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[0],
            ServerMessage::Log { level: Severity::Error, message } if message.contains("binary frames")
        ));
        assert!(matches!(
            &messages[1],
            ServerMessage::Log { level: Severity::Error, message } if message.starts_with("Error:")
        ));
    }

    #[tokio::test]
    async fn test_disconnect_does_not_wait_for_run() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let coordinator = coordinator(dir.path(), gate.clone());
        let (sink, _out) = futures::channel::mpsc::unbounded::<Message>();

        let inbound = frames(vec![Message::Text(PROFILE_RUN.to_string()), Message::Close(None)]);
        tokio::time::timeout(
            Duration::from_secs(5),
            serve_connection(sink, inbound, coordinator.clone()),
        )
        .await
        .unwrap();

        // The run outlives the connection
        assert!(coordinator.is_running());
        gate.notify_one();
    }
}
