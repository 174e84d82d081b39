//! Outbound side of a client's live channel
//!
//! The websocket writer owns the receiving half. Sends never block and
//! never fail the run: once the client is gone, messages are dropped.

use portal_e2e_common::{AggregateReport, LogLine, ServerMessage, Severity, TestStatus};
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl EventChannel {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { tx }
    }

    /// A channel together with the receiver that drains it
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Returns false when the client has gone away
    pub fn send(&self, message: ServerMessage) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(_) => {
                trace!("Live channel closed, dropping message");
                false
            }
        }
    }

    pub fn log(&self, level: Severity, message: impl Into<String>) -> bool {
        self.send(ServerMessage::log(level, message))
    }

    pub fn line(&self, line: &LogLine) -> bool {
        self.send(ServerMessage::from(line))
    }

    pub fn test_status(&self, test_name: &str, status: TestStatus) -> bool {
        self.send(ServerMessage::test_status(test_name, status))
    }

    pub fn complete(&self, level: Severity, message: impl Into<String>, summary: Option<AggregateReport>) -> bool {
        self.send(ServerMessage::complete(level, message, summary))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_after_receiver_dropped() {
        let (channel, rx) = EventChannel::pair();
        assert!(channel.log(Severity::Info, "hello"));
        drop(rx);
        assert!(channel.is_closed());
        assert!(!channel.log(Severity::Info, "nobody listening"));
    }

    #[test]
    fn test_messages_arrive_in_order() {
        let (channel, mut rx) = EventChannel::pair();
        channel.log(Severity::Info, "first");
        channel.test_status("t", TestStatus::Passed);
        channel.complete(Severity::Success, "done", None);

        assert_eq!(rx.try_recv().unwrap(), ServerMessage::log(Severity::Info, "first"));
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::TestStatus { .. }));
        assert!(rx.try_recv().unwrap().is_complete());
    }
}
