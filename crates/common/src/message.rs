//! Live channel wire format
//!
//! JSON text frames. Inbound: `{"type":"RUN_TESTS", ...}` only. Outbound:
//! `LOG` (any time), `COMPLETE` (exactly one per run, always last) and the
//! informational `TEST_STATUS`.

use serde::{Deserialize, Serialize};

use crate::report::AggregateReport;
use crate::request::RunRequest;
use crate::types::{LogLine, Severity, TestStatus};

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    RunTests(RunRequest),
}

impl ClientMessage {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Frames the server pushes to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Log {
        level: Severity,
        message: String,
    },
    Complete {
        level: Severity,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<Box<AggregateReport>>,
    },
    TestStatus {
        #[serde(rename = "testName")]
        test_name: String,
        status: TestStatus,
    },
}

impl ServerMessage {
    pub fn log(level: Severity, message: impl Into<String>) -> Self {
        ServerMessage::Log {
            level,
            message: message.into(),
        }
    }

    pub fn complete(level: Severity, message: impl Into<String>, summary: Option<AggregateReport>) -> Self {
        ServerMessage::Complete {
            level,
            message: message.into(),
            summary: summary.map(Box::new),
        }
    }

    pub fn test_status(test_name: impl Into<String>, status: TestStatus) -> Self {
        ServerMessage::TestStatus {
            test_name: test_name.into(),
            status,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ServerMessage::Complete { .. })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&LogLine> for ServerMessage {
    fn from(line: &LogLine) -> Self {
        ServerMessage::log(line.severity, line.text.clone())
    }
}
