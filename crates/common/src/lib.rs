//! Portal E2E Common Library
//!
//! Shared types for the test dashboard: the suite catalog, run requests,
//! live-channel messages, result artifacts and configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod message;
pub mod report;
pub mod request;
pub mod types;

// Re-export commonly used types
pub use catalog::{SuiteCatalog, SuiteDef, TestDef};
pub use config::{ClassifierConfig, ClassifyRule, DashboardConfig, RunnerCommandConfig, StreamMatch};
pub use error::{Error, Result, ValidationError};
pub use fixtures::{TestData, TestDataSource};
pub use message::{ClientMessage, ServerMessage};
pub use report::{AggregateReport, ArtifactContents, ReportStats, ResultArtifact, TestResult, TestStep};
pub use request::{NormalizedRunRequest, RunRequest, SuiteSelection, TestSelection};
pub use types::*;

/// Portal E2E version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
