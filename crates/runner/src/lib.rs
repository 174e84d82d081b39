//! Portal E2E Runner
//!
//! Drives the external browser test runner for the dashboard:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Orchestrator::run_all(request, channel)                      │
//! │    for each suite, in first-seen order:                       │
//! │      ├── announce (suite, test count, selected data)          │
//! │      ├── SuiteExecutor::run  ── spawn ─► external runner      │
//! │      │     └── stdout/stderr ─► LineBuffer ─► LineClassifier  │
//! │      │                                  └─► EventChannel      │
//! │      └── ResultAggregator::collect_since ─► AggregateReport   │
//! │    write summary, send COMPLETE                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod channel;
pub mod classify;
pub mod error;
pub mod invocation;
pub mod lines;
pub mod orchestrator;
pub mod reports;
pub mod suite;

pub use aggregate::{ResultAggregator, SuiteArtifact};
pub use channel::EventChannel;
pub use classify::LineClassifier;
pub use error::{RunnerError, RunnerResult};
pub use invocation::{build_env, Invocation, SuiteRun};
pub use lines::LineBuffer;
pub use orchestrator::{Orchestrator, RunSession, SuiteRunOutcome};
pub use reports::{list_reports, write_summary, ReportEntry};
pub use suite::{SuiteExecution, SuiteExecutor, SuiteRunner};
