//! Sequential orchestrator
//!
//! Runs the suites of a validated request one after another, each suite's
//! process fully finished before the next is started. Every failure mode
//! (spawn, exit code, missing or corrupt artifact) is absorbed here and
//! surfaced to the client as LOG lines; the run always ends with exactly one
//! COMPLETE message.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};
use uuid::Uuid;

use portal_e2e_common::{
    AggregateReport, DashboardConfig, LogLine, NormalizedRunRequest, Severity, SuiteCatalog,
};

use crate::aggregate::ResultAggregator;
use crate::channel::EventChannel;
use crate::invocation::SuiteRun;
use crate::reports::write_summary;
use crate::suite::{SuiteExecutor, SuiteRunner};

/// What happened to one suite of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteRunOutcome {
    pub suite: String,
    pub exit_code: i32,
    pub lines: Vec<LogLine>,
    /// Artifact folded into the report, if one was found and parsed
    pub artifact: Option<PathBuf>,
}

/// State of a single run, owned by the task driving it
#[derive(Debug, Clone)]
pub struct RunSession {
    pub id: Uuid,
    pub request: NormalizedRunRequest,
    pub report: AggregateReport,
    pub outcomes: Vec<SuiteRunOutcome>,
    pub summary_path: Option<PathBuf>,
}

impl RunSession {
    fn start(request: NormalizedRunRequest) -> Self {
        let id = Uuid::new_v4();
        let report = AggregateReport::new(
            id.to_string(),
            request.suite_names().map(str::to_string).collect(),
            request.browser.display_name(),
            request.mode(),
            Utc::now(),
        );
        Self {
            id,
            request,
            report,
            outcomes: Vec::new(),
            summary_path: None,
        }
    }

    /// Every suite exited with code 0
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.exit_code == 0)
    }

    pub fn failed_suites(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.exit_code != 0)
            .map(|o| o.suite.as_str())
    }
}

pub struct Orchestrator {
    catalog: Arc<SuiteCatalog>,
    executor: Arc<dyn SuiteExecutor>,
    aggregator: ResultAggregator,
}

impl Orchestrator {
    pub fn new(catalog: Arc<SuiteCatalog>, executor: Arc<dyn SuiteExecutor>, aggregator: ResultAggregator) -> Self {
        Self {
            catalog,
            executor,
            aggregator,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            Arc::new(config.catalog()),
            Arc::new(SuiteRunner::from_config(config)),
            ResultAggregator::new(config.reports_path()),
        )
    }

    pub fn catalog(&self) -> &SuiteCatalog {
        &self.catalog
    }

    pub fn reports_dir(&self) -> &Path {
        self.aggregator.reports_dir()
    }

    /// Run every selected suite in order and finish with one COMPLETE
    pub async fn run_all(&self, request: &NormalizedRunRequest, channel: &EventChannel) -> RunSession {
        let mut session = RunSession::start(request.clone());
        info!(
            run_id = %session.id,
            suites = ?request.suite_names().collect::<Vec<_>>(),
            tests = request.total_tests(),
            browser = %request.browser,
            mode = %request.mode(),
            "Starting test run"
        );

        for selection in &request.suites {
            let outcome = self.run_suite(&mut session.report, request, &selection.suite, &selection.tests, channel).await;
            if outcome.exit_code != 0 {
                session.report.record_suite_failure(&outcome.suite);
            }
            session.outcomes.push(outcome);
        }

        session.report.finalize(Utc::now());

        match write_summary(self.aggregator.reports_dir(), &session.report) {
            Ok(path) => {
                info!(run_id = %session.id, path = %path.display(), "Wrote run summary");
                session.summary_path = Some(path);
            }
            Err(e) => {
                warn!(run_id = %session.id, error = %e, "Failed to write run summary");
                channel.log(Severity::Warning, format!("⚠ Could not write run summary: {}", e));
            }
        }

        let stats = session.report.stats();
        let (level, message) = if session.success() {
            (
                Severity::Success,
                format!(
                    "All tests completed successfully ({} passed, {} failed, {} total)",
                    stats.passed, stats.failed, stats.total
                ),
            )
        } else {
            let failed: Vec<&str> = session.failed_suites().collect();
            (
                Severity::Error,
                format!(
                    "Tests completed with failures in {} ({} passed, {} failed, {} total)",
                    failed.join(", "),
                    stats.passed,
                    stats.failed,
                    stats.total
                ),
            )
        };

        info!(
            run_id = %session.id,
            success = session.success(),
            passed = stats.passed,
            failed = stats.failed,
            duration_ms = session.report.duration,
            "Test run finished"
        );
        channel.complete(level, message, Some(session.report.clone()));

        session
    }

    async fn run_suite(
        &self,
        report: &mut AggregateReport,
        request: &NormalizedRunRequest,
        name: &str,
        tests: &[String],
        channel: &EventChannel,
    ) -> SuiteRunOutcome {
        let Some(suite) = self.catalog.get(name) else {
            let text = format!("✗ Unknown suite: {}", name);
            channel.log(Severity::Error, text.clone());
            return SuiteRunOutcome {
                suite: name.to_string(),
                exit_code: 1,
                lines: vec![LogLine::new(Severity::Error, text)],
                artifact: None,
            };
        };

        let run = SuiteRun {
            suite,
            tests,
            emails: &request.emails,
            countries: &request.countries,
            browser: request.browser,
            headless: request.headless,
        };

        channel.log(
            Severity::Info,
            format!(
                "Starting {} suite with {} test(s) on {} ({} mode)...",
                name.to_uppercase(),
                tests.len(),
                request.browser,
                request.mode()
            ),
        );
        if let Some(kind) = suite.data {
            let values = run.data();
            if !values.is_empty() {
                channel.log(Severity::Info, format!("Selected {}: {}", kind, values.join(", ")));
            }
        }

        let started = SystemTime::now();
        let execution = self.executor.run(&run, channel).await;

        let artifact = match self.aggregator.collect_since(name, started) {
            Ok(Some(artifact)) => {
                for test in &artifact.contents.tests {
                    channel.test_status(&test.name, test.status);
                }
                let stats = artifact.contents.stats;
                channel.log(
                    Severity::Info,
                    format!(
                        "{} results: {} passed, {} failed, {} total",
                        name.to_uppercase(),
                        stats.passed,
                        stats.failed,
                        stats.total
                    ),
                );
                report.fold(artifact.contents);
                Some(artifact.path)
            }
            Ok(None) => {
                warn!(suite = %name, "No result artifact found");
                channel.log(
                    Severity::Warning,
                    format!("⚠ No result artifact found for {} suite", name.to_uppercase()),
                );
                None
            }
            Err(e) => {
                warn!(suite = %name, error = %e, "Failed to read result artifact");
                channel.log(
                    Severity::Error,
                    format!("✗ Could not read {} results: {}", name.to_uppercase(), e),
                );
                None
            }
        };

        SuiteRunOutcome {
            suite: name.to_string(),
            exit_code: execution.exit_code,
            lines: execution.lines,
            artifact,
        }
    }
}
