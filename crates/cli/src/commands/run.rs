//! Terminal test run
//!
//! Drives the same orchestrator the dashboard uses and prints the relayed
//! events instead of pushing them over a websocket.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::output::{print_error, print_log, print_success, print_warning, OutputFormat};
use portal_e2e_common::{
    Browser, DashboardConfig, DataKind, RunRequest, ServerMessage, Severity, SuiteCatalog, TestData,
    TestSelection, TestStatus,
};
use portal_e2e_runner::{EventChannel, Orchestrator};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Suite to run (login, register, profile, ...)
    #[arg(short, long)]
    pub suite: String,

    /// Test id within the suite; repeat to select several (default: all)
    #[arg(short, long = "test")]
    pub tests: Vec<String>,

    /// Account email; defaults to the fixture's list when the suite needs emails
    #[arg(long = "email")]
    pub emails: Vec<String>,

    /// Registration country; defaults to the fixture's list when the suite needs countries
    #[arg(long = "country")]
    pub countries: Vec<String>,

    /// Browser project (chromium, firefox, edge)
    #[arg(short, long, default_value = "chromium")]
    pub browser: Browser,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

impl RunArgs {
    /// Build the run request, filling missing data from the fixture
    fn to_request(&self, catalog: &SuiteCatalog, fixture: impl FnOnce() -> TestData) -> RunRequest {
        let mut request = RunRequest {
            tests: self
                .tests
                .iter()
                .map(|name| TestSelection::new(&self.suite, name))
                .collect(),
            emails: self.emails.clone(),
            countries: self.countries.clone(),
            browser: self.browser,
            headless: !self.headed,
            ..Default::default()
        };
        if request.tests.is_empty() {
            request.test_type = Some(self.suite.clone());
        }

        let needs = catalog.get(&self.suite).and_then(|s| s.data);
        match needs {
            Some(DataKind::Emails) if request.emails.is_empty() => request.emails = fixture().emails,
            Some(DataKind::Countries) if request.countries.is_empty() => {
                request.countries = fixture().countries
            }
            _ => {}
        }

        request
    }
}

pub async fn execute(args: RunArgs, config: &DashboardConfig, format: OutputFormat) -> Result<bool> {
    let orchestrator = Orchestrator::from_config(config);
    let request = args.to_request(orchestrator.catalog(), || config.test_data_source().load_or_default());
    let normalized = request.validate(orchestrator.catalog())?;

    let (channel, rx) = EventChannel::pair();
    let printer = tokio::spawn(print_events(rx, format));

    let session = orchestrator.run_all(&normalized, &channel).await;
    drop(channel);

    let level = printer.await?;
    if let Some(path) = &session.summary_path {
        if format != OutputFormat::Json {
            print_success(&format!("Summary written to {}", path.display()));
        }
    }

    Ok(level == Some(Severity::Success))
}

/// Print events until the channel closes; yields the COMPLETE level
async fn print_events(mut rx: UnboundedReceiver<ServerMessage>, format: OutputFormat) -> Option<Severity> {
    let mut completed = None;

    while let Some(message) = rx.recv().await {
        if let ServerMessage::Complete { level, .. } = &message {
            completed = Some(*level);
        }

        if format == OutputFormat::Json {
            match message.to_json() {
                Ok(line) => println!("{}", line),
                Err(e) => print_warning(&format!("Could not encode event: {}", e)),
            }
            continue;
        }

        match message {
            ServerMessage::Log { level, message } => print_log(level, &message),
            ServerMessage::TestStatus { test_name, status } => match status {
                TestStatus::Passed => println!("  {} {}", "passed".green(), test_name),
                TestStatus::Failed => println!("  {} {}", "failed".red(), test_name),
            },
            ServerMessage::Complete { level, message, summary } => {
                println!();
                match level {
                    Severity::Success => print_success(&message),
                    _ => print_error(&message),
                }
                if let Some(summary) = summary {
                    println!(
                        "  {} passed, {} failed, {} total in {:.1}s",
                        summary.passed_count,
                        summary.failed_count,
                        summary.total_count,
                        summary.duration as f64 / 1000.0
                    );
                }
            }
        }
    }

    completed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(suite: &str) -> RunArgs {
        RunArgs {
            suite: suite.to_string(),
            tests: Vec::new(),
            emails: Vec::new(),
            countries: Vec::new(),
            browser: Browser::Firefox,
            headed: false,
        }
    }

    fn fixture() -> TestData {
        TestData {
            emails: vec!["fixture@x.com".into()],
            countries: vec!["Cyprus".into()],
        }
    }

    #[test]
    fn test_whole_suite_uses_fixture_data() {
        let catalog = SuiteCatalog::builtin();
        let request = args("login").to_request(&catalog, fixture);

        assert_eq!(request.test_type.as_deref(), Some("login"));
        assert_eq!(request.emails, vec!["fixture@x.com".to_string()]);
        assert!(request.countries.is_empty());
        assert!(request.headless);

        let normalized = request.validate(&catalog).unwrap();
        assert_eq!(normalized.total_tests(), 4);
        assert_eq!(normalized.browser, Browser::Firefox);
    }

    #[test]
    fn test_explicit_selection_wins() {
        let catalog = SuiteCatalog::builtin();
        let mut run = args("register");
        run.tests = vec!["currencies".into()];
        run.countries = vec!["Greece".into()];
        run.headed = true;

        let request = run.to_request(&catalog, || panic!("fixture should not be read"));
        assert_eq!(request.tests, vec![TestSelection::new("register", "currencies")]);
        assert_eq!(request.countries, vec!["Greece".to_string()]);
        assert!(!request.headless);
        assert!(request.test_type.is_none());
    }

    #[test]
    fn test_suite_without_data_skips_fixture() {
        let catalog = SuiteCatalog::builtin();
        let request = args("profile").to_request(&catalog, || panic!("fixture should not be read"));
        assert!(request.validate(&catalog).is_ok());
    }

    #[test]
    fn test_unknown_suite_fails_validation() {
        let catalog = SuiteCatalog::builtin();
        let request = args("checkout").to_request(&catalog, fixture);
        assert!(request.validate(&catalog).is_err());
    }

    #[tokio::test]
    async fn test_printer_reports_complete_level() {
        let (channel, rx) = EventChannel::pair();
        channel.log(Severity::Info, "Starting");
        channel.complete(Severity::Error, "Tests completed with failures in LOGIN", None);
        drop(channel);

        assert_eq!(print_events(rx, OutputFormat::Json).await, Some(Severity::Error));
    }
}
