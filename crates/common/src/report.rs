//! Result artifacts and the aggregate run report
//!
//! The external reporter writes one JSON artifact per suite run:
//!
//! ```text
//! {
//!   "testType": "login", "browser": "Chromium", "headless": true,
//!   "startTime": "...", "endTime": "...", "duration": "12.34",
//!   "stats": { "total": 3, "passed": 2, "failed": 1 },
//!   "tests": [ { "name", "status", "duration", "steps", "description" } ]
//! }
//! ```
//!
//! A bare array of test records and a stats-only document are accepted too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::types::{RunMode, TestStatus};

/// One step of a test as recorded by the reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStep {
    #[serde(default)]
    pub number: u32,

    #[serde(default, alias = "title")]
    pub description: String,

    #[serde(default = "default_step_status")]
    pub status: TestStatus,
}

fn default_step_status() -> TestStatus {
    TestStatus::Passed
}

/// Result of one test, consumed from the reporter's artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,

    pub status: TestStatus,

    /// Milliseconds
    #[serde(default, deserialize_with = "lenient_number")]
    pub duration: f64,

    #[serde(default)]
    pub steps: Vec<TestStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Pass/fail counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub passed: usize,
    #[serde(default)]
    pub failed: usize,
}

impl ReportStats {
    pub fn from_results(results: &[TestResult]) -> Self {
        let passed = results
            .iter()
            .filter(|r| r.status == TestStatus::Passed)
            .count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }
}

/// The per-suite JSON document written by the reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultArtifact {
    #[serde(default)]
    pub test_type: Option<String>,

    #[serde(default)]
    pub browser: Option<String>,

    #[serde(default)]
    pub headless: Option<bool>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    /// Seconds; the reporter writes it as a string
    #[serde(default, deserialize_with = "lenient_optional_number")]
    pub duration: Option<f64>,

    #[serde(default)]
    pub stats: Option<ReportStats>,

    #[serde(default)]
    pub tests: Option<Vec<TestResult>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactDocument {
    Records(Vec<TestResult>),
    Report(ResultArtifact),
}

/// What a suite contributes to the aggregate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactContents {
    /// Per-test records, empty for a stats-only artifact
    pub tests: Vec<TestResult>,
    pub stats: ReportStats,
}

impl ArtifactContents {
    /// Parse an artifact, preferring per-test records over summary counts
    pub fn from_json(text: &str) -> Result<Self> {
        let document: ArtifactDocument = serde_json::from_str(text)?;
        match document {
            ArtifactDocument::Records(tests) => Ok(Self::from_records(tests)),
            ArtifactDocument::Report(ResultArtifact {
                tests: Some(tests), ..
            }) if !tests.is_empty() => Ok(Self::from_records(tests)),
            ArtifactDocument::Report(ResultArtifact {
                stats: Some(stats), ..
            }) => Ok(Self {
                tests: Vec::new(),
                stats,
            }),
            ArtifactDocument::Report(ResultArtifact {
                tests: Some(tests), ..
            }) => Ok(Self::from_records(tests)),
            ArtifactDocument::Report(_) => Err(Error::InvalidArtifact(
                "document has neither test records nor stats".to_string(),
            )),
        }
    }

    fn from_records(tests: Vec<TestResult>) -> Self {
        let stats = ReportStats::from_results(&tests);
        Self { tests, stats }
    }
}

/// Consolidated summary of one run across every suite it executed.
///
/// Built incrementally, one fold per completed suite, then finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub run_id: String,
    pub suite_label: String,
    pub suites: Vec<String>,
    pub browser_label: String,
    pub mode: RunMode,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tests: Vec<TestResult>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub total_count: usize,
    /// Milliseconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub failed_suites: Vec<String>,
}

impl AggregateReport {
    pub fn new(
        run_id: impl Into<String>,
        suites: Vec<String>,
        browser_label: impl Into<String>,
        mode: RunMode,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            suite_label: suite_label(&suites),
            suites,
            browser_label: browser_label.into(),
            mode,
            start_time,
            end_time: None,
            tests: Vec::new(),
            passed_count: 0,
            failed_count: 0,
            total_count: 0,
            duration: 0,
            failed_suites: Vec::new(),
        }
    }

    /// Fold one suite's artifact into the running totals
    pub fn fold(&mut self, contents: ArtifactContents) {
        self.passed_count += contents.stats.passed;
        self.failed_count += contents.stats.failed;
        self.total_count += contents.stats.total;
        self.tests.extend(contents.tests);
    }

    pub fn record_suite_failure(&mut self, suite: &str) {
        if !self.failed_suites.iter().any(|s| s == suite) {
            self.failed_suites.push(suite.to_string());
        }
    }

    pub fn finalize(&mut self, end_time: DateTime<Utc>) {
        let elapsed = end_time - self.start_time;
        self.duration = elapsed.num_milliseconds().max(0) as u64;
        self.end_time = Some(end_time);
    }

    pub fn is_success(&self) -> bool {
        self.failed_suites.is_empty()
    }

    pub fn stats(&self) -> ReportStats {
        ReportStats {
            total: self.total_count,
            passed: self.passed_count,
            failed: self.failed_count,
        }
    }
}

/// "Login", "Login, Register", ...
pub fn suite_label(suites: &[String]) -> String {
    suites
        .iter()
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(", ")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_number(deserializer)?.unwrap_or_default())
}

fn lenient_optional_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) => s.trim().parse().ok(),
        None => None,
    })
}
