//! Result artifact discovery
//!
//! The external reporter writes `report_<suite>_<YYYY-MM-DD_HH-MM-SS>.json` into the
//! reports directory. After a suite finishes, the newest matching artifact
//! written since the suite started is taken as its result.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use portal_e2e_common::ArtifactContents;

use crate::error::{RunnerError, RunnerResult};

/// Tolerated skew between our clock and the artifact's mtime
pub const ARTIFACT_CLOCK_SLACK: Duration = Duration::from_secs(1);

/// A parsed artifact and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteArtifact {
    pub path: PathBuf,
    pub contents: ArtifactContents,
}

#[derive(Debug, Clone)]
pub struct ResultAggregator {
    reports_dir: PathBuf,
}

impl ResultAggregator {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Newest artifact for `suite` modified at or after `since`
    pub fn find_latest(&self, suite: &str, since: Option<SystemTime>) -> RunnerResult<Option<PathBuf>> {
        let entries = match std::fs::read_dir(&self.reports_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let threshold = since.map(|t| t.checked_sub(ARTIFACT_CLOCK_SLACK).unwrap_or(t));

        let mut newest: Option<(SystemTime, String, PathBuf)> = None;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_suite_artifact(&name, suite) {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            if let Some(threshold) = threshold {
                if modified < threshold {
                    debug!(suite = %suite, file = %name, "Ignoring stale artifact");
                    continue;
                }
            }

            let candidate = (modified, name, entry.path());
            if newest
                .as_ref()
                .map_or(true, |current| (&candidate.0, &candidate.1) > (&current.0, &current.1))
            {
                newest = Some(candidate);
            }
        }

        Ok(newest.map(|(_, _, path)| path))
    }

    /// Newest artifact for `suite` regardless of age
    pub fn collect(&self, suite: &str) -> RunnerResult<Option<SuiteArtifact>> {
        self.collect_matching(suite, None)
    }

    /// Newest artifact for `suite` written since `since`
    pub fn collect_since(&self, suite: &str, since: SystemTime) -> RunnerResult<Option<SuiteArtifact>> {
        self.collect_matching(suite, Some(since))
    }

    fn collect_matching(&self, suite: &str, since: Option<SystemTime>) -> RunnerResult<Option<SuiteArtifact>> {
        let Some(path) = self.find_latest(suite, since)? else {
            return Ok(None);
        };

        let text = std::fs::read_to_string(&path)?;
        let contents = ArtifactContents::from_json(&text).map_err(|e| RunnerError::Artifact {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            suite = %suite,
            path = %path.display(),
            total = contents.stats.total,
            "Collected result artifact"
        );
        Ok(Some(SuiteArtifact { path, contents }))
    }
}

/// `report_<suite>_<stamp>.json` where the stamp is digits, `-` and `_`
pub fn is_suite_artifact(file_name: &str, suite: &str) -> bool {
    file_name
        .strip_prefix("report_")
        .and_then(|rest| rest.strip_prefix(suite))
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".json"))
        .map_or(false, |stamp| !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use yare::parameterized;

    const LOGIN_ARTIFACT: &str = r#"{"testType":"login","tests":[
        {"name":"should display login form elements","status":"passed","duration":100},
        {"name":"should show validation for empty fields","status":"failed","duration":200}
    ]}"#;

    #[parameterized(
        reporter_stamp = { "report_login_2025-01-01_10-00-00.json", "login", true },
        epoch_millis = { "report_login_1736000000000.json", "login", true },
        empty_stamp = { "report_login_.json", "login", false },
        html_report = { "report_login_123.html", "login", false },
        other_suite = { "report_register_123.json", "login", false },
        letters_in_stamp = { "report_login_abc.json", "login", false },
        prefix_only = { "report_log_2025-01-01_10-00-00.json", "login", false },
        summary_file = { "summary_123_x.json", "login", false },
    )]
    fn artifact_names(name: &str, suite: &str, expected: bool) {
        assert_eq!(is_suite_artifact(name, suite), expected);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = ResultAggregator::new(dir.path().join("nope"));
        assert!(aggregator.collect("login").unwrap().is_none());
    }

    #[test]
    fn test_newest_artifact_wins() {
        let dir = tempfile::tempdir().unwrap();
        let older = dir.path().join("report_login_1000.json");
        let newer = dir.path().join("report_login_2000.json");
        std::fs::write(&older, r#"{"stats":{"total":1,"passed":1,"failed":0}}"#).unwrap();
        std::fs::write(&newer, LOGIN_ARTIFACT).unwrap();
        std::fs::write(dir.path().join("report_register_3000.json"), "[]").unwrap();

        let now = SystemTime::now();
        File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(now - Duration::from_secs(60))
            .unwrap();

        let aggregator = ResultAggregator::new(dir.path());
        let artifact = aggregator.collect("login").unwrap().unwrap();
        assert_eq!(artifact.path, newer);
        assert_eq!(artifact.contents.stats.total, 2);
        assert_eq!(artifact.contents.stats.failed, 1);
    }

    #[test]
    fn test_stale_artifact_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("report_login_1000.json");
        std::fs::write(&stale, LOGIN_ARTIFACT).unwrap();
        let started = SystemTime::now();
        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(started - Duration::from_secs(30))
            .unwrap();

        let aggregator = ResultAggregator::new(dir.path());
        assert!(aggregator.collect_since("login", started).unwrap().is_none());
        assert!(aggregator.collect("login").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_artifact_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report_profile_1.json"), "{ not json").unwrap();

        let aggregator = ResultAggregator::new(dir.path());
        let err = aggregator.collect("profile").unwrap_err();
        assert!(matches!(err, RunnerError::Artifact { .. }));
    }
}
