//! Test data fixture (selectable emails and countries)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;

/// The subset of `testData.json` the dashboard exposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestData {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
}

impl TestData {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Missing or unreadable fixtures yield empty lists
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to load test data from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Where the selectable emails and countries are read from.
///
/// Countries always come from the fixture; emails come from a separate
/// JSON array when `emails` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDataSource {
    pub data: PathBuf,
    pub emails: Option<PathBuf>,
}

impl TestDataSource {
    pub fn new(data: impl Into<PathBuf>) -> Self {
        Self {
            data: data.into(),
            emails: None,
        }
    }

    pub fn with_emails(mut self, emails: impl Into<PathBuf>) -> Self {
        self.emails = Some(emails.into());
        self
    }

    pub fn load(&self) -> Result<TestData> {
        match &self.emails {
            Some(emails) => Ok(TestData {
                emails: load_list(emails)?,
                countries: TestData::load(&self.data)?.countries,
            }),
            None => TestData::load(&self.data),
        }
    }

    /// Each file falls back to an empty list on its own
    pub fn load_or_default(&self) -> TestData {
        let mut data = TestData::load_or_default(&self.data);
        if let Some(path) = &self.emails {
            data.emails = match load_list(path) {
                Ok(emails) => emails,
                Err(e) => {
                    warn!("Failed to load emails from {}: {}", path.display(), e);
                    Vec::new()
                }
            };
        }
        data
    }
}

fn load_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_ignores_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testData.json");
        std::fs::write(
            &path,
            r#"{"emails":["a@x.com"],"password":"secret","countries":["Cyprus"],"registrationDefaults":{}}"#,
        )
        .unwrap();

        let data = TestData::load(&path).unwrap();
        assert_eq!(data.emails, vec!["a@x.com"]);
        assert_eq!(data.countries, vec!["Cyprus"]);
    }

    #[test]
    fn test_separate_emails_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("testData.json");
        let emails = dir.path().join("emails.json");
        std::fs::write(&data, r#"{"emails":["fixture@x.com"],"countries":["Cyprus"]}"#).unwrap();
        std::fs::write(&emails, r#"["one@x.com","two@x.com"]"#).unwrap();

        let source = TestDataSource::new(&data).with_emails(&emails);
        let loaded = source.load().unwrap();
        assert_eq!(loaded.emails, vec!["one@x.com", "two@x.com"]);
        assert_eq!(loaded.countries, vec!["Cyprus"]);

        assert_eq!(TestDataSource::new(&data).load().unwrap().emails, vec!["fixture@x.com"]);
    }

    #[test]
    fn test_emails_file_without_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let emails = dir.path().join("emails.json");
        std::fs::write(&emails, r#"["one@x.com"]"#).unwrap();

        let source = TestDataSource::new(dir.path().join("missing.json")).with_emails(&emails);
        assert!(source.load().is_err());

        let data = source.load_or_default();
        assert_eq!(data.emails, vec!["one@x.com"]);
        assert!(data.countries.is_empty());
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data = TestData::load_or_default(&dir.path().join("missing.json"));
        assert!(data.emails.is_empty());
        assert!(data.countries.is_empty());
    }
}
