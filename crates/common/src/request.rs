//! Run request model
//!
//! Validation is pure: a request either normalizes into per-suite
//! selections in first-seen order or is refused before any process starts.

use serde::{Deserialize, Serialize};

use crate::catalog::SuiteCatalog;
use crate::error::ValidationError;
use crate::types::{Browser, DataKind, RunMode};

/// One selected test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSelection {
    pub name: String,
    pub suite: String,
}

impl TestSelection {
    pub fn new(suite: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            suite: suite.to_string(),
        }
    }
}

/// An "execute tests" request as received from a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub tests: Vec<TestSelection>,

    #[serde(default)]
    pub emails: Vec<String>,

    #[serde(default)]
    pub countries: Vec<String>,

    #[serde(default)]
    pub browser: Browser,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Single-suite form sent by older dashboards: run every test of
    /// `testType` with `selectedItems` as the suite's data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_items: Vec<String>,
}

fn default_headless() -> bool {
    true
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            tests: Vec::new(),
            emails: Vec::new(),
            countries: Vec::new(),
            browser: Browser::default(),
            headless: true,
            test_type: None,
            selected_items: Vec::new(),
        }
    }
}

impl RunRequest {
    pub fn validate(&self, catalog: &SuiteCatalog) -> Result<NormalizedRunRequest, ValidationError> {
        validate(self, catalog)
    }
}

/// Tests selected from one suite, in request order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSelection {
    pub suite: String,
    pub tests: Vec<String>,
}

/// A validated request grouped by suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRunRequest {
    pub suites: Vec<SuiteSelection>,
    pub emails: Vec<String>,
    pub countries: Vec<String>,
    pub browser: Browser,
    pub headless: bool,
}

impl NormalizedRunRequest {
    pub fn total_tests(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }

    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.suites.iter().map(|s| s.suite.as_str())
    }

    pub fn mode(&self) -> RunMode {
        RunMode::from_headless(self.headless)
    }

    /// Selected values for a data kind
    pub fn data(&self, kind: DataKind) -> &[String] {
        match kind {
            DataKind::Emails => &self.emails,
            DataKind::Countries => &self.countries,
        }
    }
}

/// Validate and normalize a run request against the catalog
pub fn validate(
    request: &RunRequest,
    catalog: &SuiteCatalog,
) -> Result<NormalizedRunRequest, ValidationError> {
    let mut emails = dedup(&request.emails);
    let mut countries = dedup(&request.countries);

    let tests = if request.tests.is_empty() {
        expand_legacy(request, catalog, &mut emails, &mut countries)?
    } else {
        request.tests.clone()
    };

    if tests.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    let mut suites: Vec<SuiteSelection> = Vec::new();
    for selection in &tests {
        let suite = catalog
            .get(&selection.suite)
            .ok_or_else(|| ValidationError::UnknownSuite(selection.suite.clone()))?;

        if suite.test(&selection.name).is_none() {
            return Err(ValidationError::UnknownTest {
                suite: selection.suite.clone(),
                test: selection.name.clone(),
            });
        }

        match suites.iter_mut().find(|s| s.suite == selection.suite) {
            Some(group) => {
                if !group.tests.contains(&selection.name) {
                    group.tests.push(selection.name.clone());
                }
            }
            None => suites.push(SuiteSelection {
                suite: selection.suite.clone(),
                tests: vec![selection.name.clone()],
            }),
        }
    }

    for group in &suites {
        let data = catalog.get(&group.suite).and_then(|s| s.data);
        let missing = match data {
            Some(DataKind::Emails) => emails.is_empty(),
            Some(DataKind::Countries) => countries.is_empty(),
            None => false,
        };
        if let (true, Some(data)) = (missing, data) {
            return Err(ValidationError::MissingSelectionData {
                suite: group.suite.clone(),
                data,
            });
        }
    }

    Ok(NormalizedRunRequest {
        suites,
        emails,
        countries,
        browser: request.browser,
        headless: request.headless,
    })
}

fn expand_legacy(
    request: &RunRequest,
    catalog: &SuiteCatalog,
    emails: &mut Vec<String>,
    countries: &mut Vec<String>,
) -> Result<Vec<TestSelection>, ValidationError> {
    let Some(test_type) = request.test_type.as_deref() else {
        return Ok(Vec::new());
    };

    let suite = catalog
        .get(test_type)
        .ok_or_else(|| ValidationError::UnknownSuite(test_type.to_string()))?;

    let items = dedup(&request.selected_items);
    match suite.data {
        Some(DataKind::Emails) if emails.is_empty() => *emails = items,
        Some(DataKind::Countries) if countries.is_empty() => *countries = items,
        _ => {}
    }

    Ok(suite
        .tests
        .iter()
        .map(|t| TestSelection::new(&suite.name, &t.name))
        .collect())
}

/// Trim, drop blanks and duplicates, keep first-seen order
fn dedup(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}
