//! Suite catalog
//!
//! Defined once at startup and read-only afterwards. Each suite maps to a
//! directory under the runner's test root and lists the tests an operator
//! can pick, keyed by a stable id with the title the test framework reports.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::DataKind;

/// A selectable test inside a suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDef {
    /// Stable identifier used in run requests
    pub name: String,
    /// Title as reported by the test framework (used for `--grep`)
    pub title: String,
}

impl TestDef {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
        }
    }
}

/// A named group of related tests sharing a data-requirement shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteDef {
    pub name: String,

    /// Directory under the tests root (defaults to the suite name)
    #[serde(default)]
    pub dir: Option<String>,

    /// Per-account data the suite needs
    #[serde(default)]
    pub data: Option<DataKind>,

    pub tests: Vec<TestDef>,
}

impl SuiteDef {
    pub fn directory(&self) -> &str {
        self.dir.as_deref().unwrap_or(&self.name)
    }

    pub fn test(&self, name: &str) -> Option<&TestDef> {
        self.tests.iter().find(|t| t.name == name)
    }

    /// True when `selected` names every test in the suite
    pub fn covers_all(&self, selected: &[String]) -> bool {
        let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
        self.tests.iter().all(|t| selected.contains(t.name.as_str()))
    }

    /// Title filter for a strict subset of the suite, `None` when the
    /// selection covers the whole suite.
    pub fn grep_pattern(&self, selected: &[String]) -> Option<String> {
        if self.covers_all(selected) {
            return None;
        }

        let titles: Vec<String> = selected
            .iter()
            .filter_map(|name| self.test(name))
            .map(|t| regex::escape(&t.title))
            .collect();

        if titles.is_empty() {
            None
        } else {
            Some(titles.join("|"))
        }
    }
}

/// All suites known to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteCatalog {
    suites: Vec<SuiteDef>,
}

impl SuiteCatalog {
    pub fn new(suites: Vec<SuiteDef>) -> Self {
        Self { suites }
    }

    pub fn get(&self, name: &str) -> Option<&SuiteDef> {
        self.suites.iter().find(|s| s.name == name)
    }

    pub fn suites(&self) -> &[SuiteDef] {
        &self.suites
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.suites.iter().map(|s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// The login, registration and profile suites of the client portal
    pub fn builtin() -> Self {
        Self::new(builtin_suites())
    }
}

impl Default for SuiteCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn builtin_suites() -> Vec<SuiteDef> {
    vec![
        SuiteDef {
            name: "login".to_string(),
            dir: None,
            data: Some(DataKind::Emails),
            tests: vec![
                TestDef::new("data-driven-login", "should login successfully with valid credentials"),
                TestDef::new("form-elements", "should display login form elements"),
                TestDef::new("empty-validation", "should show validation for empty fields"),
                TestDef::new("button-redirections", "should verify all button redirections on login page"),
            ],
        },
        SuiteDef {
            name: "register".to_string(),
            dir: None,
            data: Some(DataKind::Countries),
            tests: vec![
                TestDef::new("data-driven-registration", "should register successfully with valid data"),
                TestDef::new("form-elements", "should display registration form elements"),
                TestDef::new("dependent-dropdowns-country", "should enable account type after country selection"),
                TestDef::new(
                    "dependent-dropdowns-account",
                    "should enable dependent dropdowns after Account type selection",
                ),
                TestDef::new("bonus-categories", "should verify specific bonus categories for each account type"),
                TestDef::new("currencies", "should verify specific currencies for each account type"),
                TestDef::new("leverage-values", "should verify specific leverage values for each account type"),
                TestDef::new(
                    "dropdown-population",
                    "should verify all dropdown options are populated after account type selection",
                ),
                TestDef::new("button-redirections", "should verify all button redirections on registration page"),
            ],
        },
        SuiteDef {
            name: "profile".to_string(),
            dir: None,
            data: None,
            tests: vec![TestDef::new(
                "profile-update-success",
                "TC_PROFILE_UPDATE_SUCCESS_001: Complete Profile Update - Success Verification",
            )],
        },
    ]
}
