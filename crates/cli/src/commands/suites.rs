//! Suite catalog command

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::output::{print_list, OutputFormat, TableDisplay};
use portal_e2e_common::{DashboardConfig, DataKind, SuiteDef, TestDef};

#[derive(Args)]
pub struct SuitesArgs {
    /// List the tests of one suite instead of the catalog
    pub suite: Option<String>,
}

/// Catalog row
#[derive(Serialize)]
pub struct SuiteDisplay {
    pub name: String,
    pub directory: String,
    pub data: Option<DataKind>,
    pub tests: usize,
}

impl From<&SuiteDef> for SuiteDisplay {
    fn from(suite: &SuiteDef) -> Self {
        Self {
            name: suite.name.clone(),
            directory: suite.directory().to_string(),
            data: suite.data,
            tests: suite.tests.len(),
        }
    }
}

impl TableDisplay for SuiteDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Directory", "Data", "Tests"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.directory.clone(),
            self.data.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            self.tests.to_string(),
        ]
    }
}

impl TableDisplay for TestDef {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Title"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.title.clone()]
    }
}

pub fn execute(args: SuitesArgs, config: &DashboardConfig, format: OutputFormat) -> Result<()> {
    let catalog = config.catalog();

    match args.suite {
        Some(name) => {
            let Some(suite) = catalog.get(&name) else {
                let known: Vec<&str> = catalog.names().collect();
                bail!("unknown suite '{}' (known: {})", name, known.join(", "));
            };
            print_list(&suite.tests, format);
        }
        None => {
            let rows: Vec<SuiteDisplay> = catalog.suites().iter().map(SuiteDisplay::from).collect();
            print_list(&rows, format);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_e2e_common::SuiteCatalog;

    #[test]
    fn test_catalog_rows() {
        let catalog = SuiteCatalog::builtin();
        let rows: Vec<Vec<String>> = catalog
            .suites()
            .iter()
            .map(|s| SuiteDisplay::from(s).row())
            .collect();

        assert_eq!(rows[0], vec!["login", "login", "emails", "4"]);
        assert_eq!(rows[2][2], "-");
    }
}
