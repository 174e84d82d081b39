//! Report listing command

use anyhow::Result;

use crate::output::{print_list, OutputFormat, TableDisplay};
use portal_e2e_common::DashboardConfig;
use portal_e2e_runner::{list_reports, ReportEntry};

impl TableDisplay for ReportEntry {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Path", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.path.clone(),
            self.created.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

pub fn execute(config: &DashboardConfig, format: OutputFormat) -> Result<()> {
    let reports = list_reports(&config.reports_path())?;
    print_list(&reports, format);
    Ok(())
}
