//! Test data command

use anyhow::{Context, Result};
use serde::Serialize;

use crate::output::{print_list, OutputFormat, TableDisplay};
use portal_e2e_common::{DashboardConfig, DataKind, TestData};

#[derive(Serialize)]
pub struct DataItem {
    pub kind: DataKind,
    pub value: String,
}

impl TableDisplay for DataItem {
    fn headers() -> Vec<&'static str> {
        vec!["Kind", "Value"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.kind.to_string(), self.value.clone()]
    }
}

fn items(data: TestData) -> Vec<DataItem> {
    let emails = data.emails.into_iter().map(|value| DataItem {
        kind: DataKind::Emails,
        value,
    });
    let countries = data.countries.into_iter().map(|value| DataItem {
        kind: DataKind::Countries,
        value,
    });
    emails.chain(countries).collect()
}

pub fn execute(config: &DashboardConfig, format: OutputFormat) -> Result<()> {
    let source = config.test_data_source();
    let data = source
        .load()
        .with_context(|| format!("reading test data from {}", source.data.display()))?;
    print_list(&items(data), format);
    Ok(())
}
