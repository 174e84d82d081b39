//! Report directory listing and the consolidated run summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use portal_e2e_common::AggregateReport;

use crate::error::RunnerResult;

/// An HTML report as listed to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    /// URL path under which the report is served
    pub path: String,
    pub created: DateTime<Utc>,
}

/// `report_*.html` files, newest first. A missing directory lists nothing.
pub fn list_reports(dir: &Path) -> RunnerResult<Vec<ReportEntry>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reports = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !(name.starts_with("report_") && name.ends_with(".html")) {
            continue;
        }
        let created: DateTime<Utc> = entry.metadata()?.modified()?.into();
        reports.push(ReportEntry {
            path: format!("/reports/{}", name),
            name,
            created,
        });
    }

    reports.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
    Ok(reports)
}

/// Write `summary_<timestamp>_<run id>.json`, never replacing an existing file
pub fn write_summary(dir: &Path, report: &AggregateReport) -> RunnerResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let stamp = report.start_time.format("%Y-%m-%d_%H-%M-%S");
    let base = format!("summary_{}_{}", stamp, report.run_id);
    let body = serde_json::to_vec_pretty(report)?;

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.json", base)
        } else {
            format!("{}-{}.json", base, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&body)?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 100 => {
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
