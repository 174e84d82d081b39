//! CLI Commands

pub mod data;
pub mod reports;
pub mod run;
pub mod serve;
pub mod suites;
