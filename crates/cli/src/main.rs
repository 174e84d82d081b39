//! Portal E2E CLI - Main Entry Point
//!
//! Runs the dashboard server, drives suites from the terminal and inspects
//! the catalog, reports and test data.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{data, reports, run, serve, suites};
use portal_e2e_common::DashboardConfig;

/// Portal E2E - test dashboard and orchestration relay
#[derive(Parser)]
#[command(name = "portal-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "PORTAL_E2E_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Working directory of the external test runner
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard server
    Serve(serve::ServeArgs),

    /// Run one suite from the terminal
    Run(run::RunArgs),

    /// Show the suite catalog
    Suites(suites::SuitesArgs),

    /// List generated HTML reports
    Reports,

    /// Show the configured emails and countries
    Data,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = DashboardConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("loading config from {}", path.display()),
        None => "loading default config".to_string(),
    })?;
    if let Some(dir) = cli.project_dir {
        config.project_dir = dir;
    }

    match cli.command {
        Commands::Serve(args) => serve::execute(args, config).await?,
        Commands::Run(args) => {
            let success = run::execute(args, &config, cli.format).await?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::Suites(args) => suites::execute(args, &config, cli.format)?,
        Commands::Reports => reports::execute(&config, cli.format)?,
        Commands::Data => data::execute(&config, cli.format)?,
    }

    Ok(())
}
