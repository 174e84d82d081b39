//! Dashboard server command

use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use portal_e2e_common::DashboardConfig;

#[derive(Args)]
pub struct ServeArgs {
    /// Web server bind address
    #[arg(long)]
    pub addr: Option<SocketAddr>,

    /// Directory holding the dashboard page and assets
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Directory the reporter writes artifacts into
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,
}

impl ServeArgs {
    fn apply(self, config: &mut DashboardConfig) {
        if let Some(addr) = self.addr {
            config.listen = addr;
        }
        if let Some(dir) = self.public_dir {
            config.public_dir = dir;
        }
        if let Some(dir) = self.reports_dir {
            config.reports_dir = dir;
        }
    }
}

pub async fn execute(args: ServeArgs, mut config: DashboardConfig) -> anyhow::Result<()> {
    args.apply(&mut config);
    info!(
        project_dir = %config.project_dir.display(),
        suites = config.suites.len(),
        "Starting dashboard"
    );
    portal_e2e_web::serve(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = DashboardConfig::default();
        let args = ServeArgs {
            addr: Some("0.0.0.0:8080".parse().unwrap()),
            public_dir: None,
            reports_dir: Some(PathBuf::from("out")),
        };
        args.apply(&mut config);

        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.reports_dir, PathBuf::from("out"));
    }
}
