//! Dashboard configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `PORTAL_E2E_*` environment variables. Command-line flags are applied by
//! the binaries on top.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::catalog::{builtin_suites, SuiteCatalog, SuiteDef};
use crate::error::{Error, Result};
use crate::fixtures::TestDataSource;
use crate::types::Severity;

pub const ENV_CONFIG: &str = "PORTAL_E2E_CONFIG";
pub const ENV_ADDR: &str = "PORTAL_E2E_ADDR";
pub const ENV_PROJECT_DIR: &str = "PORTAL_E2E_PROJECT_DIR";
pub const ENV_REPORTS_DIR: &str = "PORTAL_E2E_REPORTS_DIR";
pub const ENV_PUBLIC_DIR: &str = "PORTAL_E2E_PUBLIC_DIR";
pub const ENV_TEST_DATA: &str = "PORTAL_E2E_TEST_DATA";
pub const ENV_EMAILS_FILE: &str = "PORTAL_E2E_EMAILS_FILE";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// HTTP listen address
    pub listen: SocketAddr,

    /// Working directory of the external runner; relative paths resolve here
    pub project_dir: PathBuf,

    /// Static dashboard assets
    pub public_dir: PathBuf,

    /// Where the reporter writes HTML/JSON artifacts
    pub reports_dir: PathBuf,

    /// JSON fixture with `emails` and `countries`
    pub test_data: PathBuf,

    /// JSON array of emails; replaces the fixture's `emails` when set
    pub emails_file: Option<PathBuf>,

    pub runner: RunnerCommandConfig,

    pub classifier: ClassifierConfig,

    pub suites: Vec<SuiteDef>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            project_dir: PathBuf::from("."),
            public_dir: PathBuf::from("public"),
            reports_dir: PathBuf::from("reports"),
            test_data: PathBuf::from("data/testData.json"),
            emails_file: None,
            runner: RunnerCommandConfig::default(),
            classifier: ClassifierConfig::default(),
            suites: builtin_suites(),
        }
    }
}

impl DashboardConfig {
    /// Load from an optional TOML file and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `PORTAL_E2E_*` overrides using `lookup` to read variables
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_ADDR) {
            self.listen = addr
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("{}={}: {}", ENV_ADDR, addr, e)))?;
        }
        if let Some(dir) = lookup(ENV_PROJECT_DIR) {
            self.project_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_REPORTS_DIR) {
            self.reports_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_PUBLIC_DIR) {
            self.public_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_TEST_DATA) {
            self.test_data = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_EMAILS_FILE) {
            self.emails_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.suites.is_empty() {
            return Err(Error::InvalidConfig("no suites configured".to_string()));
        }

        let mut seen = HashSet::new();
        for suite in &self.suites {
            if !seen.insert(suite.name.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate suite: {}", suite.name)));
            }
            if suite.tests.is_empty() {
                return Err(Error::InvalidConfig(format!("suite '{}' has no tests", suite.name)));
            }
        }

        if self.runner.program.trim().is_empty() {
            return Err(Error::InvalidConfig("runner.program is empty".to_string()));
        }

        Ok(())
    }

    /// Resolve a configured path against the project directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn reports_path(&self) -> PathBuf {
        self.resolve(&self.reports_dir)
    }

    pub fn public_path(&self) -> PathBuf {
        self.resolve(&self.public_dir)
    }

    pub fn test_data_path(&self) -> PathBuf {
        self.resolve(&self.test_data)
    }

    pub fn test_data_source(&self) -> TestDataSource {
        let source = TestDataSource::new(self.test_data_path());
        match &self.emails_file {
            Some(path) => source.with_emails(self.resolve(path)),
            None => source,
        }
    }

    pub fn catalog(&self) -> SuiteCatalog {
        SuiteCatalog::new(self.suites.clone())
    }
}

/// How the external test-execution capability is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerCommandConfig {
    /// Executable to start
    pub program: String,

    /// Arguments placed before the suite target
    pub args: Vec<String>,

    /// Root of the suite directories, relative to the project directory
    pub tests_dir: PathBuf,

    /// Each becomes a `--reporter=<value>` argument
    pub reporters: Vec<String>,

    /// Extra environment for every run
    pub env: BTreeMap<String, String>,

    /// How long to wait for output readers after the process exits
    pub stream_flush_timeout_secs: u64,
}

impl Default for RunnerCommandConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("FORCE_COLOR".to_string(), "0".to_string());
        env.insert("NODE_ENV".to_string(), "test".to_string());

        Self {
            program: "npx".to_string(),
            args: vec!["playwright".to_string(), "test".to_string()],
            tests_dir: PathBuf::from("tests"),
            reporters: vec!["line".to_string(), "./utils/custom-reporter.js".to_string()],
            env,
            stream_flush_timeout_secs: 5,
        }
    }
}

impl RunnerCommandConfig {
    pub fn stream_flush_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_flush_timeout_secs)
    }
}

/// Which child stream a rule applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMatch {
    #[default]
    Any,
    Stdout,
    Stderr,
}

/// One (markers, severity) rule; matching is case-insensitive substring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRule {
    pub markers: Vec<String>,
    pub severity: Severity,
    #[serde(default)]
    pub stream: StreamMatch,
}

impl ClassifyRule {
    pub fn new(markers: &[&str], severity: Severity) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            severity,
            stream: StreamMatch::Any,
        }
    }

    /// Restrict the rule to one child stream
    pub fn on_stream(mut self, stream: StreamMatch) -> Self {
        self.stream = stream;
        self
    }
}

/// Ordered line classification rules, evaluated top-down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub rules: Vec<ClassifyRule>,
    pub stdout_default: Severity,
    pub stderr_default: Severity,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                // stderr never reports success
                ClassifyRule::new(&["✓", "✅", "passed"], Severity::Success).on_stream(StreamMatch::Stdout),
                ClassifyRule::new(&["✗", "❌", "error", "fail"], Severity::Error),
                ClassifyRule::new(&["⚠", "warning"], Severity::Warning),
            ],
            stdout_default: Severity::Info,
            stderr_default: Severity::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataKind;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.listen.port(), 3000);
        assert_eq!(config.runner.program, "npx");
        assert_eq!(config.runner.stream_flush_timeout(), Duration::from_secs(5));
        assert_eq!(config.classifier.stderr_default, Severity::Warning);
        assert_eq!(config.classifier.rules[0].severity, Severity::Success);
        assert_eq!(config.classifier.rules[0].stream, StreamMatch::Stdout);
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog().names().count(), 3);
    }

    #[test]
    fn test_from_toml_partial() {
        let text = r#"
listen = "0.0.0.0:8080"
reports_dir = "/var/reports"

[runner]
program = "node"
args = ["runner.js"]
reporters = []

[classifier]
stderr_default = "info"

[[suites]]
name = "checkout"
dir = "shop/checkout"
data = "emails"
tests = [{ name = "pay", title = "should pay with card" }]
"#;
        let config = DashboardConfig::from_toml(text).unwrap();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.runner.program, "node");
        assert_eq!(config.runner.tests_dir, PathBuf::from("tests"));
        assert!(config.runner.reporters.is_empty());
        assert_eq!(config.classifier.stderr_default, Severity::Info);
        assert_eq!(config.classifier.rules.len(), 3);
        assert_eq!(config.suites.len(), 1);
        assert_eq!(config.suites[0].data, Some(DataKind::Emails));
        assert_eq!(config.suites[0].directory(), "shop/checkout");
        assert_eq!(config.reports_path(), PathBuf::from("/var/reports"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ADDR, "127.0.0.1:4000"),
            (ENV_PROJECT_DIR, "/srv/portal"),
            (ENV_TEST_DATA, "fixtures/data.json"),
            (ENV_EMAILS_FILE, "fixtures/emails.json"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.listen.port(), 4000);
        assert_eq!(config.reports_path(), PathBuf::from("/srv/portal/reports"));
        assert_eq!(config.test_data_path(), PathBuf::from("/srv/portal/fixtures/data.json"));
        assert_eq!(
            config.test_data_source().emails,
            Some(PathBuf::from("/srv/portal/fixtures/emails.json"))
        );
    }

    #[test]
    fn test_bad_addr_override() {
        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|key| (key == ENV_ADDR).then(|| "nope".to_string()));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = DashboardConfig::default();
        config.suites.push(config.suites[0].clone());
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal-e2e.toml");
        std::fs::write(&path, "public_dir = \"dashboard\"\n").unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.public_dir, PathBuf::from("dashboard"));
        assert_eq!(config.suites.len(), 3);
    }
}
