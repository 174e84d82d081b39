//! Command line and environment for one suite process

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use portal_e2e_common::{Browser, RunnerCommandConfig, SuiteDef};

/// Everything needed to start the external runner for one suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub current_dir: PathBuf,
}

/// Inputs for one suite run
#[derive(Debug, Clone, Copy)]
pub struct SuiteRun<'a> {
    pub suite: &'a SuiteDef,
    pub tests: &'a [String],
    pub emails: &'a [String],
    pub countries: &'a [String],
    pub browser: Browser,
    pub headless: bool,
}

impl SuiteRun<'_> {
    /// Selection values for the suite's data kind, if it has one
    pub fn data(&self) -> &[String] {
        match self.suite.data {
            Some(portal_e2e_common::DataKind::Emails) => self.emails,
            Some(portal_e2e_common::DataKind::Countries) => self.countries,
            None => &[],
        }
    }
}

impl Invocation {
    pub fn build(config: &RunnerCommandConfig, project_dir: &Path, run: &SuiteRun<'_>) -> Self {
        let mut args = config.args.clone();

        let target = config.tests_dir.join(run.suite.directory());
        args.push(target.to_string_lossy().into_owned());

        args.push("--project".to_string());
        args.push(run.browser.as_str().to_string());

        if let Some(pattern) = run.suite.grep_pattern(run.tests) {
            args.push("--grep".to_string());
            args.push(pattern);
        }

        for reporter in &config.reporters {
            args.push(format!("--reporter={}", reporter));
        }

        Self {
            program: config.program.clone(),
            args,
            env: build_env(&config.env, run),
            current_dir: project_dir.to_path_buf(),
        }
    }

    /// The `--grep` filter, if any
    pub fn grep(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "--grep")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Printable form for the "Executing:" announcement
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arguments are passed as a vector; no shell is involved.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(&self.env)
            .current_dir(&self.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

/// Child environment: configured extras plus the per-run selection
pub fn build_env(base: &BTreeMap<String, String>, run: &SuiteRun<'_>) -> BTreeMap<String, String> {
    let mut env = base.clone();
    env.insert("HEADLESS".to_string(), run.headless.to_string());
    env.insert("SELECTED_BROWSER".to_string(), run.browser.as_str().to_string());
    env.insert("TEST_TYPE".to_string(), run.suite.name.clone());

    if let Some(kind) = run.suite.data {
        let values = run.data();
        if !values.is_empty() {
            env.insert(kind.env_var().to_string(), values.join(","));
        }
    }

    env
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_e2e_common::SuiteCatalog;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strict_subset_gets_grep() {
        let catalog = SuiteCatalog::builtin();
        let tests = names(&["form-elements"]);
        let emails = names(&["a@x.com", "b@x.com"]);
        let run = SuiteRun {
            suite: catalog.get("login").unwrap(),
            tests: &tests,
            emails: &emails,
            countries: &[],
            browser: Browser::Firefox,
            headless: false,
        };

        let inv = Invocation::build(&RunnerCommandConfig::default(), Path::new("/srv/portal"), &run);

        assert_eq!(inv.program, "npx");
        assert_eq!(
            inv.args,
            names(&[
                "playwright",
                "test",
                "tests/login",
                "--project",
                "firefox",
                "--grep",
                "should display login form elements",
                "--reporter=line",
                "--reporter=./utils/custom-reporter.js",
            ])
        );
        assert_eq!(inv.grep(), Some("should display login form elements"));
        assert_eq!(inv.current_dir, PathBuf::from("/srv/portal"));
        assert_eq!(inv.env["HEADLESS"], "false");
        assert_eq!(inv.env["SELECTED_BROWSER"], "firefox");
        assert_eq!(inv.env["TEST_TYPE"], "login");
        assert_eq!(inv.env["TEST_EMAIL"], "a@x.com,b@x.com");
        assert_eq!(inv.env["FORCE_COLOR"], "0");
        assert!(!inv.env.contains_key("TEST_COUNTRY"));
    }

    #[test]
    fn test_whole_suite_has_no_grep() {
        let catalog = SuiteCatalog::builtin();
        let profile = catalog.get("profile").unwrap();
        let tests = names(&["profile-update-success"]);
        let run = SuiteRun {
            suite: profile,
            tests: &tests,
            emails: &[],
            countries: &[],
            browser: Browser::Chromium,
            headless: true,
        };

        let inv = Invocation::build(&RunnerCommandConfig::default(), Path::new("."), &run);
        assert_eq!(inv.grep(), None);
        assert!(!inv.args.contains(&"--grep".to_string()));
        assert_eq!(inv.env["HEADLESS"], "true");
        assert!(!inv.env.contains_key("TEST_EMAIL"));
        assert!(!inv.env.contains_key("TEST_COUNTRY"));
    }

    #[test]
    fn test_countries_env() {
        let catalog = SuiteCatalog::builtin();
        let tests = names(&["currencies"]);
        let countries = names(&["Cyprus", "Greece"]);
        let run = SuiteRun {
            suite: catalog.get("register").unwrap(),
            tests: &tests,
            emails: &names(&["ignored@x.com"]),
            countries: &countries,
            browser: Browser::Edge,
            headless: true,
        };

        let env = build_env(&BTreeMap::new(), &run);
        assert_eq!(env["TEST_COUNTRY"], "Cyprus,Greece");
        assert_eq!(env["SELECTED_BROWSER"], "edge");
        assert!(!env.contains_key("TEST_EMAIL"));
    }

    #[test]
    fn test_command_line_quotes_grep() {
        let inv = Invocation {
            program: "npx".to_string(),
            args: names(&["playwright", "test", "--grep", "a (b)|c's"]),
            env: BTreeMap::new(),
            current_dir: PathBuf::from("."),
        };
        assert_eq!(inv.command_line(), r"npx playwright test --grep 'a (b)|c'\''s'");
    }
}
