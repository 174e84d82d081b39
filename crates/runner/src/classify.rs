//! Severity classification of runner output lines

use portal_e2e_common::{ClassifierConfig, OutputStream, Severity, StreamMatch};

#[derive(Debug, Clone)]
struct CompiledRule {
    markers: Vec<String>,
    severity: Severity,
    stream: StreamMatch,
}

impl CompiledRule {
    fn applies_to(&self, stream: OutputStream) -> bool {
        match self.stream {
            StreamMatch::Any => true,
            StreamMatch::Stdout => stream == OutputStream::Stdout,
            StreamMatch::Stderr => stream == OutputStream::Stderr,
        }
    }
}

/// First matching rule wins; unmatched lines take the stream default.
///
/// Markers are matched as case-insensitive substrings.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    rules: Vec<CompiledRule>,
    stdout_default: Severity,
    stderr_default: Severity,
}

impl LineClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|rule| CompiledRule {
                markers: rule.markers.iter().map(|m| m.to_lowercase()).collect(),
                severity: rule.severity,
                stream: rule.stream,
            })
            .collect();

        Self {
            rules,
            stdout_default: config.stdout_default,
            stderr_default: config.stderr_default,
        }
    }

    pub fn classify(&self, stream: OutputStream, line: &str) -> Severity {
        let lowered = line.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(stream))
            .find(|rule| rule.markers.iter().any(|m| lowered.contains(m.as_str())))
            .map(|rule| rule.severity)
            .unwrap_or(match stream {
                OutputStream::Stdout => self.stdout_default,
                OutputStream::Stderr => self.stderr_default,
            })
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}
