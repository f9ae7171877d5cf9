//! Analyzer configuration: the tracked resource, close-check options and
//! per-rule severity overrides.

use rustc_hash::FxHashMap;

use super::rule::Severity;

/// The closeable cursor type and the methods that discharge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Import path of the declaring package
    pub package: String,
    /// Name of the named type; values are tracked as pointers to it
    pub type_name: String,
    /// Methods whose call counts as closing
    pub close: Vec<String>,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            package: "database/sql".to_string(),
            type_name: "Rows".to_string(),
            close: vec!["Close".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseCheckOptions {
    /// Only deferred calls discharge the close obligation.
    pub require_defer: bool,
    /// Also require `Err` to be called on every path.
    pub check_err: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub resource: ResourceSpec,
    pub close_check: CloseCheckOptions,
    /// Per-rule severity overrides, keyed by rule name.
    overrides: FxHashMap<String, Severity>,
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource: ResourceSpec) -> Self {
        self.resource = resource;
        self
    }

    pub fn require_defer(mut self, on: bool) -> Self {
        self.close_check.require_defer = on;
        self
    }

    pub fn check_err(mut self, on: bool) -> Self {
        self.close_check.check_err = on;
        self
    }

    pub fn set_severity(&mut self, rule_name: &str, severity: Severity) {
        self.overrides.insert(rule_name.to_string(), severity);
    }

    /// Severity for a rule, falling back to its default.
    pub fn effective_severity(&self, rule_name: &str, default: Severity) -> Severity {
        self.overrides.get(rule_name).copied().unwrap_or(default)
    }

    pub fn is_disabled(&self, rule_name: &str) -> bool {
        self.overrides.get(rule_name) == Some(&Severity::Off)
    }
}
