//! Rule metadata, diagnostics and the reporter that collects them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::parser::Span;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule is disabled.
    Off,
    Warn,
    Error,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" | "allow" => Ok(Severity::Off),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" | "deny" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{}' (expected off, warn or error)", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Off => "off",
            Severity::Warn => "warning",
            Severity::Error => "error",
        })
    }
}

/// Static metadata for a rule.
#[derive(Debug)]
pub struct RuleMeta {
    /// Rule name, e.g. "must-close".
    pub name: &'static str,
    /// Rule code, e.g. "S1001".
    pub code: &'static str,
    pub description: &'static str,
    /// Severity when no config override is set.
    pub default_severity: Severity,
}

pub static MUST_CLOSE: RuleMeta = RuleMeta {
    name: "must-close",
    code: "S1001",
    description: "A *sql.Rows value must be closed on every path after it is produced",
    default_severity: Severity::Warn,
};

pub static ORDERING: RuleMeta = RuleMeta {
    name: "ordering",
    code: "S1002",
    description: "Do not defer rows.Close() before checking the error of the query",
    default_severity: Severity::Warn,
};

pub static MUST_CHECK_ERR: RuleMeta = RuleMeta {
    name: "must-check-err",
    code: "S1003",
    description: "rows.Err() must be called after iterating a *sql.Rows value",
    default_severity: Severity::Warn,
};

/// Every rule, in code order.
pub fn all_rules() -> [&'static RuleMeta; 3] {
    [&MUST_CLOSE, &ORDERING, &MUST_CHECK_ERR]
}

pub fn find_rule(name: &str) -> Option<&'static RuleMeta> {
    all_rules().into_iter().find(|r| r.name == name)
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Rule name (e.g. "must-close").
    pub rule: &'static str,
    /// Rule code (e.g. "S1001").
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

/// Collects diagnostics for one package pass.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, rule: &'static RuleMeta, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            rule: rule.name,
            code: rule.code,
            message: message.into(),
            span,
            severity: rule.default_severity,
        });
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics in source order (file, offset, rule), duplicates removed.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by(|a, b| {
            (a.span.file, a.span.start, a.rule, &a.message).cmp(&(b.span.file, b.span.start, b.rule, &b.message))
        });
        self.diagnostics.dedup_by(|a, b| a.span == b.span && a.rule == b.rule && a.message == b.message);
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FileId;

    fn at(file: u32, start: usize) -> Span {
        Span::new(FileId(file), start, start + 4, 1, start as u32 + 1)
    }

    #[test]
    fn test_reporter_sorts_by_position_then_rule() {
        let mut reporter = Reporter::new();
        reporter.report(&ORDERING, at(1, 0), "using rows before checking for errors");
        reporter.report(&MUST_CLOSE, at(0, 40), "rows.Close must be called");
        reporter.report(&ORDERING, at(0, 10), "using rows before checking for errors");
        reporter.report(&MUST_CLOSE, at(0, 10), "rows.Close must be called");
        let rules: Vec<(u32, usize, &str)> = reporter
            .finish()
            .iter()
            .map(|d| (d.span.file.0, d.span.start, d.rule))
            .collect();
        assert_eq!(
            rules,
            vec![
                (0, 10, "must-close"),
                (0, 10, "ordering"),
                (0, 40, "must-close"),
                (1, 0, "ordering"),
            ]
        );
    }

    #[test]
    fn test_reporter_drops_exact_duplicates() {
        let mut reporter = Reporter::new();
        reporter.report(&ORDERING, at(0, 3), "using rows before checking for errors");
        reporter.report(&ORDERING, at(0, 3), "using rows before checking for errors");
        assert_eq!(reporter.len(), 2);
        assert_eq!(reporter.finish().len(), 1);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("off".parse::<Severity>(), Ok(Severity::Off));
        assert!("loud".parse::<Severity>().is_err());
        assert_eq!(find_rule("ordering").map(|r| r.code), Some("S1002"));
        assert!(find_rule("no-such-rule").is_none());
    }
}
