//! Rendering of frontend errors and analyzer findings.
//!
//! Everything the tool reports goes through [`Diagnostic`], a thin wrapper
//! over a codespan diagnostic keyed by the program's file ids, so parse
//! errors, checker errors and findings all share one pretty printer and one
//! JSON shape.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::WriteColor;
use serde::{Deserialize, Serialize};

use crate::analysis;
use crate::checker::CheckError;
use crate::loader::LoadError;
use crate::parser::{ParseError, Span};

/// A diagnostic with source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    /// Rule name for analyzer findings
    rule: Option<&'static str>,
    primary: Option<Span>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            inner: CsDiagnostic::new(severity).with_message(message),
            rule: None,
            primary: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.inner = self.inner.with_code(code);
        self
    }

    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Main location. Only the first primary label is reported in JSON.
    pub fn with_primary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(span.file.index(), span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self.primary.get_or_insert(span);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    pub fn from_parse_error(error: &ParseError) -> Self {
        Diagnostic::error(error.message.clone())
            .with_code(error.code())
            .with_primary_label(error.span, "")
    }

    pub fn from_check_error(error: &CheckError) -> Self {
        Diagnostic::error(error.to_string())
            .with_code(error.code())
            .with_primary_label(error.span(), "")
    }

    /// Loader failures have no source location.
    pub fn from_load_error(error: &LoadError) -> Self {
        Diagnostic::error(error.to_string()).with_code(error.code())
    }

    pub fn from_finding(finding: &analysis::Diagnostic) -> Self {
        let severity = match finding.severity {
            analysis::Severity::Error => Severity::Error,
            analysis::Severity::Warn => Severity::Warning,
            analysis::Severity::Off => Severity::Note,
        };
        let mut diag = Diagnostic::new(severity, finding.message.clone())
            .with_code(finding.code)
            .with_rule(finding.rule)
            .with_primary_label(finding.span, "");
        if let Some(rule) = analysis::find_rule(finding.rule) {
            diag = diag.with_note(format!("{}: {}", rule.name, rule.description));
        }
        diag
    }

    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    pub fn severity(&self) -> Severity {
        self.inner.severity
    }

    pub fn code(&self) -> Option<&str> {
        self.inner.code.as_deref()
    }

    /// Render with source snippets.
    pub fn emit(
        &self,
        writer: &mut dyn WriteColor,
        config: &term::Config,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        term::emit(writer, config, files, &self.inner)
    }

    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> JsonDiagnostic {
        JsonDiagnostic::from_diagnostic(self, files)
    }
}

/// Flat, line-oriented JSON form of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub file: Option<String>,
    /// 1-based
    pub line: Option<u32>,
    /// 1-based, in bytes
    pub column: Option<u32>,
    pub rule: Option<String>,
    pub code: Option<String>,
    pub severity: String,
    pub message: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Bug => "bug",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        };
        let file = diag
            .primary
            .and_then(|span| files.get(span.file.index()).ok())
            .map(|f| f.name().clone());
        JsonDiagnostic {
            file,
            line: diag.primary.map(|s| s.line),
            column: diag.primary.map(|s| s.column),
            rule: diag.rule.map(str::to_string),
            code: diag.inner.code.clone(),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rule::MUST_CLOSE;
    use crate::analysis::Reporter;
    use crate::parser::FileId;
    use codespan_reporting::term::termcolor::NoColor;

    fn files() -> SimpleFiles<String, String> {
        let mut files = SimpleFiles::new();
        files.add("a/a.go".to_string(), "package a\n\nfunc f() { x }\n".to_string());
        files
    }

    fn span(start: usize, end: usize, line: u32, column: u32) -> Span {
        Span::new(FileId(0), start, end, line, column)
    }

    #[test]
    fn test_check_error_carries_code_and_label() {
        let error = CheckError::Undefined {
            name: "x".to_string(),
            span: span(22, 23, 3, 12),
        };
        let diag = Diagnostic::from_check_error(&error);
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), Some("E1001"));
        assert_eq!(diag.inner().labels.len(), 1);
        assert_eq!(diag.inner().labels[0].range, 22..23);
    }

    #[test]
    fn test_finding_json() {
        let mut reporter = Reporter::new();
        reporter.report(&MUST_CLOSE, span(11, 15, 3, 1), "rows.Close must be called");
        let finding = reporter.finish().remove(0);
        let json = Diagnostic::from_finding(&finding).to_json(&files());
        assert_eq!(
            json,
            JsonDiagnostic {
                file: Some("a/a.go".to_string()),
                line: Some(3),
                column: Some(1),
                rule: Some("must-close".to_string()),
                code: Some("S1001".to_string()),
                severity: "warning".to_string(),
                message: "rows.Close must be called".to_string(),
            }
        );
        let text = serde_json::to_string(&json).unwrap();
        assert!(text.contains("\"rule\":\"must-close\""));
    }

    #[test]
    fn test_load_error_has_no_location() {
        let error = LoadError::ImportCycle(vec!["a".into(), "b".into(), "a".into()]);
        let json = Diagnostic::from_load_error(&error).to_json(&files());
        assert_eq!(json.file, None);
        assert_eq!(json.code.as_deref(), Some("E2003"));
    }

    #[test]
    fn test_emit_renders_source_line() {
        let error = CheckError::Undefined {
            name: "x".to_string(),
            span: span(22, 23, 3, 12),
        };
        let mut out = NoColor::new(Vec::new());
        Diagnostic::from_check_error(&error)
            .emit(&mut out, &term::Config::default(), &files())
            .unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("error[E1001]: undefined: x"));
        assert!(text.contains("a/a.go:3:12"));
    }
}
