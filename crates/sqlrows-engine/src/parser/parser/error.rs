//! Parse error types

use std::fmt;

use crate::parser::lexer::LexError;
use crate::parser::token::{Span, Token};

/// A parse error with its location and a rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken { expected: String, found: Token },
    UnexpectedEof { expected: String },
    /// Valid Go that lies outside the accepted subset
    Unsupported { construct: &'static str },
    InvalidSyntax { reason: String },
    NestingTooDeep,
    Lex(LexError),
}

impl ParseError {
    pub fn unexpected_token(expected: &str, found: Token, span: Span) -> Self {
        Self {
            message: format!("expected {}, found {}", expected, found),
            kind: ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found,
            },
            span,
        }
    }

    pub fn unexpected_eof(expected: &str, span: Span) -> Self {
        Self {
            message: format!("unexpected end of file, expected {}", expected),
            kind: ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            span,
        }
    }

    pub fn unsupported(construct: &'static str, span: Span) -> Self {
        Self {
            message: format!("'{}' is not supported by this analyzer", construct),
            kind: ParseErrorKind::Unsupported { construct },
            span,
        }
    }

    pub fn invalid(reason: impl Into<String>, span: Span) -> Self {
        let reason = reason.into();
        Self {
            message: reason.clone(),
            kind: ParseErrorKind::InvalidSyntax { reason },
            span,
        }
    }

    pub fn nesting_too_deep(span: Span) -> Self {
        Self {
            message: "nesting too deep".to_string(),
            kind: ParseErrorKind::NestingTooDeep,
            span,
        }
    }

    /// Diagnostic code for the error.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::Lex(_) => "E0001",
            ParseErrorKind::UnexpectedToken { .. } | ParseErrorKind::UnexpectedEof { .. } => {
                "E0002"
            }
            ParseErrorKind::Unsupported { .. } => "E0003",
            ParseErrorKind::InvalidSyntax { .. } => "E0004",
            ParseErrorKind::NestingTooDeep => "E0005",
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            message: err.to_string(),
            span: err.span(),
            kind: ParseErrorKind::Lex(err),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.span.line, self.span.column, self.message)
    }
}

impl std::error::Error for ParseError {}
