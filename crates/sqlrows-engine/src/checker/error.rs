//! Errors reported while checking a package.
//!
//! Checking never stops at the first error: each error is recorded, the
//! offending expression gets the invalid type, and checking continues.

use crate::parser::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    #[error("undefined: {name}")]
    Undefined { name: String, span: Span },

    #[error("{name} redeclared in this block")]
    Redeclared { name: String, span: Span },

    #[error("{name} is not a type")]
    NotAType { name: String, span: Span },

    #[error("{name} (type) is not an expression")]
    TypeAsValue { name: String, span: Span },

    #[error("use of package {name} without selector")]
    PackageAsValue { name: String, span: Span },

    #[error("cannot use _ as value")]
    BlankAsValue { span: Span },

    #[error("name {name} not exported by package {package}")]
    NotExported {
        name: String,
        package: String,
        span: Span,
    },

    #[error("{base}.{name} undefined (type {ty} has no field or method {name})")]
    MissingFieldOrMethod {
        base: String,
        name: String,
        ty: String,
        span: Span,
    },

    #[error("invalid operation: cannot call non-function {expr} (type {ty})")]
    NotCallable { expr: String, ty: String, span: Span },

    #[error("{problem} arguments in call to {callee}: have {have}, want {want}")]
    ArgumentCount {
        problem: &'static str,
        callee: String,
        have: usize,
        want: usize,
        span: Span,
    },

    #[error("cannot use value of type {actual} as {expected} value in {context}")]
    TypeMismatch {
        expected: String,
        actual: String,
        context: &'static str,
        span: Span,
    },

    #[error("assignment mismatch: {lhs} variable(s) but {rhs} value(s)")]
    AssignmentMismatch { lhs: usize, rhs: usize, span: Span },

    #[error("multiple-value {expr} in single-value context")]
    MultiValue { expr: String, span: Span },

    #[error("{expr} (no value) used as value")]
    NoValue { expr: String, span: Span },

    #[error("no new variables on left side of :=")]
    NoNewVariables { span: Span },

    #[error("cannot assign to {expr}")]
    NotAssignable { expr: String, span: Span },

    #[error("invalid operation: operator {op} not defined on {ty}")]
    InvalidOperation { op: &'static str, ty: String, span: Span },

    #[error("invalid operation: mismatched types {lhs} and {rhs}")]
    MismatchedOperands { lhs: String, rhs: String, span: Span },

    #[error("non-boolean condition in {context}")]
    NonBoolCondition { context: &'static str, span: Span },

    #[error("{expr} is not used")]
    UnusedExpression { expr: String, span: Span },

    #[error("{keyword} is not in a loop")]
    OutsideLoop { keyword: &'static str, span: Span },

    #[error("too {problem} return values: have {have}, want {want}")]
    ReturnCount {
        problem: &'static str,
        have: usize,
        want: usize,
        span: Span,
    },

    #[error("invalid receiver type {name}")]
    InvalidReceiver { name: String, span: Span },

    #[error("could not import {path} (package not found)")]
    UnknownImport { path: String, span: Span },

    #[error("invalid recursive type {name}")]
    RecursiveType { name: String, span: Span },

    #[error("use of untyped nil in {context}")]
    UntypedNil { context: &'static str, span: Span },

    #[error("{name} (built-in function) must be called")]
    BuiltinValue { name: String, span: Span },
}

impl CheckError {
    pub fn span(&self) -> Span {
        match self {
            CheckError::Undefined { span, .. }
            | CheckError::Redeclared { span, .. }
            | CheckError::NotAType { span, .. }
            | CheckError::TypeAsValue { span, .. }
            | CheckError::PackageAsValue { span, .. }
            | CheckError::BlankAsValue { span }
            | CheckError::NotExported { span, .. }
            | CheckError::MissingFieldOrMethod { span, .. }
            | CheckError::NotCallable { span, .. }
            | CheckError::ArgumentCount { span, .. }
            | CheckError::TypeMismatch { span, .. }
            | CheckError::AssignmentMismatch { span, .. }
            | CheckError::MultiValue { span, .. }
            | CheckError::NoValue { span, .. }
            | CheckError::NoNewVariables { span }
            | CheckError::NotAssignable { span, .. }
            | CheckError::InvalidOperation { span, .. }
            | CheckError::MismatchedOperands { span, .. }
            | CheckError::NonBoolCondition { span, .. }
            | CheckError::UnusedExpression { span, .. }
            | CheckError::OutsideLoop { span, .. }
            | CheckError::ReturnCount { span, .. }
            | CheckError::InvalidReceiver { span, .. }
            | CheckError::UnknownImport { span, .. }
            | CheckError::RecursiveType { span, .. }
            | CheckError::UntypedNil { span, .. }
            | CheckError::BuiltinValue { span, .. } => *span,
        }
    }

    /// Diagnostic code (E1xxx range).
    pub fn code(&self) -> &'static str {
        match self {
            CheckError::Undefined { .. } => "E1001",
            CheckError::Redeclared { .. } => "E1002",
            CheckError::NotAType { .. } => "E1003",
            CheckError::TypeAsValue { .. }
            | CheckError::PackageAsValue { .. }
            | CheckError::BlankAsValue { .. } => "E1004",
            CheckError::NotExported { .. } => "E1005",
            CheckError::MissingFieldOrMethod { .. } => "E1006",
            CheckError::NotCallable { .. } => "E1007",
            CheckError::ArgumentCount { .. } => "E1008",
            CheckError::TypeMismatch { .. } => "E1009",
            CheckError::AssignmentMismatch { .. } => "E1010",
            CheckError::MultiValue { .. } | CheckError::NoValue { .. } => "E1011",
            CheckError::NoNewVariables { .. } => "E1012",
            CheckError::NotAssignable { .. } => "E1013",
            CheckError::InvalidOperation { .. } | CheckError::MismatchedOperands { .. } => "E1014",
            CheckError::NonBoolCondition { .. } => "E1015",
            CheckError::UnusedExpression { .. } => "E1016",
            CheckError::OutsideLoop { .. } => "E1017",
            CheckError::ReturnCount { .. } => "E1018",
            CheckError::InvalidReceiver { .. } => "E1019",
            CheckError::UnknownImport { .. } => "E1020",
            CheckError::RecursiveType { .. } => "E1021",
            CheckError::UntypedNil { .. } => "E1022",
            CheckError::BuiltinValue { .. } => "E1023",
        }
    }
}
