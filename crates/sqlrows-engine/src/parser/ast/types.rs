//! Type expressions

use super::{FuncSig, Ident};
use crate::parser::token::Span;

#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `T`
    Name(Ident),
    /// `pkg.T`
    Qualified { pkg: Ident, name: Ident, span: Span },
    /// `*T`
    Pointer(Box<TypeExpr>, Span),
    /// `[]T`
    Slice(Box<TypeExpr>, Span),
    Struct(Vec<FieldDecl>, Span),
    Interface(Vec<InterfaceMethod>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name(id) => id.span,
            TypeExpr::Qualified { span, .. }
            | TypeExpr::Pointer(_, span)
            | TypeExpr::Slice(_, span)
            | TypeExpr::Struct(_, span)
            | TypeExpr::Interface(_, span) => *span,
        }
    }
}

/// `a, b T` inside a struct
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `Name(params) results` inside an interface
#[derive(Debug, Clone)]
pub struct InterfaceMethod {
    pub name: Ident,
    pub sig: FuncSig,
    pub span: Span,
}
