//! Abstract syntax tree for the Go subset.
//!
//! Every expression carries a [`NodeId`] that is unique within its package.
//! The checker keys its type information by these ids, and the analyzers
//! look it up while walking the tree.

pub mod expression;
pub mod statement;
pub mod types;
pub mod visitor;

pub use expression::*;
pub use statement::*;
pub use types::*;
pub use visitor::*;

use crate::parser::interner::Symbol;
use crate::parser::token::Span;

/// Identity of an AST node, unique within one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Hands out sequential node ids. One generator is shared by all files of a
/// package.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn count(&self) -> u32 {
        self.next
    }
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// `import [name] "path"`
#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    pub path: Symbol,
    pub path_span: Span,
    pub span: Span,
}

impl File {
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }
}
