//! Declaration and statement nodes

use super::{Expr, Ident, TypeExpr};
use crate::parser::token::Span;

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeDecl),
    Var(VarDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Func(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Var(d) => d.span,
        }
    }
}

/// `func [recv] name(params) results [body]`
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub sig: FuncSig,
    /// `None` for declaration-only stubs
    pub body: Option<Block>,
    pub span: Span,
}

/// Method receiver: `(r T)` or `(r *T)`
#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub pointer: bool,
    pub type_name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub span: Span,
}

impl FuncSig {
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

/// One parameter or result. Grouped declarations (`a, b int`) are expanded
/// into one `Param` per name.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
    pub span: Span,
}

/// `type Name T`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `var a, b T = x, y`
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Var(VarDecl),
    Assign(AssignStmt),
    Expr(ExprStmt),
    Defer(DeferStmt),
    Return(ReturnStmt),
    If(IfStmt),
    For(ForStmt),
    Break(Span),
    Continue(Span),
    IncDec(IncDecStmt),
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(b) => b.span,
            Stmt::Var(v) => v.span,
            Stmt::Assign(a) => a.span,
            Stmt::Expr(e) => e.span,
            Stmt::Defer(d) => d.span,
            Stmt::Return(r) => r.span,
            Stmt::If(i) => i.span,
            Stmt::For(f) => f.span,
            Stmt::IncDec(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Empty(span) => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=`
    Define,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub op: AssignOp,
    pub rhs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// `defer call`. The parser guarantees `call` is a call expression.
#[derive(Debug, Clone)]
pub struct DeferStmt {
    pub call: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then_block: Block,
    /// Either another `Stmt::If` or a `Stmt::Block`
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IncDecStmt {
    pub target: Expr,
    pub increment: bool,
    pub span: Span,
}
