//! AST visitor for read-only traversal.
//!
//! Each `visit_*` method defaults to the matching `walk_*` function, so an
//! implementation overrides only the nodes it cares about and calls the
//! walker to keep descending.
//!
//! ```ignore
//! struct CountCalls(usize);
//!
//! impl Visitor for CountCalls {
//!     fn visit_call(&mut self, expr: &Expr, call: &CallExpr) {
//!         self.0 += 1;
//!         walk_call(self, expr, call);
//!     }
//! }
//! ```

use super::*;

pub trait Visitor: Sized {
    fn visit_file(&mut self, file: &File) {
        walk_file(self, file);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_func_decl(&mut self, decl: &FuncDecl) {
        walk_func_decl(self, decl);
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        walk_var_decl(self, decl);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_call(&mut self, expr: &Expr, call: &CallExpr) {
        walk_call(self, expr, call);
    }
}

pub fn walk_file<V: Visitor>(v: &mut V, file: &File) {
    for decl in &file.decls {
        v.visit_decl(decl);
    }
}

pub fn walk_decl<V: Visitor>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Func(f) => v.visit_func_decl(f),
        Decl::Var(var) => v.visit_var_decl(var),
        Decl::Type(_) => {}
    }
}

pub fn walk_func_decl<V: Visitor>(v: &mut V, decl: &FuncDecl) {
    if let Some(body) = &decl.body {
        v.visit_block(body);
    }
}

pub fn walk_var_decl<V: Visitor>(v: &mut V, decl: &VarDecl) {
    for value in &decl.values {
        v.visit_expr(value);
    }
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block(b) => v.visit_block(b),
        Stmt::Var(decl) => v.visit_var_decl(decl),
        Stmt::Assign(a) => {
            for e in &a.lhs {
                v.visit_expr(e);
            }
            for e in &a.rhs {
                v.visit_expr(e);
            }
        }
        Stmt::Expr(e) => v.visit_expr(&e.expr),
        Stmt::Defer(d) => v.visit_expr(&d.call),
        Stmt::Return(r) => {
            for e in &r.values {
                v.visit_expr(e);
            }
        }
        Stmt::If(i) => {
            if let Some(init) = &i.init {
                v.visit_stmt(init);
            }
            v.visit_expr(&i.cond);
            v.visit_block(&i.then_block);
            if let Some(else_branch) = &i.else_branch {
                v.visit_stmt(else_branch);
            }
        }
        Stmt::For(f) => {
            if let Some(init) = &f.init {
                v.visit_stmt(init);
            }
            if let Some(cond) = &f.cond {
                v.visit_expr(cond);
            }
            if let Some(post) = &f.post {
                v.visit_stmt(post);
            }
            v.visit_block(&f.body);
        }
        Stmt::IncDec(s) => v.visit_expr(&s.target),
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Selector { base, .. } => v.visit_expr(base),
        ExprKind::Call(call) => v.visit_call(expr, call),
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Paren(inner) => v.visit_expr(inner),
        ExprKind::Ident(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::StringLit(_) => {}
    }
}

pub fn walk_call<V: Visitor>(v: &mut V, _expr: &Expr, call: &CallExpr) {
    v.visit_expr(&call.func);
    for arg in &call.args {
        v.visit_expr(arg);
    }
}
