//! Statement checking.

use super::checker::Checker;
use super::error::CheckError;
use super::scope::ScopeKind;
use crate::parser::ast::*;
use crate::parser::Span;
use crate::types::{Type, TypeId};

impl Checker<'_> {
    pub(super) fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_block(&mut self, block: &Block, kind: ScopeKind) {
        self.scopes.push(kind);
        self.check_stmts(&block.stmts);
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.check_block(block, ScopeKind::Block),
            Stmt::Var(decl) => self.check_var_decl(decl, false),
            Stmt::Assign(assign) => match assign.op {
                AssignOp::Define => self.check_define(assign),
                AssignOp::Assign => self.check_assign(assign),
            },
            Stmt::Expr(stmt) => {
                if stmt.expr.unparen().as_call().is_none() {
                    self.errors.push(CheckError::UnusedExpression {
                        expr: self.expr_string(&stmt.expr),
                        span: stmt.span,
                    });
                }
                self.expr(&stmt.expr);
            }
            Stmt::Defer(defer) => {
                self.expr(&defer.call);
            }
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::If(stmt) => self.check_if(stmt),
            Stmt::For(stmt) => {
                self.scopes.push(ScopeKind::Loop);
                if let Some(init) = &stmt.init {
                    self.check_stmt(init);
                }
                if let Some(cond) = &stmt.cond {
                    self.check_condition(cond, "for statement");
                }
                if let Some(post) = &stmt.post {
                    self.check_stmt(post);
                }
                self.check_block(&stmt.body, ScopeKind::Block);
                self.scopes.pop();
            }
            Stmt::Break(span) => self.check_in_loop("break", *span),
            Stmt::Continue(span) => self.check_in_loop("continue", *span),
            Stmt::IncDec(stmt) => {
                let ty = self.single_expr(&stmt.target);
                if !self.types.is_invalid(ty) && !self.is_numeric(ty) {
                    self.errors.push(CheckError::InvalidOperation {
                        op: if stmt.increment { "++" } else { "--" },
                        ty: self.type_string(ty),
                        span: stmt.span,
                    });
                }
                self.check_addressable(&stmt.target);
            }
            Stmt::Empty(_) => {}
        }
    }

    fn check_in_loop(&mut self, keyword: &'static str, span: Span) {
        if !self.scopes.in_loop() {
            self.errors.push(CheckError::OutsideLoop { keyword, span });
        }
    }

    fn check_if(&mut self, stmt: &IfStmt) {
        self.scopes.push(ScopeKind::Block);
        if let Some(init) = &stmt.init {
            self.check_stmt(init);
        }
        self.check_condition(&stmt.cond, "if statement");
        self.check_block(&stmt.then_block, ScopeKind::Block);
        if let Some(else_branch) = &stmt.else_branch {
            self.check_stmt(else_branch);
        }
        self.scopes.pop();
    }

    fn check_condition(&mut self, cond: &Expr, context: &'static str) {
        let ty = self.single_expr(cond);
        if !self.types.is_invalid(ty) && !self.is_boolean(ty) {
            self.errors.push(CheckError::NonBoolCondition {
                context,
                span: cond.span,
            });
        }
    }

    /// `var` declaration, local or package level.
    pub(super) fn check_var_decl(&mut self, decl: &VarDecl, global: bool) {
        let declared = decl.ty.as_ref().map(|ty| self.resolve_type(ty));
        let values = self.check_rhs(&decl.values, decl.names.len(), decl.span);
        for (i, name) in decl.names.iter().enumerate() {
            let ty = match (declared, values.get(i)) {
                (Some(declared), Some(&value)) => {
                    let span = decl.values.get(i).map_or(decl.span, |v| v.span);
                    self.check_assignable(value, declared, "variable declaration", span);
                    declared
                }
                (Some(declared), None) => declared,
                (None, Some(&value)) => self.infer_var_type(value, name.span),
                (None, None) => self.types.invalid(),
            };
            if global {
                self.declare_global(*name, ty);
            } else {
                self.declare_local(*name, ty);
            }
        }
    }

    /// Type of a variable declared without an explicit type.
    fn infer_var_type(&mut self, value: TypeId, span: Span) -> TypeId {
        if *self.types.get(value) == Type::UntypedNil {
            self.errors.push(CheckError::UntypedNil {
                context: "assignment",
                span,
            });
            return self.types.invalid();
        }
        self.types.default_type(value)
    }

    /// Types of the right-hand side for `n_lhs` targets. A single call
    /// returning `n_lhs` results is spread over the targets.
    fn check_rhs(&mut self, values: &[Expr], n_lhs: usize, span: Span) -> Vec<TypeId> {
        if values.is_empty() {
            return Vec::new();
        }
        let invalid = self.types.invalid();
        if values.len() == 1 && n_lhs > 1 {
            let ty = self.expr(&values[0]);
            if let Some(elems) = self.types.tuple_elems(ty) {
                if elems.len() == n_lhs {
                    return elems.to_vec();
                }
                let rhs = elems.len();
                self.errors.push(CheckError::AssignmentMismatch {
                    lhs: n_lhs,
                    rhs,
                    span,
                });
            } else if !self.types.is_invalid(ty) {
                self.errors.push(CheckError::AssignmentMismatch {
                    lhs: n_lhs,
                    rhs: 1,
                    span,
                });
            }
            return vec![invalid; n_lhs];
        }
        let mut types: Vec<TypeId> = values.iter().map(|v| self.single_expr(v)).collect();
        if values.len() != n_lhs {
            self.errors.push(CheckError::AssignmentMismatch {
                lhs: n_lhs,
                rhs: values.len(),
                span,
            });
            types.resize(n_lhs, invalid);
        }
        types
    }

    /// `a, b := ...`: redeclares names already in the innermost scope and
    /// declares the rest; at least one must be new.
    fn check_define(&mut self, assign: &AssignStmt) {
        let values = self.check_rhs(&assign.rhs, assign.lhs.len(), assign.span);
        let mut any_new = false;
        for (i, target) in assign.lhs.iter().enumerate() {
            let Some(ident) = target.as_ident() else { continue };
            let value = values.get(i).copied().unwrap_or_else(|| self.types.invalid());
            if self.is_blank(ident.name) {
                self.info.types.insert(target.id, value);
                continue;
            }
            if let Some(existing) = self.scopes.lookup_innermost(ident.name) {
                self.info.uses.insert(target.id, existing);
                let ty = self.objects.get(existing).ty;
                self.check_assignable(value, ty, "assignment", target.span);
                self.info.types.insert(target.id, ty);
            } else {
                any_new = true;
                let ty = self.infer_var_type(value, ident.span);
                self.declare_local(ident, ty);
                self.info.types.insert(target.id, ty);
            }
        }
        if !any_new {
            self.errors.push(CheckError::NoNewVariables { span: assign.span });
        }
    }

    fn check_assign(&mut self, assign: &AssignStmt) {
        let values = self.check_rhs(&assign.rhs, assign.lhs.len(), assign.span);
        for (i, target) in assign.lhs.iter().enumerate() {
            let value = values.get(i).copied().unwrap_or_else(|| self.types.invalid());
            if target.as_ident().is_some_and(|id| self.is_blank(id.name)) {
                self.info.types.insert(target.id, value);
                continue;
            }
            let ty = self.single_expr(target);
            self.check_addressable(target);
            self.check_assignable(value, ty, "assignment", target.span);
        }
    }

    fn check_addressable(&mut self, target: &Expr) {
        let ok = match &target.unparen().kind {
            ExprKind::Ident(_) => self
                .info
                .uses
                .get(&target.unparen().id)
                .is_some_and(|o| self.objects.get(*o).is_var()),
            ExprKind::Selector { .. } => matches!(
                self.info.selection(target.unparen().id),
                Some(super::info::Selection::Field)
                    | Some(super::info::Selection::PackageMember(_))
            ),
            ExprKind::Unary {
                op: UnaryOp::Deref,
                ..
            } => true,
            _ => false,
        };
        let invalid = self
            .info
            .type_of(target.id)
            .map_or(true, |t| self.types.is_invalid(t));
        if !ok && !invalid {
            self.errors.push(CheckError::NotAssignable {
                expr: self.expr_string(target),
                span: target.span,
            });
        }
    }

    fn check_return(&mut self, ret: &ReturnStmt) {
        let want = self.results.clone();
        if ret.values.is_empty() {
            if !want.is_empty() && !self.named_results {
                self.errors.push(CheckError::ReturnCount {
                    problem: "few",
                    have: 0,
                    want: want.len(),
                    span: ret.span,
                });
            }
            return;
        }
        let have: Vec<TypeId> = if ret.values.len() == 1 && want.len() > 1 {
            let ty = self.expr(&ret.values[0]);
            match self.types.tuple_elems(ty) {
                Some(elems) => elems.to_vec(),
                None => vec![ty],
            }
        } else {
            ret.values.iter().map(|v| self.single_expr(v)).collect()
        };
        if have.len() != want.len() {
            self.errors.push(CheckError::ReturnCount {
                problem: if have.len() > want.len() { "many" } else { "few" },
                have: have.len(),
                want: want.len(),
                span: ret.span,
            });
            return;
        }
        for (i, (&from, &to)) in have.iter().zip(&want).enumerate() {
            let span = ret.values.get(i).map_or(ret.span, |v| v.span);
            self.check_assignable(from, to, "return statement", span);
        }
    }
}
