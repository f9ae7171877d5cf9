//! Statement lowering.

use super::control_flow::LoopContext;
use super::ssa::Var;
use super::Lowerer;
use crate::checker::{ObjectKind, Selection};
use crate::ir::{BlockId, Constant, InstrKind, StoreTarget, Terminator, ValueId};
use crate::parser::ast::*;
use crate::parser::Span;

impl Lowerer<'_> {
    pub(super) fn lower_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.lower_stmts(&block.stmts),
            Stmt::Var(decl) => self.lower_var_decl(decl),
            Stmt::Assign(assign) => {
                let values = self.lower_values(&assign.rhs, assign.lhs.len(), |i| {
                    assign.lhs.get(i).map_or(assign.span, |t| t.span)
                });
                for (target, value) in assign.lhs.iter().zip(values) {
                    self.assign_to(target, value);
                }
            }
            Stmt::Expr(stmt) => {
                self.lower_expr(&stmt.expr);
            }
            Stmt::Defer(defer) => self.lower_defer(defer),
            Stmt::Return(ret) => self.lower_return(ret),
            Stmt::If(stmt) => self.lower_if(stmt),
            Stmt::For(stmt) => self.lower_for(stmt),
            Stmt::Break(_) => {
                if let Some(target) = self.loops.current().map(|l| l.break_block) {
                    self.jump(target);
                }
            }
            Stmt::Continue(_) => {
                if let Some(target) = self.loops.current().map(|l| l.continue_block) {
                    self.jump(target);
                }
            }
            Stmt::IncDec(stmt) => {
                let current = self.lower_expr(&stmt.target);
                let ty = self.type_of(&stmt.target);
                let one = self.func.constant(Constant::Int(1), ty);
                let op = if stmt.increment { BinaryOp::Add } else { BinaryOp::Sub };
                let next = self.emit_value(
                    InstrKind::BinOp {
                        op,
                        lhs: current,
                        rhs: one,
                    },
                    ty,
                    stmt.span,
                );
                self.assign_to(&stmt.target, next);
            }
            Stmt::Empty(_) => {}
        }
    }

    fn lower_var_decl(&mut self, decl: &VarDecl) {
        let values = if decl.values.is_empty() {
            decl.names
                .iter()
                .map(|name| {
                    let ty = self
                        .cx
                        .info
                        .defs
                        .get(&name.id)
                        .map_or_else(|| self.cx.types.invalid(), |o| self.cx.objects.get(*o).ty);
                    self.zero_value(ty)
                })
                .collect()
        } else {
            self.lower_values(&decl.values, decl.names.len(), |i| {
                decl.names.get(i).map_or(decl.span, |n| n.span)
            })
        };
        for (name, value) in decl.names.iter().zip(values) {
            if let Some(&object) = self.cx.info.defs.get(&name.id) {
                let block = self.block();
                self.write_var(Var::Object(object), block, value);
            }
        }
    }

    /// Store `value` into an assignable expression.
    pub(super) fn assign_to(&mut self, target: &Expr, value: ValueId) {
        let target = target.unparen();
        match &target.kind {
            ExprKind::Ident(_) => {
                let Some(object) = self.cx.info.object_of(target.id) else {
                    return;
                };
                match self.cx.objects.get(object).kind {
                    ObjectKind::Local => {
                        let block = self.block();
                        self.write_var(Var::Object(object), block, value);
                    }
                    ObjectKind::Global => self.emit_effect(
                        InstrKind::Store {
                            target: StoreTarget::Global(object),
                            value,
                        },
                        target.span,
                    ),
                    _ => {}
                }
            }
            ExprKind::Selector { base, field } => match self.cx.info.selection(target.id) {
                Some(Selection::PackageMember(object)) => self.emit_effect(
                    InstrKind::Store {
                        target: StoreTarget::Global(object),
                        value,
                    },
                    target.span,
                ),
                Some(Selection::Field) => {
                    let base = self.lower_expr(base);
                    self.emit_effect(
                        InstrKind::Store {
                            target: StoreTarget::Field {
                                base,
                                name: field.name,
                            },
                            value,
                        },
                        target.span,
                    );
                }
                _ => {}
            },
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => {
                let ptr = self.lower_expr(operand);
                self.emit_effect(
                    InstrKind::Store {
                        target: StoreTarget::Deref(ptr),
                        value,
                    },
                    target.span,
                );
            }
            _ => {}
        }
    }

    fn lower_defer(&mut self, defer: &DeferStmt) {
        let call_expr = defer.call.unparen();
        let Some(call) = call_expr.as_call() else {
            self.lower_expr(call_expr);
            return;
        };
        if let Some(arg) = self.conversion_arg(call) {
            self.lower_expr(arg);
            return;
        }
        let common = self.call_common(call);
        self.emit_effect(InstrKind::Defer(common), call_expr.span);
    }

    fn lower_return(&mut self, ret: &ReturnStmt) {
        let values = if ret.values.is_empty() {
            self.named_result_values()
        } else {
            let n = self.results.len().max(ret.values.len());
            self.lower_values(&ret.values, n, |i| {
                ret.values.get(i).map_or(ret.span, |v| v.span)
            })
        };
        self.terminate(Terminator::Return(values));
    }

    fn lower_if(&mut self, stmt: &IfStmt) {
        if let Some(init) = &stmt.init {
            self.lower_stmt(init);
        }
        let then_block = self.new_block("if.then");
        let done = self.new_block("if.done");
        let else_block = match stmt.else_branch {
            Some(_) => self.new_block("if.else"),
            None => done,
        };
        self.lower_branch(&stmt.cond, then_block, else_block);

        self.seal(then_block);
        self.current = Some(then_block);
        self.lower_stmts(&stmt.then_block.stmts);
        self.jump(done);

        if let Some(else_branch) = &stmt.else_branch {
            self.seal(else_block);
            self.current = Some(else_block);
            self.lower_stmt(else_branch);
            self.jump(done);
        }

        self.seal(done);
        self.current = Some(done);
    }

    fn lower_for(&mut self, stmt: &ForStmt) {
        if let Some(init) = &stmt.init {
            self.lower_stmt(init);
        }
        let header = self.new_block("for.loop");
        let body = self.new_block("for.body");
        let post = self.new_block("for.post");
        let exit = self.new_block("for.done");

        self.jump(header);
        self.current = Some(header);
        match &stmt.cond {
            Some(cond) => self.lower_branch(cond, body, exit),
            None => self.jump(body),
        }

        self.seal(body);
        self.current = Some(body);
        self.loops.push(LoopContext {
            break_block: exit,
            continue_block: post,
        });
        self.lower_stmts(&stmt.body.stmts);
        self.jump(post);
        self.loops.pop();

        self.seal(post);
        self.current = Some(post);
        if let Some(post_stmt) = &stmt.post {
            self.lower_stmt(post_stmt);
        }
        self.jump(header);

        self.seal(header);
        self.seal(exit);
        self.current = Some(exit);
    }

    /// Lower `cond` as control flow: `&&`, `||` and `!` become branches
    /// instead of values.
    pub(super) fn lower_branch(
        &mut self,
        cond: &Expr,
        then_block: BlockId,
        else_block: BlockId,
    ) {
        let cond = cond.unparen();
        match &cond.kind {
            ExprKind::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                let next = self.new_block("cond.true");
                self.lower_branch(lhs, next, else_block);
                self.seal(next);
                self.current = Some(next);
                self.lower_branch(rhs, then_block, else_block);
            }
            ExprKind::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                let next = self.new_block("cond.false");
                self.lower_branch(lhs, then_block, next);
                self.seal(next);
                self.current = Some(next);
                self.lower_branch(rhs, then_block, else_block);
            }
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.lower_branch(operand, else_block, then_block),
            _ => {
                let value = self.lower_expr(cond);
                if self.current.is_some() {
                    self.terminate(Terminator::If {
                        cond: value,
                        then_block,
                        else_block,
                    });
                }
            }
        }
    }

    /// Values for `n` targets. A single multi-valued call is spread into
    /// one extracted element per target, positioned at `span_of(i)`.
    pub(super) fn lower_values(
        &mut self,
        values: &[Expr],
        n: usize,
        span_of: impl Fn(usize) -> Span,
    ) -> Vec<ValueId> {
        if values.len() == 1 && n > 1 {
            return self.lower_tuple(&values[0], n, span_of);
        }
        let mut lowered: Vec<ValueId> = values.iter().map(|v| self.lower_expr(v)).collect();
        let invalid = self.cx.types.invalid();
        while lowered.len() < n {
            let undef = self.undef(invalid);
            lowered.push(undef);
        }
        lowered
    }
}
