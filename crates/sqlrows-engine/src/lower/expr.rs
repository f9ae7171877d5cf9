//! Expression lowering.

use super::ssa::Var;
use super::Lowerer;
use crate::checker::{Builtin, ObjectId, ObjectKind, Selection};
use crate::ir::{CallCommon, Callee, Constant, InstrKind, Terminator, ValueId};
use crate::parser::ast::*;
use crate::parser::Span;

impl Lowerer<'_> {
    pub(super) fn lower_expr(&mut self, e: &Expr) -> ValueId {
        let ty = self.type_of(e);
        match &e.kind {
            ExprKind::Ident(_) => self.lower_ident(e),
            ExprKind::IntLit(n) => self.func.constant(Constant::Int(*n), ty),
            ExprKind::FloatLit(n) => self.func.constant(Constant::Float(*n), ty),
            ExprKind::StringLit(s) => self.func.constant(Constant::Str(*s), ty),
            ExprKind::Paren(inner) => self.lower_expr(inner),
            ExprKind::Selector { base, field } => match self.cx.info.selection(e.id) {
                Some(Selection::PackageMember(object)) => self.load_object(object, e),
                Some(Selection::Field) | Some(Selection::Method { .. }) | Some(Selection::InterfaceMethod { .. }) => {
                    let base = self.lower_expr(base);
                    self.emit_value(
                        InstrKind::Field {
                            base,
                            name: field.name,
                        },
                        ty,
                        e.span,
                    )
                }
                None => self.undef(ty),
            },
            ExprKind::Call(call) => self.lower_call(e, call),
            ExprKind::Unary { op, operand } => {
                let operand = self.lower_expr(operand);
                self.emit_value(InstrKind::UnOp { op: *op, operand }, ty, e.span)
            }
            ExprKind::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                lhs,
                rhs,
            } => self.lower_logical(e, *op, lhs, rhs),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs);
                let rhs = self.lower_expr(rhs);
                self.emit_value(InstrKind::BinOp { op: *op, lhs, rhs }, ty, e.span)
            }
        }
    }

    fn lower_ident(&mut self, e: &Expr) -> ValueId {
        match self.cx.info.object_of(e.id) {
            Some(object) => self.load_object(object, e),
            None => {
                let ty = self.type_of(e);
                self.undef(ty)
            }
        }
    }

    fn load_object(&mut self, object: ObjectId, e: &Expr) -> ValueId {
        let obj = self.cx.objects.get(object);
        let (kind, obj_ty) = (obj.kind, obj.ty);
        let ty = self.type_of(e);
        match kind {
            ObjectKind::Local => {
                let block = self.block();
                self.read_var(Var::Object(object), block)
            }
            ObjectKind::Global => self.emit_value(InstrKind::Global(object), obj_ty, e.span),
            ObjectKind::Func(func) => self.func.constant(Constant::Func(func), obj_ty),
            ObjectKind::Nil => self.func.constant(Constant::Nil, ty),
            ObjectKind::Const(b) => self.func.constant(Constant::Bool(b), ty),
            ObjectKind::TypeName | ObjectKind::PkgName(_) | ObjectKind::Builtin(_) => self.undef(ty),
        }
    }

    /// `a && b` / `a || b` as a value: the right operand runs in its own
    /// block and the result merges through a temporary.
    fn lower_logical(&mut self, e: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> ValueId {
        let ty = self.type_of(e);
        let temp = self.new_temp(ty);
        let left = self.lower_expr(lhs);
        let from = self.block();
        self.write_var(temp, from, left);

        let rhs_block = self.new_block("binop.rhs");
        let done = self.new_block("binop.done");
        let (then_block, else_block) = match op {
            BinaryOp::And => (rhs_block, done),
            _ => (done, rhs_block),
        };
        self.terminate(Terminator::If {
            cond: left,
            then_block,
            else_block,
        });

        self.seal(rhs_block);
        self.current = Some(rhs_block);
        let right = self.lower_expr(rhs);
        let end = self.block();
        self.write_var(temp, end, right);
        self.jump(done);

        self.seal(done);
        self.current = Some(done);
        self.read_var(temp, done)
    }

    fn lower_call(&mut self, e: &Expr, call: &CallExpr) -> ValueId {
        let ty = self.type_of(e);
        if let Some(arg) = self.conversion_arg(call) {
            let value = self.lower_expr(arg);
            return self.emit_value(InstrKind::Convert(value), ty, e.span);
        }
        let common = self.call_common(call);
        if common.callee == Callee::Builtin(Builtin::Panic) {
            let value = match common.args.first() {
                Some(&v) => v,
                None => {
                    let invalid = self.cx.types.invalid();
                    self.undef(invalid)
                }
            };
            self.terminate(Terminator::Panic(value));
            return self.undef(ty);
        }
        self.emit_value(InstrKind::Call(common), ty, e.span)
    }

    /// Operand of a conversion `T(x)` or `pkg.T(x)`.
    pub(super) fn conversion_arg<'e>(&self, call: &'e CallExpr) -> Option<&'e Expr> {
        let callee = call.func.unparen();
        let named = match &callee.kind {
            ExprKind::Ident(_) => callee.id,
            ExprKind::Selector { field, .. } => field.id,
            _ => return None,
        };
        let object = self.cx.info.uses.get(&named)?;
        if self.cx.objects.get(*object).kind != ObjectKind::TypeName {
            return None;
        }
        call.args.first()
    }

    /// Callee, receiver and arguments of a call, evaluated in that order.
    pub(super) fn call_common(&mut self, call: &CallExpr) -> CallCommon {
        let callee_expr = call.func.unparen();
        let (callee, receiver) = match &callee_expr.kind {
            ExprKind::Ident(_) => {
                let kind = self
                    .cx
                    .info
                    .object_of(callee_expr.id)
                    .map(|o| self.cx.objects.get(o).kind);
                match kind {
                    Some(ObjectKind::Builtin(builtin)) => (Callee::Builtin(builtin), None),
                    Some(ObjectKind::Func(func)) => (Callee::Static(func), None),
                    _ => (Callee::Dynamic(self.lower_expr(callee_expr)), None),
                }
            }
            ExprKind::Selector { base, .. } => match self.cx.info.selection(callee_expr.id) {
                Some(Selection::Method { func, .. }) => (Callee::Method(func), Some(self.lower_expr(base))),
                Some(Selection::InterfaceMethod { name }) => {
                    (Callee::Interface(name), Some(self.lower_expr(base)))
                }
                Some(Selection::PackageMember(object)) => match self.cx.objects.get(object).kind {
                    ObjectKind::Func(func) => (Callee::Static(func), None),
                    _ => (Callee::Dynamic(self.lower_expr(callee_expr)), None),
                },
                _ => (Callee::Dynamic(self.lower_expr(callee_expr)), None),
            },
            _ => (Callee::Dynamic(self.lower_expr(callee_expr)), None),
        };
        let args = self.lower_args(call);
        CallCommon {
            callee,
            receiver,
            args,
        }
    }

    fn lower_args(&mut self, call: &CallExpr) -> Vec<ValueId> {
        if let [arg] = call.args.as_slice() {
            let arity = self
                .cx
                .types
                .tuple_elems(self.type_of(arg))
                .map_or(0, <[_]>::len);
            if !call.spread && arity > 1 {
                return self.lower_tuple(arg, arity, |_| arg.span);
            }
        }
        call.args.iter().map(|a| self.lower_expr(a)).collect()
    }

    /// Evaluate a multi-valued call and extract each of its `n` elements.
    pub(super) fn lower_tuple(&mut self, e: &Expr, n: usize, span_of: impl Fn(usize) -> Span) -> Vec<ValueId> {
        let tuple = self.lower_expr(e);
        let elems: Vec<_> = self
            .cx
            .types
            .tuple_elems(self.type_of(e))
            .map(<[_]>::to_vec)
            .unwrap_or_default();
        let invalid = self.cx.types.invalid();
        (0..n)
            .map(|index| match elems.get(index) {
                Some(&ty) => self.emit_value(InstrKind::Extract { tuple, index }, ty, span_of(index)),
                None => self.undef(invalid),
            })
            .collect()
    }
}
