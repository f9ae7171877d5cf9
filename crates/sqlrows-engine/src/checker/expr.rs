//! Expression checking, assignability and operator rules.

use super::checker::Checker;
use super::error::CheckError;
use super::info::Selection;
use super::objects::{Builtin, ObjectKind};
use crate::parser::ast::*;
use crate::parser::Span;
use crate::types::{BasicKind, Type, TypeId};

impl Checker<'_> {
    /// Check `e` and record its type. Calls may produce a tuple or the
    /// empty tuple; callers needing one value use [`single_expr`].
    ///
    /// [`single_expr`]: Self::single_expr
    pub(super) fn expr(&mut self, e: &Expr) -> TypeId {
        let ty = self.expr_kind(e);
        self.info.types.insert(e.id, ty);
        ty
    }

    /// Check an expression used where exactly one value is required.
    pub(super) fn single_expr(&mut self, e: &Expr) -> TypeId {
        let ty = self.expr(e);
        match self.types.tuple_elems(ty).map(<[TypeId]>::len) {
            Some(0) => {
                self.errors.push(CheckError::NoValue {
                    expr: self.expr_string(e),
                    span: e.span,
                });
                self.types.invalid()
            }
            Some(_) => {
                self.errors.push(CheckError::MultiValue {
                    expr: self.expr_string(e),
                    span: e.span,
                });
                self.types.invalid()
            }
            None => ty,
        }
    }

    fn expr_kind(&mut self, e: &Expr) -> TypeId {
        match &e.kind {
            ExprKind::Ident(name) => self.ident(e, *name),
            ExprKind::IntLit(_) => self.types.basic(BasicKind::UntypedInt),
            ExprKind::FloatLit(_) => self.types.basic(BasicKind::UntypedFloat),
            ExprKind::StringLit(_) => self.types.basic(BasicKind::UntypedString),
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Selector { base, field } => self.selector(e, base, *field),
            ExprKind::Call(call) => self.call(e, call),
            ExprKind::Unary { op, operand } => self.unary(e, *op, operand),
            ExprKind::Binary { op, lhs, rhs } => self.binary(e, *op, lhs, rhs),
        }
    }

    fn ident(&mut self, e: &Expr, name: crate::parser::Symbol) -> TypeId {
        let invalid = self.types.invalid();
        if self.is_blank(name) {
            self.errors.push(CheckError::BlankAsValue { span: e.span });
            return invalid;
        }
        let Some(object) = self.lookup(name) else {
            self.errors.push(CheckError::Undefined {
                name: self.interner.resolve(name).to_string(),
                span: e.span,
            });
            return invalid;
        };
        self.info.uses.insert(e.id, object);
        let obj = self.objects.get(object);
        let text = || self.interner.resolve(name).to_string();
        let err = match obj.kind {
            ObjectKind::TypeName => CheckError::TypeAsValue {
                name: text(),
                span: e.span,
            },
            ObjectKind::PkgName(_) => CheckError::PackageAsValue {
                name: text(),
                span: e.span,
            },
            ObjectKind::Builtin(_) => CheckError::BuiltinValue {
                name: text(),
                span: e.span,
            },
            _ => return obj.ty,
        };
        self.errors.push(err);
        invalid
    }

    fn selector(&mut self, e: &Expr, base: &Expr, field: Ident) -> TypeId {
        let invalid = self.types.invalid();

        // pkg.Member
        if let Some(base_ident) = base.unparen().as_ident() {
            if let Some(object) = self.lookup(base_ident.name) {
                if let ObjectKind::PkgName(path) = self.objects.get(object).kind {
                    self.info.uses.insert(base.unparen().id, object);
                    let Some(member) = self.package_member(path, field) else {
                        return invalid;
                    };
                    self.info
                        .selections
                        .insert(e.id, Selection::PackageMember(member));
                    let obj = self.objects.get(member);
                    return match obj.kind {
                        ObjectKind::TypeName => {
                            let err = CheckError::TypeAsValue {
                                name: self.expr_string(e),
                                span: e.span,
                            };
                            self.errors.push(err);
                            invalid
                        }
                        _ => obj.ty,
                    };
                }
            }
        }

        let base_ty = self.single_expr(base);
        if self.types.is_invalid(base_ty) {
            return invalid;
        }

        if let Some(method) = self.types.lookup_method(base_ty, field.name) {
            self.info.selections.insert(
                e.id,
                Selection::Method {
                    func: method.func,
                    through_pointer: method.through_pointer,
                },
            );
            return self.types.func(method.func).sig;
        }
        if let Some(ty) = self.types.field(base_ty, field.name) {
            self.info.selections.insert(e.id, Selection::Field);
            return ty;
        }
        if let Some(sig) = self.types.interface_method(base_ty, field.name) {
            self.info
                .selections
                .insert(e.id, Selection::InterfaceMethod { name: field.name });
            return sig;
        }

        self.errors.push(CheckError::MissingFieldOrMethod {
            base: self.expr_string(base),
            name: self.interner.resolve(field.name).to_string(),
            ty: self.type_string(base_ty),
            span: field.span,
        });
        invalid
    }

    fn call(&mut self, e: &Expr, call: &CallExpr) -> TypeId {
        let invalid = self.types.invalid();
        let callee = call.func.unparen();

        // Builtins and conversions are decided by what the callee names.
        if let Some(ident) = callee.as_ident() {
            if let Some(object) = self.lookup(ident.name) {
                let kind = self.objects.get(object).kind;
                match kind {
                    ObjectKind::Builtin(builtin) => {
                        self.info.uses.insert(callee.id, object);
                        return self.builtin_call(builtin, e, call);
                    }
                    ObjectKind::TypeName => {
                        self.info.uses.insert(callee.id, object);
                        let target = self.objects.get(object).ty;
                        self.info.types.insert(callee.id, target);
                        return self.conversion(target, call, e.span);
                    }
                    _ => {}
                }
            }
        }
        if let Some(target) = self.qualified_type(callee) {
            self.info.types.insert(callee.id, target);
            return self.conversion(target, call, e.span);
        }

        let func_ty = self.single_expr(&call.func);
        if self.types.is_invalid(func_ty) {
            for arg in &call.args {
                self.expr(arg);
            }
            return invalid;
        }
        let Some(sig) = self.types.as_signature(func_ty).cloned() else {
            self.errors.push(CheckError::NotCallable {
                expr: self.expr_string(&call.func),
                ty: self.type_string(func_ty),
                span: call.func.span,
            });
            for arg in &call.args {
                self.expr(arg);
            }
            return invalid;
        };

        let args: Vec<(TypeId, Span)> = if call.args.len() == 1 && !call.spread {
            let ty = self.expr(&call.args[0]);
            let spread = self
                .types
                .tuple_elems(ty)
                .filter(|elems| elems.len() > 1)
                .map(<[TypeId]>::to_vec);
            match spread {
                Some(elems) => elems.into_iter().map(|t| (t, call.args[0].span)).collect(),
                None => vec![(self.single_of(&call.args[0], ty), call.args[0].span)],
            }
        } else {
            call.args
                .iter()
                .map(|a| (self.single_expr(a), a.span))
                .collect()
        };

        let n = sig.params.len();
        let count_ok = if sig.variadic && !call.spread {
            args.len() + 1 >= n
        } else {
            args.len() == n
        };
        if !count_ok {
            self.errors.push(CheckError::ArgumentCount {
                problem: if args.len() > n { "too many" } else { "not enough" },
                callee: self.expr_string(&call.func),
                have: args.len(),
                want: n,
                span: e.span,
            });
        } else {
            for (i, (ty, span)) in args.iter().enumerate() {
                let param = if sig.variadic && !call.spread && i + 1 >= n {
                    match self.types.get(sig.params[n - 1]) {
                        Type::Slice(elem) => *elem,
                        _ => sig.params[n - 1],
                    }
                } else {
                    sig.params[i]
                };
                self.check_assignable(*ty, param, "argument", *span);
            }
        }

        match sig.results.len() {
            0 => self.types.empty_tuple(),
            1 => sig.results[0],
            _ => self.types.tuple(sig.results.clone()),
        }
    }

    /// Error for an already-checked expression that is not single valued.
    fn single_of(&mut self, e: &Expr, ty: TypeId) -> TypeId {
        if self.types.tuple_elems(ty).is_some() {
            self.errors.push(CheckError::NoValue {
                expr: self.expr_string(e),
                span: e.span,
            });
            return self.types.invalid();
        }
        ty
    }

    /// `pkg.T` in callee position, when it names a type.
    fn qualified_type(&mut self, callee: &Expr) -> Option<TypeId> {
        let ExprKind::Selector { base, field } = &callee.kind else {
            return None;
        };
        let pkg = base.unparen().as_ident()?;
        let object = self.lookup(pkg.name)?;
        let ObjectKind::PkgName(path) = self.objects.get(object).kind else {
            return None;
        };
        let dep = self.deps.get(&path)?;
        let member = dep.lookup(field.name)?;
        let obj = self.objects.get(member);
        if obj.kind != ObjectKind::TypeName {
            return None;
        }
        self.info.uses.insert(base.unparen().id, object);
        self.info.uses.insert(field.id, member);
        Some(obj.ty)
    }

    fn conversion(&mut self, target: TypeId, call: &CallExpr, span: Span) -> TypeId {
        if call.args.len() != 1 {
            self.errors.push(CheckError::ArgumentCount {
                problem: if call.args.len() > 1 { "too many" } else { "not enough" },
                callee: format!("conversion to {}", self.type_string(target)),
                have: call.args.len(),
                want: 1,
                span,
            });
            for arg in &call.args {
                self.expr(arg);
            }
            return target;
        }
        let from = self.single_expr(&call.args[0]);
        let basic = |this: &Self, t: TypeId| {
            matches!(this.types.get(this.types.underlying(t)), Type::Basic(_))
        };
        if !self.assignable(from, target)
            && !(basic(self, from) && basic(self, target))
            && self.types.underlying(from) != self.types.underlying(target)
        {
            self.errors.push(CheckError::TypeMismatch {
                expected: self.type_string(target),
                actual: self.type_string(from),
                context: "conversion",
                span: call.args[0].span,
            });
        }
        target
    }

    fn builtin_call(&mut self, builtin: Builtin, e: &Expr, call: &CallExpr) -> TypeId {
        let name = match builtin {
            Builtin::Panic => "panic",
            Builtin::Len => "len",
            Builtin::Print => "print",
            Builtin::Println => "println",
        };
        let arg_types: Vec<TypeId> = call.args.iter().map(|a| self.single_expr(a)).collect();
        match builtin {
            Builtin::Panic | Builtin::Len if arg_types.len() != 1 => {
                self.errors.push(CheckError::ArgumentCount {
                    problem: if arg_types.len() > 1 { "too many" } else { "not enough" },
                    callee: name.to_string(),
                    have: arg_types.len(),
                    want: 1,
                    span: e.span,
                });
            }
            Builtin::Len => {
                let ty = arg_types[0];
                let ok = self.types.is_invalid(ty)
                    || self.is_string(ty)
                    || matches!(self.types.get(self.types.underlying(ty)), Type::Slice(_));
                if !ok {
                    self.errors.push(CheckError::InvalidOperation {
                        op: "len",
                        ty: self.type_string(ty),
                        span: call.args[0].span,
                    });
                }
            }
            _ => {}
        }
        match builtin {
            Builtin::Len => self.types.basic(BasicKind::Int),
            _ => self.types.empty_tuple(),
        }
    }

    fn unary(&mut self, e: &Expr, op: UnaryOp, operand: &Expr) -> TypeId {
        let ty = self.single_expr(operand);
        if self.types.is_invalid(ty) {
            return ty;
        }
        let (ok, result, text) = match op {
            UnaryOp::Not => (self.is_boolean(ty), ty, "!"),
            UnaryOp::Neg => (self.is_numeric(ty), ty, "-"),
            UnaryOp::Addr => {
                let addressable = matches!(
                    operand.unparen().kind,
                    ExprKind::Ident(_) | ExprKind::Selector { .. }
                );
                let elem = self.types.default_type(ty);
                (addressable, self.types.pointer_to(elem), "&")
            }
            UnaryOp::Deref => match self.types.pointer_elem(ty) {
                Some(elem) => (true, elem, "*"),
                None => (false, ty, "*"),
            },
        };
        if !ok {
            self.errors.push(CheckError::InvalidOperation {
                op: text,
                ty: self.type_string(ty),
                span: e.span,
            });
            return self.types.invalid();
        }
        result
    }

    fn binary(&mut self, e: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> TypeId {
        let l = self.single_expr(lhs);
        let r = self.single_expr(rhs);
        let invalid = self.types.invalid();
        if self.types.is_invalid(l) || self.types.is_invalid(r) {
            return invalid;
        }

        if op.is_logical() {
            if !self.is_boolean(l) || !self.is_boolean(r) {
                let bad = if self.is_boolean(l) { r } else { l };
                self.errors.push(CheckError::InvalidOperation {
                    op: op.as_str(),
                    ty: self.type_string(bad),
                    span: e.span,
                });
                return invalid;
            }
            return if self.is_untyped(l) && self.is_untyped(r) {
                l
            } else {
                self.types.basic(BasicKind::Bool)
            };
        }

        if op.is_comparison() {
            if !self.assignable(l, r) && !self.assignable(r, l) {
                self.errors.push(CheckError::MismatchedOperands {
                    lhs: self.type_string(l),
                    rhs: self.type_string(r),
                    span: e.span,
                });
                return invalid;
            }
            let nil = self.types.untyped_nil();
            if l == nil && r == nil {
                self.errors.push(CheckError::InvalidOperation {
                    op: op.as_str(),
                    ty: "untyped nil".to_string(),
                    span: e.span,
                });
                return invalid;
            }
            let ordered = !matches!(op, BinaryOp::Eq | BinaryOp::Ne);
            if ordered && !(self.is_numeric(l) || self.is_string(l)) {
                self.errors.push(CheckError::InvalidOperation {
                    op: op.as_str(),
                    ty: self.type_string(l),
                    span: e.span,
                });
                return invalid;
            }
            return self.types.basic(BasicKind::UntypedBool);
        }

        // Arithmetic
        let string_concat = op == BinaryOp::Add && self.is_string(l) && self.is_string(r);
        if !string_concat && (!self.is_numeric(l) || !self.is_numeric(r)) {
            let bad = if self.is_numeric(l) || self.is_string(l) { r } else { l };
            self.errors.push(CheckError::InvalidOperation {
                op: op.as_str(),
                ty: self.type_string(bad),
                span: e.span,
            });
            return invalid;
        }
        match (self.is_untyped(l), self.is_untyped(r)) {
            (true, true) => {
                let float = self.types.basic(BasicKind::UntypedFloat);
                if l == float || r == float {
                    float
                } else {
                    l
                }
            }
            (true, false) => r,
            (false, true) => l,
            (false, false) if l == r => l,
            (false, false) => {
                self.errors.push(CheckError::MismatchedOperands {
                    lhs: self.type_string(l),
                    rhs: self.type_string(r),
                    span: e.span,
                });
                invalid
            }
        }
    }

    // ------------------------------------------------------------------
    // Type relations
    // ------------------------------------------------------------------

    pub(super) fn check_assignable(&mut self, from: TypeId, to: TypeId, context: &'static str, span: Span) {
        if !self.assignable(from, to) {
            self.errors.push(CheckError::TypeMismatch {
                expected: self.type_string(to),
                actual: self.type_string(from),
                context,
                span,
            });
        }
    }

    /// Go assignability restricted to the types of the subset.
    pub(super) fn assignable(&self, from: TypeId, to: TypeId) -> bool {
        let types = &*self.types;
        if from == to || types.is_invalid(from) || types.is_invalid(to) {
            return true;
        }
        match types.get(from) {
            Type::UntypedNil => return types.is_nillable(to),
            Type::Basic(kind) if kind.is_untyped() => {
                return match types.get(types.underlying(to)) {
                    Type::Basic(target) => untyped_fits(*kind, *target),
                    Type::Interface(methods) => methods.is_empty(),
                    _ => false,
                };
            }
            _ => {}
        }
        if types.is_interface(to) {
            return self.implements(from, to);
        }
        let named = |t: TypeId| matches!(types.get(t), Type::Named(_));
        types.underlying(from) == types.underlying(to) && (!named(from) || !named(to))
    }

    /// Whether `ty` has every method of interface `iface`.
    fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        let types = &*self.types;
        let Type::Interface(methods) = types.get(types.underlying(iface)) else {
            return false;
        };
        methods.iter().all(|&(name, sig)| {
            if types.is_interface(ty) {
                return types.interface_method(ty, name) == Some(sig);
            }
            match types.lookup_method(ty, name) {
                Some(found) => {
                    let func = types.func(found.func);
                    func.sig == sig
                        && (found.through_pointer || !func.recv.is_some_and(|r| r.pointer))
                }
                None => false,
            }
        })
    }

    pub(super) fn is_boolean(&self, ty: TypeId) -> bool {
        matches!(
            self.types.get(self.types.underlying(ty)),
            Type::Basic(BasicKind::Bool | BasicKind::UntypedBool)
        )
    }

    pub(super) fn is_numeric(&self, ty: TypeId) -> bool {
        matches!(
            self.types.get(self.types.underlying(ty)),
            Type::Basic(
                BasicKind::Int
                    | BasicKind::Int64
                    | BasicKind::Float64
                    | BasicKind::Byte
                    | BasicKind::UntypedInt
                    | BasicKind::UntypedFloat
            )
        )
    }

    fn is_string(&self, ty: TypeId) -> bool {
        matches!(
            self.types.get(self.types.underlying(ty)),
            Type::Basic(BasicKind::String | BasicKind::UntypedString)
        )
    }

    fn is_untyped(&self, ty: TypeId) -> bool {
        matches!(self.types.get(ty), Type::Basic(kind) if kind.is_untyped())
    }

    pub(super) fn type_string(&self, ty: TypeId) -> String {
        self.types.display(ty, self.interner)
    }

    /// Short source-like rendering of an expression for messages.
    pub(super) fn expr_string(&self, e: &Expr) -> String {
        match &e.kind {
            ExprKind::Ident(name) => self.interner.resolve(*name).to_string(),
            ExprKind::IntLit(n) => n.to_string(),
            ExprKind::FloatLit(n) => n.to_string(),
            ExprKind::StringLit(s) => format!("{:?}", self.interner.resolve(*s)),
            ExprKind::Selector { base, field } => {
                format!("{}.{}", self.expr_string(base), self.interner.resolve(field.name))
            }
            ExprKind::Call(call) => format!("{}(...)", self.expr_string(&call.func)),
            ExprKind::Unary { op, operand } => {
                let op = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Addr => "&",
                    UnaryOp::Deref => "*",
                };
                format!("{}{}", op, self.expr_string(operand))
            }
            ExprKind::Binary { op, lhs, rhs } => format!(
                "{} {} {}",
                self.expr_string(lhs),
                op.as_str(),
                self.expr_string(rhs)
            ),
            ExprKind::Paren(inner) => format!("({})", self.expr_string(inner)),
        }
    }
}

fn untyped_fits(kind: BasicKind, target: BasicKind) -> bool {
    match kind {
        BasicKind::UntypedBool => target == BasicKind::Bool,
        BasicKind::UntypedInt => matches!(
            target,
            BasicKind::Int | BasicKind::Int64 | BasicKind::Float64 | BasicKind::Byte
        ),
        BasicKind::UntypedFloat => target == BasicKind::Float64,
        BasicKind::UntypedString => target == BasicKind::String,
        _ => false,
    }
}
