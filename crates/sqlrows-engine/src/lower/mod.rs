//! AST to SSA lowering
//!
//! Converts each checked function body into an [`ir::Function`]. Locals are
//! renamed into SSA values as the CFG is built (see `ssa`), every element
//! of a multi-valued call is extracted, `defer` becomes a Defer
//! instruction and `panic` ends its block with a panic terminator.
//!
//! [`ir::Function`]: crate::ir::Function

mod control_flow;
mod expr;
mod ssa;
mod stmt;

use tracing::trace;

use crate::checker::{ObjectId, ObjectTable, TypeInfo};
use crate::ir::{BlockId, Constant, Function, InstrKind, StoreTarget, Terminator, ValueDef, ValueId};
use crate::parser::ast::{Decl, Expr, File, FuncDecl};
use crate::parser::{Interner, Span};
use crate::types::{FuncId, TypeContext, TypeId};
use control_flow::LoopStack;
use ssa::{SsaState, Var};

/// Read-only inputs shared by every function of a package.
#[derive(Clone, Copy)]
pub struct LowerContext<'a> {
    pub interner: &'a Interner,
    pub types: &'a TypeContext,
    pub objects: &'a ObjectTable,
    pub info: &'a TypeInfo,
}

/// Lower every function with a body, plus a synthetic `init` holding the
/// package variable initializers when there are any.
pub fn lower_package(files: &[File], cx: LowerContext<'_>) -> Vec<Function> {
    let mut functions = Vec::new();
    for file in files {
        for decl in file.funcs() {
            if decl.body.is_none() {
                continue;
            }
            let Some(&func) = cx.info.funcs.get(&decl.name.id) else {
                continue;
            };
            functions.push(lower_function(cx, decl, func));
        }
    }
    if let Some(init) = lower_package_init(cx, files) {
        functions.push(init);
    }
    functions
}

/// Lower one function declaration.
pub fn lower_function(cx: LowerContext<'_>, decl: &FuncDecl, func: FuncId) -> Function {
    let name = function_name(cx, func);
    let mut lowerer = Lowerer::new(cx, Function::new(name, Some(func), decl.span));
    let entry = lowerer.func.add_block(None);
    lowerer.seal(entry);
    lowerer.current = Some(entry);

    if let Some(recv) = &decl.recv {
        let object = recv.name.and_then(|n| cx.info.defs.get(&n.id).copied());
        lowerer.bind_param(object);
    }
    for param in &decl.sig.params {
        let object = param.name.and_then(|n| cx.info.defs.get(&n.id).copied());
        lowerer.bind_param(object);
    }
    let sig = cx.types.func(func).sig;
    let result_types = cx
        .types
        .as_signature(sig)
        .map(|s| s.results.clone())
        .unwrap_or_default();
    for (result, ty) in decl.sig.results.iter().zip(&result_types) {
        let object = result.name.and_then(|n| cx.info.defs.get(&n.id).copied());
        if let Some(object) = object {
            let zero = lowerer.zero_value(*ty);
            lowerer.write_var(Var::Object(object), entry, zero);
        }
        lowerer.results.push((object, *ty));
    }

    if let Some(body) = &decl.body {
        lowerer.lower_stmts(&body.stmts);
    }
    if lowerer.current.is_some() {
        let values = lowerer.named_result_values();
        lowerer.terminate(Terminator::Return(values));
    }
    lowerer.finish()
}

fn lower_package_init(cx: LowerContext<'_>, files: &[File]) -> Option<Function> {
    let vars: Vec<_> = files
        .iter()
        .flat_map(|f| f.decls.iter())
        .filter_map(|d| match d {
            Decl::Var(v) if !v.values.is_empty() => Some(v),
            _ => None,
        })
        .collect();
    let first = vars.first()?;
    let mut lowerer = Lowerer::new(cx, Function::new("init", None, first.span));
    let entry = lowerer.func.add_block(None);
    lowerer.seal(entry);
    lowerer.current = Some(entry);
    for decl in vars {
        let values = lowerer.lower_values(&decl.values, decl.names.len(), |i| {
            decl.names.get(i).map_or(decl.span, |n| n.span)
        });
        for (name, value) in decl.names.iter().zip(values) {
            if let Some(&object) = cx.info.defs.get(&name.id) {
                lowerer.emit_effect(
                    InstrKind::Store {
                        target: StoreTarget::Global(object),
                        value,
                    },
                    name.span,
                );
            }
        }
    }
    lowerer.terminate(Terminator::Return(Vec::new()));
    Some(lowerer.finish())
}

/// `f`, `T.m` or `(*T).m`
fn function_name(cx: LowerContext<'_>, func: FuncId) -> String {
    let obj = cx.types.func(func);
    let name = cx.interner.resolve(obj.name);
    match obj.recv {
        Some(recv) => {
            let ty = cx.interner.resolve(cx.types.named(recv.named).name);
            if recv.pointer {
                format!("(*{}).{}", ty, name)
            } else {
                format!("{}.{}", ty, name)
            }
        }
        None => name.to_string(),
    }
}

/// Per-function lowering state.
pub(crate) struct Lowerer<'a> {
    cx: LowerContext<'a>,
    func: Function,
    /// Block receiving instructions; `None` after a terminator
    current: Option<BlockId>,
    ssa: SsaState,
    loops: LoopStack,
    /// Result slots: named result variable (if any) and type
    results: Vec<(Option<ObjectId>, TypeId)>,
}

impl<'a> Lowerer<'a> {
    fn new(cx: LowerContext<'a>, func: Function) -> Self {
        Self {
            cx,
            func,
            current: None,
            ssa: SsaState::default(),
            loops: LoopStack::new(),
            results: Vec::new(),
        }
    }

    fn bind_param(&mut self, object: Option<ObjectId>) {
        let ty = object.map_or_else(|| self.cx.types.invalid(), |o| self.cx.objects.get(o).ty);
        let value = self.func.add_param(ty);
        if let Some(object) = object {
            let entry = self.func.entry();
            self.write_var(Var::Object(object), entry, value);
        }
    }

    fn finish(mut self) -> Function {
        self.seal_all();
        self.func.remove_unreachable_blocks();
        ssa::eliminate_trivial_phis(&mut self.func);
        trace!(
            function = %self.func.name,
            blocks = self.func.block_count(),
            instructions = self.func.instruction_count(),
            "lowered function"
        );
        self.func
    }

    /// Block to emit into. Code after a terminator goes into a fresh block
    /// with no predecessors, which is pruned at the end.
    fn block(&mut self) -> BlockId {
        match self.current {
            Some(block) => block,
            None => {
                let block = self.func.add_block(Some("unreachable"));
                self.seal(block);
                self.current = Some(block);
                block
            }
        }
    }

    fn new_block(&mut self, comment: &'static str) -> BlockId {
        self.func.add_block(Some(comment))
    }

    fn emit_value(&mut self, kind: InstrKind, ty: TypeId, span: Span) -> ValueId {
        let block = self.block();
        self.func.push_value(block, kind, ty, span)
    }

    fn emit_effect(&mut self, kind: InstrKind, span: Span) {
        let block = self.block();
        self.func.push_effect(block, kind, span);
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = self.block();
        self.func.terminate(block, terminator);
        self.current = None;
    }

    /// Jump to `target` unless the current position is unreachable.
    fn jump(&mut self, target: BlockId) {
        if let Some(block) = self.current.take() {
            self.func.terminate(block, Terminator::Jump(target));
        }
    }

    fn undef(&mut self, ty: TypeId) -> ValueId {
        self.func.new_value(ty, ValueDef::Undef)
    }

    fn zero_value(&mut self, ty: TypeId) -> ValueId {
        let value = if self.cx.types.is_nillable(ty) {
            Constant::Nil
        } else {
            Constant::Zero
        };
        self.func.constant(value, ty)
    }

    fn type_of(&self, e: &Expr) -> TypeId {
        self.cx
            .info
            .type_of(e.id)
            .unwrap_or_else(|| self.cx.types.invalid())
    }

    /// Current values of the result slots, for a bare `return`.
    fn named_result_values(&mut self) -> Vec<ValueId> {
        let results = self.results.clone();
        let mut values = Vec::with_capacity(results.len());
        for (object, ty) in results {
            let value = match object {
                Some(object) => {
                    let block = self.block();
                    self.read_var(Var::Object(object), block)
                }
                None => self.zero_value(ty),
            };
            values.push(value);
        }
        values
    }
}

#[cfg(test)]
mod tests;
