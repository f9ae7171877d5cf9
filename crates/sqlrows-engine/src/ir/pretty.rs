//! Pretty-printing for IR
//!
//! Human-readable dump used by `sqlrows --dump-ir` and by tests.

use std::fmt::Write;

use super::block::BasicBlock;
use super::function::Function;
use super::instr::{CallCommon, Callee, InstrKind, Instruction, StoreTarget};
use super::value::{Constant, ValueDef, ValueId};
use crate::parser::Interner;
use crate::types::TypeContext;

/// Names needed to print symbols and types.
#[derive(Clone, Copy)]
pub struct PrintContext<'a> {
    pub interner: &'a Interner,
    pub types: &'a TypeContext,
}

pub trait PrettyPrint {
    fn pretty_print(&self, cx: PrintContext<'_>) -> String;
}

impl PrettyPrint for Function {
    fn pretty_print(&self, cx: PrintContext<'_>) -> String {
        let mut output = String::new();
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p, cx.types.display(self.value(*p).ty, cx.interner)))
            .collect();
        let _ = writeln!(output, "func {}({}):", self.name, params.join(", "));
        for block in self.blocks() {
            output.push_str(&block.pretty_print_in(self, cx));
        }
        output
    }
}

impl BasicBlock {
    fn pretty_print_in(&self, func: &Function, cx: PrintContext<'_>) -> String {
        let mut output = String::new();
        let _ = write!(output, "{}:", self.id);
        if let Some(comment) = self.comment {
            let _ = write!(output, " ; {}", comment);
        }
        if !self.preds.is_empty() {
            let preds: Vec<String> = self.preds.iter().map(|p| p.to_string()).collect();
            let _ = write!(output, " preds {}", preds.join(" "));
        }
        output.push('\n');
        for instr in &self.instructions {
            let _ = writeln!(output, "  {}", instr_text(instr, func, cx));
        }
        let _ = writeln!(output, "  {}", self.terminator);
        output
    }
}

fn operand(v: ValueId, func: &Function, cx: PrintContext<'_>) -> String {
    match &func.value(v).def {
        ValueDef::Const(c) => match c {
            Constant::Nil => "nil".to_string(),
            Constant::Bool(b) => b.to_string(),
            Constant::Int(n) => n.to_string(),
            Constant::Float(n) => n.to_string(),
            Constant::Str(s) => format!("{:?}", cx.interner.resolve(*s)),
            Constant::Func(f) => cx.interner.resolve(cx.types.func(*f).name).to_string(),
            Constant::Zero => format!("zero<{}>", cx.types.display(func.value(v).ty, cx.interner)),
        },
        ValueDef::Undef => "undef".to_string(),
        _ => v.to_string(),
    }
}

fn call_text(call: &CallCommon, func: &Function, cx: PrintContext<'_>) -> String {
    let callee = match &call.callee {
        Callee::Static(f) | Callee::Method(f) => cx.interner.resolve(cx.types.func(*f).name).to_string(),
        Callee::Interface(name) => format!("invoke {}", cx.interner.resolve(*name)),
        Callee::Builtin(b) => format!("{:?}", b).to_lowercase(),
        Callee::Dynamic(v) => operand(*v, func, cx),
    };
    let args: Vec<String> = call.args.iter().map(|a| operand(*a, func, cx)).collect();
    match call.receiver {
        Some(recv) => format!("{}.{}({})", operand(recv, func, cx), callee, args.join(", ")),
        None => format!("{}({})", callee, args.join(", ")),
    }
}

fn instr_text(instr: &Instruction, func: &Function, cx: PrintContext<'_>) -> String {
    let body = match &instr.kind {
        InstrKind::Call(call) => call_text(call, func, cx),
        InstrKind::Defer(call) => format!("defer {}", call_text(call, func, cx)),
        InstrKind::Extract { tuple, index } => format!("extract {} #{}", tuple, index),
        InstrKind::Phi { edges } => {
            let edges: Vec<String> = edges
                .iter()
                .map(|(b, v)| format!("{}: {}", b, operand(*v, func, cx)))
                .collect();
            format!("phi [{}]", edges.join(", "))
        }
        InstrKind::UnOp { op, operand: v } => format!("{:?} {}", op, operand(*v, func, cx)),
        InstrKind::BinOp { op, lhs, rhs } => format!(
            "{} {} {}",
            operand(*lhs, func, cx),
            op.as_str(),
            operand(*rhs, func, cx)
        ),
        InstrKind::Field { base, name } => format!("{}.{}", operand(*base, func, cx), cx.interner.resolve(*name)),
        InstrKind::Global(obj) => format!("global #{}", obj.0),
        InstrKind::Store { target, value } => {
            let target = match target {
                StoreTarget::Global(obj) => format!("global #{}", obj.0),
                StoreTarget::Field { base, name } => {
                    format!("{}.{}", operand(*base, func, cx), cx.interner.resolve(*name))
                }
                StoreTarget::Deref(ptr) => format!("*{}", operand(*ptr, func, cx)),
            };
            format!("store {} = {}", target, operand(*value, func, cx))
        }
        InstrKind::Convert(v) => format!("convert {}", operand(*v, func, cx)),
    };
    match instr.dest {
        Some(dest) => format!(
            "{} = {} : {}",
            dest,
            body,
            cx.types.display(func.value(dest).ty, cx.interner)
        ),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Terminator;
    use crate::parser::Span;
    use crate::types::BasicKind;

    #[test]
    fn test_pretty_print_function() {
        let mut interner = Interner::new();
        let types = TypeContext::new(&mut interner);
        let bool_ty = types.basic(BasicKind::Bool);
        let mut f = Function::new("check", None, Span::default());
        let entry = f.add_block(None);
        let exit = f.add_block(Some("if.done"));
        let p = f.add_param(bool_ty);
        f.terminate(entry, Terminator::If {
            cond: p,
            then_block: exit,
            else_block: exit,
        });
        let yes = f.constant(Constant::Bool(true), bool_ty);
        f.terminate(exit, Terminator::Return(vec![yes]));

        let text = f.pretty_print(PrintContext {
            interner: &interner,
            types: &types,
        });
        assert!(text.starts_with("func check(v0: bool):"));
        assert!(text.contains("b1: ; if.done preds b0 b0"));
        assert!(text.contains("if v0 goto b1 else b1"));
    }
}
