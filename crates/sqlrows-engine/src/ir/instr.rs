//! IR instructions

use super::block::BlockId;
use super::value::ValueId;
use crate::checker::{Builtin, ObjectId};
use crate::parser::ast::{BinaryOp, UnaryOp};
use crate::parser::{Span, Symbol};
use crate::types::FuncId;

/// What a call invokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// Package-level function
    Static(FuncId),
    /// Statically dispatched method; the receiver is in [`CallCommon::receiver`]
    Method(FuncId),
    /// Dynamically dispatched interface method
    Interface(Symbol),
    Builtin(Builtin),
    /// Call through a function value
    Dynamic(ValueId),
}

/// Shared by calls and deferred calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CallCommon {
    pub callee: Callee,
    pub receiver: Option<ValueId>,
    pub args: Vec<ValueId>,
}

impl CallCommon {
    /// Receiver followed by arguments.
    pub fn operands(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.receiver
            .iter()
            .copied()
            .chain(self.args.iter().copied())
            .chain(match self.callee {
                Callee::Dynamic(v) => Some(v),
                _ => None,
            })
    }

    /// Static target when the call is to a declared function or method.
    pub fn static_callee(&self) -> Option<FuncId> {
        match self.callee {
            Callee::Static(f) | Callee::Method(f) => Some(f),
            _ => None,
        }
    }

    fn map_operands(&mut self, f: &mut impl FnMut(ValueId) -> ValueId) {
        if let Some(r) = &mut self.receiver {
            *r = f(*r);
        }
        for a in &mut self.args {
            *a = f(*a);
        }
        if let Callee::Dynamic(v) = &mut self.callee {
            *v = f(*v);
        }
    }
}

/// Destination of a store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreTarget {
    Global(ObjectId),
    Field { base: ValueId, name: Symbol },
    /// `*p = v`
    Deref(ValueId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    Call(CallCommon),
    Defer(CallCommon),
    /// Component `index` of a multi-valued call result
    Extract { tuple: ValueId, index: usize },
    /// One incoming value per predecessor edge
    Phi { edges: Vec<(BlockId, ValueId)> },
    UnOp { op: UnaryOp, operand: ValueId },
    BinOp { op: BinaryOp, lhs: ValueId, rhs: ValueId },
    /// Struct field read
    Field { base: ValueId, name: Symbol },
    /// Load of a package-level variable
    Global(ObjectId),
    Store { target: StoreTarget, value: ValueId },
    /// Type conversion `T(x)`
    Convert(ValueId),
}

/// A single IR instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub dest: Option<ValueId>,
    pub kind: InstrKind,
    pub span: Span,
}

impl Instruction {
    pub fn is_phi(&self) -> bool {
        matches!(self.kind, InstrKind::Phi { .. })
    }

    /// Values this instruction reads, in evaluation order.
    pub fn operands(&self) -> Vec<ValueId> {
        match &self.kind {
            InstrKind::Call(call) | InstrKind::Defer(call) => call.operands().collect(),
            InstrKind::Extract { tuple, .. } => vec![*tuple],
            InstrKind::Phi { edges } => edges.iter().map(|(_, v)| *v).collect(),
            InstrKind::UnOp { operand, .. } => vec![*operand],
            InstrKind::BinOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstrKind::Field { base, .. } => vec![*base],
            InstrKind::Global(_) => vec![],
            InstrKind::Store { target, value } => match target {
                StoreTarget::Global(_) => vec![*value],
                StoreTarget::Field { base, .. } => vec![*base, *value],
                StoreTarget::Deref(ptr) => vec![*ptr, *value],
            },
            InstrKind::Convert(v) => vec![*v],
        }
    }

    pub(crate) fn map_operands(&mut self, f: &mut impl FnMut(ValueId) -> ValueId) {
        match &mut self.kind {
            InstrKind::Call(call) | InstrKind::Defer(call) => call.map_operands(f),
            InstrKind::Extract { tuple, .. } => *tuple = f(*tuple),
            InstrKind::Phi { edges } => {
                for (_, v) in edges {
                    *v = f(*v);
                }
            }
            InstrKind::UnOp { operand, .. } => *operand = f(*operand),
            InstrKind::BinOp { lhs, rhs, .. } => {
                *lhs = f(*lhs);
                *rhs = f(*rhs);
            }
            InstrKind::Field { base, .. } => *base = f(*base),
            InstrKind::Global(_) => {}
            InstrKind::Store { target, value } => {
                match target {
                    StoreTarget::Global(_) => {}
                    StoreTarget::Field { base, .. } => *base = f(*base),
                    StoreTarget::Deref(ptr) => *ptr = f(*ptr),
                }
                *value = f(*value);
            }
            InstrKind::Convert(v) => *v = f(*v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_operands_include_receiver_first() {
        let call = CallCommon {
            callee: Callee::Interface(crate::parser::Interner::new().intern("Close")),
            receiver: Some(ValueId(4)),
            args: vec![ValueId(1), ValueId(2)],
        };
        assert_eq!(call.operands().collect::<Vec<_>>(), vec![ValueId(4), ValueId(1), ValueId(2)]);
        assert_eq!(call.static_callee(), None);
    }

    #[test]
    fn test_store_operands() {
        let store = Instruction {
            dest: None,
            kind: InstrKind::Store {
                target: StoreTarget::Deref(ValueId(0)),
                value: ValueId(1),
            },
            span: Span::default(),
        };
        assert_eq!(store.operands(), vec![ValueId(0), ValueId(1)]);
        assert!(!store.is_phi());
    }
}
