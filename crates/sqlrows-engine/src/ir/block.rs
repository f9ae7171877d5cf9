//! Basic blocks and control flow

use std::fmt;

use super::instr::Instruction;
use super::value::ValueId;

/// Basic block identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// A basic block: straight-line instructions ending in a terminator.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    /// Debug label ("if.then", "for.body", ...)
    pub comment: Option<&'static str>,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
    pub preds: Vec<BlockId>,
}

impl BasicBlock {
    pub fn new(id: BlockId, comment: Option<&'static str>) -> Self {
        Self {
            id,
            comment,
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
            preds: Vec::new(),
        }
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator.successors()
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator, Terminator::Unreachable)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// How a block exits.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Jump(BlockId),
    /// Two-way branch on a boolean value
    If {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Normal function exit (deferred calls run here)
    Return(Vec<ValueId>),
    /// Abnormal exit through the `panic` builtin
    Panic(ValueId),
    /// No successor; placeholder for blocks still being built
    Unreachable,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::If {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Panic(_) | Terminator::Unreachable => vec![],
        }
    }

    /// Values the terminator reads.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Terminator::If { cond, .. } => vec![*cond],
            Terminator::Return(values) => values.clone(),
            Terminator::Panic(value) => vec![*value],
            Terminator::Jump(_) | Terminator::Unreachable => vec![],
        }
    }

    pub(crate) fn map_operands(&mut self, f: &mut impl FnMut(ValueId) -> ValueId) {
        match self {
            Terminator::If { cond, .. } => *cond = f(*cond),
            Terminator::Return(values) => {
                for v in values {
                    *v = f(*v);
                }
            }
            Terminator::Panic(value) => *value = f(*value),
            Terminator::Jump(_) | Terminator::Unreachable => {}
        }
    }

    pub(crate) fn map_blocks(&mut self, f: &impl Fn(BlockId) -> BlockId) {
        match self {
            Terminator::Jump(target) => *target = f(*target),
            Terminator::If {
                then_block,
                else_block,
                ..
            } => {
                *then_block = f(*then_block);
                *else_block = f(*else_block);
            }
            Terminator::Return(_) | Terminator::Panic(_) | Terminator::Unreachable => {}
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Jump(target) => write!(f, "jump {}", target),
            Terminator::If {
                cond,
                then_block,
                else_block,
            } => write!(f, "if {} goto {} else {}", cond, then_block, else_block),
            Terminator::Return(values) if values.is_empty() => write!(f, "return"),
            Terminator::Return(values) => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "return {}", values.join(", "))
            }
            Terminator::Panic(value) => write!(f, "panic {}", value),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminator_successors() {
        let t = Terminator::If {
            cond: ValueId(0),
            then_block: BlockId(1),
            else_block: BlockId(2),
        };
        assert_eq!(t.successors(), vec![BlockId(1), BlockId(2)]);
        assert!(Terminator::Return(vec![]).successors().is_empty());
        assert!(Terminator::Panic(ValueId(3)).successors().is_empty());
        assert_eq!(t.to_string(), "if v0 goto b1 else b2");
    }

    #[test]
    fn test_map_blocks_rewrites_targets() {
        let mut t = Terminator::If {
            cond: ValueId(0),
            then_block: BlockId(4),
            else_block: BlockId(7),
        };
        t.map_blocks(&|b| BlockId(b.0 - 3));
        assert_eq!(t.successors(), vec![BlockId(1), BlockId(4)]);
    }
}
