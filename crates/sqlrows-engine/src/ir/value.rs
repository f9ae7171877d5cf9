//! SSA values

use std::fmt;

use super::block::BlockId;
use crate::parser::Symbol;
use crate::types::{FuncId, TypeId};

/// An SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Symbol),
    /// Reference to a declared function
    Func(FuncId),
    /// Zero value of a variable declared without initializer
    Zero,
}

/// Where a value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDef {
    Param(usize),
    /// Result of the instruction at `index` in `block`
    Instr { block: BlockId, index: usize },
    Const(Constant),
    /// Read of a variable with no reaching definition
    Undef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub ty: TypeId,
    pub def: ValueDef,
}
