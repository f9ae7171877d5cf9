//! SSA intermediate representation.
//!
//! One [`Function`] per function body: an arena of basic blocks indexed by
//! [`BlockId`] and an arena of SSA values indexed by [`ValueId`]. Blocks
//! record their predecessors, phi nodes sit at the start of their block,
//! and every value knows the instruction (or parameter or constant) that
//! defines it.

pub mod block;
pub mod function;
pub mod instr;
pub mod pretty;
pub mod value;

pub use block::{BasicBlock, BlockId, Terminator};
pub use function::Function;
pub use instr::{CallCommon, Callee, InstrKind, Instruction, StoreTarget};
pub use pretty::{PrettyPrint, PrintContext};
pub use value::{Constant, ValueData, ValueDef, ValueId};
