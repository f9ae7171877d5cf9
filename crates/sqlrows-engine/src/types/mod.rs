//! Program-wide type representation.
//!
//! Types are interned in a single [`TypeContext`] shared by all packages of
//! a program, so type identity is plain `TypeId` equality.

pub mod context;
pub mod ty;

pub use context::{MethodLookup, TypeContext};
pub use ty::{BasicKind, Field, FuncId, FuncObj, MethodRecv, NamedId, NamedType, Signature, Type, TypeId};
