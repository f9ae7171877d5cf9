//! Per-package results of type checking.

use rustc_hash::FxHashMap;

use super::objects::ObjectId;
use crate::parser::{NodeId, Symbol};
use crate::types::{FuncId, TypeId};

/// What a selector expression `x.f` denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// `pkg.Name`
    PackageMember(ObjectId),
    Field,
    /// Concrete method; `through_pointer` when `x` is a pointer
    Method { func: FuncId, through_pointer: bool },
    InterfaceMethod { name: Symbol },
}

/// Type information recorded while checking one package.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    /// Type of every checked expression
    pub types: FxHashMap<NodeId, TypeId>,
    /// Declaring identifiers
    pub defs: FxHashMap<NodeId, ObjectId>,
    /// Identifier uses (including selector fields naming package members)
    pub uses: FxHashMap<NodeId, ObjectId>,
    pub selections: FxHashMap<NodeId, Selection>,
    /// Function object for each function declaration, keyed by the id of
    /// the declaration's name
    pub funcs: FxHashMap<NodeId, FuncId>,
    /// Directly imported paths, in first-seen order
    pub imports: Vec<Symbol>,
}

impl TypeInfo {
    pub fn type_of(&self, id: NodeId) -> Option<TypeId> {
        self.types.get(&id).copied()
    }

    /// Object an identifier declares or refers to.
    pub fn object_of(&self, id: NodeId) -> Option<ObjectId> {
        self.defs
            .get(&id)
            .or_else(|| self.uses.get(&id))
            .copied()
    }

    pub fn selection(&self, id: NodeId) -> Option<Selection> {
        self.selections.get(&id).copied()
    }

    pub fn imports_path(&self, path: Symbol) -> bool {
        self.imports.contains(&path)
    }
}
