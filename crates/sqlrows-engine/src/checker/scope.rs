//! Lexical block scopes for function bodies.

use rustc_hash::FxHashMap;

use super::objects::ObjectId;
use crate::parser::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Block,
    Loop,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub symbols: FxHashMap<Symbol, ObjectId>,
}

/// Stack of block scopes, innermost last. Package, file and universe
/// scopes sit outside the stack and are consulted by the checker.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            symbols: FxHashMap::default(),
        });
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Bind `name` in the innermost scope, returning the previous binding
    /// in that same scope.
    pub fn define(&mut self, name: Symbol, object: ObjectId) -> Option<ObjectId> {
        self.scopes
            .last_mut()
            .and_then(|scope| scope.symbols.insert(name, object))
    }

    pub fn lookup(&self, name: Symbol) -> Option<ObjectId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(&name).copied())
    }

    pub fn lookup_innermost(&self, name: Symbol) -> Option<ObjectId> {
        self.scopes.last().and_then(|scope| scope.symbols.get(&name).copied())
    }

    pub fn in_loop(&self) -> bool {
        self.scopes
            .iter()
            .rev()
            .take_while(|s| s.kind != ScopeKind::Function)
            .any(|s| s.kind == ScopeKind::Loop)
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Interner;

    #[test]
    fn test_shadowing_and_innermost() {
        let mut interner = Interner::new();
        let rows = interner.intern("rows");
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Function);
        scopes.define(rows, ObjectId(1));
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.lookup(rows), Some(ObjectId(1)));
        assert_eq!(scopes.lookup_innermost(rows), None);
        scopes.define(rows, ObjectId(2));
        assert_eq!(scopes.lookup(rows), Some(ObjectId(2)));
        scopes.pop();
        assert_eq!(scopes.lookup(rows), Some(ObjectId(1)));
    }

    #[test]
    fn test_loop_detection_stops_at_function() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Function);
        assert!(!scopes.in_loop());
        scopes.push(ScopeKind::Loop);
        scopes.push(ScopeKind::Block);
        assert!(scopes.in_loop());
    }
}
