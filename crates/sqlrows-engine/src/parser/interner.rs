//! String interning for identifiers and string literals.
//!
//! One interner is shared by every file of a program so that symbols
//! compare equal across packages.

use rustc_hash::FxHashMap;

/// An interned string (32-bit index into the interner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Deduplicating string table.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    map: FxHashMap<String, Symbol>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing symbol when already present.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    /// # Panics
    ///
    /// Panics if the symbol did not come from this interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index()]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut interner = Interner::new();
        let rows = interner.intern("rows");
        let err = interner.intern("err");
        assert_eq!(interner.intern("rows"), rows);
        assert_ne!(rows, err);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(err), "err");
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut interner = Interner::new();
        assert_eq!(interner.get("Rows"), None);
        let sym = interner.intern("Rows");
        assert_eq!(interner.get("Rows"), Some(sym));
        assert_eq!(interner.len(), 1);
    }
}
