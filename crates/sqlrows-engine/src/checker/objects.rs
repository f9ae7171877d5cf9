//! Declared objects: variables, functions, type names, imported packages
//! and universe entities.

use rustc_hash::FxHashMap;

use crate::parser::{Interner, Span, Symbol};
use crate::types::{BasicKind, FuncId, TypeContext, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Panic,
    Len,
    Print,
    Println,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Local variable, parameter or named result
    Local,
    /// Package-level variable
    Global,
    Func(FuncId),
    TypeName,
    /// Import binding; carries the imported path
    PkgName(Symbol),
    Builtin(Builtin),
    Nil,
    /// `true` / `false`
    Const(bool),
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: Symbol,
    pub kind: ObjectKind,
    pub ty: TypeId,
    /// Declaring package path; `None` for the universe.
    pub package: Option<Symbol>,
    pub span: Option<Span>,
}

impl Object {
    pub fn is_var(&self) -> bool {
        matches!(self.kind, ObjectKind::Local | ObjectKind::Global)
    }
}

/// Program-wide object arena plus the universe scope.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    objects: Vec<Object>,
    universe: FxHashMap<Symbol, ObjectId>,
}

impl ObjectTable {
    pub fn new(types: &TypeContext, interner: &mut Interner) -> Self {
        let mut table = ObjectTable {
            objects: Vec::new(),
            universe: FxHashMap::default(),
        };
        let basics = [
            ("bool", types.basic(BasicKind::Bool)),
            ("int", types.basic(BasicKind::Int)),
            ("int64", types.basic(BasicKind::Int64)),
            ("float64", types.basic(BasicKind::Float64)),
            ("string", types.basic(BasicKind::String)),
            ("byte", types.basic(BasicKind::Byte)),
            ("error", types.error_type()),
            ("any", types.any_type()),
        ];
        for (name, ty) in basics {
            table.declare_universe(interner.intern(name), ObjectKind::TypeName, ty);
        }
        let untyped_bool = types.basic(BasicKind::UntypedBool);
        table.declare_universe(interner.intern("true"), ObjectKind::Const(true), untyped_bool);
        table.declare_universe(interner.intern("false"), ObjectKind::Const(false), untyped_bool);
        table.declare_universe(interner.intern("nil"), ObjectKind::Nil, types.untyped_nil());
        for (name, builtin) in [
            ("panic", Builtin::Panic),
            ("len", Builtin::Len),
            ("print", Builtin::Print),
            ("println", Builtin::Println),
        ] {
            table.declare_universe(interner.intern(name), ObjectKind::Builtin(builtin), types.invalid());
        }
        table
    }

    fn declare_universe(&mut self, name: Symbol, kind: ObjectKind, ty: TypeId) {
        let id = self.add(Object {
            name,
            kind,
            ty,
            package: None,
            span: None,
        });
        self.universe.insert(name, id);
    }

    pub fn add(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this table.
    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.0 as usize]
    }

    pub fn universe(&self, name: Symbol) -> Option<ObjectId> {
        self.universe.get(&name).copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Exported view of a checked package, used by its importers.
#[derive(Debug, Clone)]
pub struct PackageScope {
    pub path: Symbol,
    /// Name from the package clause
    pub name: Symbol,
    pub members: FxHashMap<Symbol, ObjectId>,
}

impl PackageScope {
    pub fn new(path: Symbol, name: Symbol) -> Self {
        Self {
            path,
            name,
            members: FxHashMap::default(),
        }
    }

    pub fn lookup(&self, name: Symbol) -> Option<ObjectId> {
        self.members.get(&name).copied()
    }
}

/// Go's export rule: the name starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
