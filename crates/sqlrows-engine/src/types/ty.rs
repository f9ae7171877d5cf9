//! Type definitions

use crate::parser::interner::Symbol;
use crate::parser::token::Span;
use rustc_hash::FxHashMap;

/// Interned type handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Handle of a declared (named) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedId(pub u32);

/// Handle of a declared function or method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int64,
    Float64,
    String,
    Byte,
    UntypedBool,
    UntypedInt,
    UntypedFloat,
    UntypedString,
}

impl BasicKind {
    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedFloat
                | BasicKind::UntypedString
        )
    }

    /// Type an untyped constant takes when nothing else constrains it.
    pub fn default_kind(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int64 => "int64",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
            BasicKind::Byte => "byte",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Symbol,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    /// Final parameter is `...T`; its recorded type is `[]T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Result of an expression that failed to check
    Invalid,
    Basic(BasicKind),
    UntypedNil,
    Named(NamedId),
    Pointer(TypeId),
    Slice(TypeId),
    /// Multiple results of a call
    Tuple(Vec<TypeId>),
    Signature(Signature),
    Struct(Vec<Field>),
    /// Method names with their signatures, sorted by name
    Interface(Vec<(Symbol, TypeId)>),
}

/// A declared type: `type Name underlying`.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: Symbol,
    /// Import path of the declaring package; `None` for universe types.
    pub package: Option<Symbol>,
    pub underlying: TypeId,
    pub methods: FxHashMap<Symbol, FuncId>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRecv {
    pub named: NamedId,
    pub pointer: bool,
}

/// A declared function or method.
#[derive(Debug, Clone)]
pub struct FuncObj {
    pub name: Symbol,
    pub package: Symbol,
    pub recv: Option<MethodRecv>,
    /// Always a `Type::Signature`
    pub sig: TypeId,
    pub span: Span,
    pub has_body: bool,
}
