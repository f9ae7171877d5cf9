//! Type context: interning, declared types and functions, method lookup.

use super::ty::*;
use crate::parser::interner::{Interner, Symbol};
use crate::parser::token::Span;
use rustc_hash::FxHashMap;

/// Result of looking a method up in a type's method set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodLookup {
    pub func: FuncId,
    /// The receiver expression is a pointer to the named type.
    pub through_pointer: bool,
}

/// Owns every type, named type and function object of a program.
///
/// Identical structural types share one [`TypeId`]; named types are
/// nominal, so two declarations of `Rows` in different packages are
/// different types.
#[derive(Debug, Clone)]
pub struct TypeContext {
    types: Vec<Type>,
    type_to_id: FxHashMap<Type, TypeId>,
    named: Vec<NamedType>,
    funcs: Vec<FuncObj>,

    invalid: TypeId,
    untyped_nil: TypeId,
    error: TypeId,
    any: TypeId,
    empty_tuple: TypeId,
    basics: FxHashMap<BasicKind, TypeId>,
}

impl TypeContext {
    pub fn new(interner: &mut Interner) -> Self {
        let mut ctx = TypeContext {
            types: Vec::new(),
            type_to_id: FxHashMap::default(),
            named: Vec::new(),
            funcs: Vec::new(),
            invalid: TypeId(0),
            untyped_nil: TypeId(0),
            error: TypeId(0),
            any: TypeId(0),
            empty_tuple: TypeId(0),
            basics: FxHashMap::default(),
        };
        ctx.invalid = ctx.intern(Type::Invalid);
        ctx.untyped_nil = ctx.intern(Type::UntypedNil);
        for kind in [
            BasicKind::Bool,
            BasicKind::Int,
            BasicKind::Int64,
            BasicKind::Float64,
            BasicKind::String,
            BasicKind::Byte,
            BasicKind::UntypedBool,
            BasicKind::UntypedInt,
            BasicKind::UntypedFloat,
            BasicKind::UntypedString,
        ] {
            let id = ctx.intern(Type::Basic(kind));
            ctx.basics.insert(kind, id);
        }
        ctx.any = ctx.intern(Type::Interface(Vec::new()));
        ctx.empty_tuple = ctx.intern(Type::Tuple(Vec::new()));

        // type error interface { Error() string }
        let string = ctx.basic(BasicKind::String);
        let error_sig = ctx.signature(Vec::new(), vec![string], false);
        let iface = ctx.intern(Type::Interface(vec![(interner.intern("Error"), error_sig)]));
        let (_, error) = ctx.declare_named(interner.intern("error"), None, None);
        ctx.set_underlying(error, iface);
        ctx.error = error;
        ctx
    }

    /// Intern a type, returning the existing id for an identical one.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_to_id.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.type_to_id.insert(ty, id);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this context.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Look up a type's id without interning it.
    pub fn lookup(&self, ty: &Type) -> Option<TypeId> {
        self.type_to_id.get(ty).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ------------------------------------------------------------------
    // Well-known types
    // ------------------------------------------------------------------

    pub fn invalid(&self) -> TypeId {
        self.invalid
    }

    pub fn untyped_nil(&self) -> TypeId {
        self.untyped_nil
    }

    /// The universe `error` type.
    pub fn error_type(&self) -> TypeId {
        self.error
    }

    /// The empty interface (`any`, `interface{}`).
    pub fn any_type(&self) -> TypeId {
        self.any
    }

    pub fn empty_tuple(&self) -> TypeId {
        self.empty_tuple
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics[&kind]
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Pointer(elem))
    }

    pub fn slice_of(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Slice(elem))
    }

    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(elems))
    }

    pub fn signature(&mut self, params: Vec<TypeId>, results: Vec<TypeId>, variadic: bool) -> TypeId {
        self.intern(Type::Signature(Signature {
            params,
            results,
            variadic,
        }))
    }

    /// Declare a named type. Its underlying type starts out invalid and is
    /// filled in by [`set_underlying`](Self::set_underlying) once resolved,
    /// which lets declarations refer to each other.
    pub fn declare_named(
        &mut self,
        name: Symbol,
        package: Option<Symbol>,
        span: Option<Span>,
    ) -> (NamedId, TypeId) {
        let id = NamedId(self.named.len() as u32);
        self.named.push(NamedType {
            name,
            package,
            underlying: self.invalid,
            methods: FxHashMap::default(),
            span,
        });
        (id, self.intern(Type::Named(id)))
    }

    pub fn set_underlying(&mut self, named_ty: TypeId, underlying: TypeId) {
        if let Type::Named(id) = *self.get(named_ty) {
            // Underlying of a named type is never itself named.
            let resolved = self.underlying(underlying);
            self.named[id.0 as usize].underlying = resolved;
        }
    }

    pub fn named(&self, id: NamedId) -> &NamedType {
        &self.named[id.0 as usize]
    }

    pub fn add_func(&mut self, func: FuncObj) -> FuncId {
        let id = FuncId(self.funcs.len() as u32);
        if let Some(recv) = func.recv {
            self.named[recv.named.0 as usize]
                .methods
                .insert(func.name, id);
        }
        self.funcs.push(func);
        id
    }

    pub fn func(&self, id: FuncId) -> &FuncObj {
        &self.funcs[id.0 as usize]
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Underlying type: the declared structure of a named type, or the type
    /// itself.
    pub fn underlying(&self, ty: TypeId) -> TypeId {
        match self.get(ty) {
            Type::Named(id) => self.named(*id).underlying,
            _ => ty,
        }
    }

    pub fn as_signature(&self, ty: TypeId) -> Option<&Signature> {
        match self.get(self.underlying(ty)) {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn pointer_elem(&self, ty: TypeId) -> Option<TypeId> {
        match self.get(self.underlying(ty)) {
            Type::Pointer(elem) => Some(*elem),
            _ => None,
        }
    }

    pub fn tuple_elems(&self, ty: TypeId) -> Option<&[TypeId]> {
        match self.get(ty) {
            Type::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        matches!(self.get(self.underlying(ty)), Type::Interface(_))
    }

    pub fn is_invalid(&self, ty: TypeId) -> bool {
        ty == self.invalid
    }

    /// Whether values of `ty` may be compared with or assigned `nil`.
    pub fn is_nillable(&self, ty: TypeId) -> bool {
        matches!(
            self.get(self.underlying(ty)),
            Type::Pointer(_)
                | Type::Slice(_)
                | Type::Signature(_)
                | Type::Interface(_)
                | Type::UntypedNil
        )
    }

    /// Concrete method `name` of a named type `T` or of `*T`.
    pub fn lookup_method(&self, ty: TypeId, name: Symbol) -> Option<MethodLookup> {
        let (named, through_pointer) = match self.get(ty) {
            Type::Named(id) => (*id, false),
            Type::Pointer(elem) => match self.get(*elem) {
                Type::Named(id) => (*id, true),
                _ => return None,
            },
            _ => return None,
        };
        self.named(named)
            .methods
            .get(&name)
            .map(|&func| MethodLookup {
                func,
                through_pointer,
            })
    }

    /// Signature of method `name` of an interface type.
    pub fn interface_method(&self, ty: TypeId, name: Symbol) -> Option<TypeId> {
        match self.get(self.underlying(ty)) {
            Type::Interface(methods) => methods
                .iter()
                .find(|(method, _)| *method == name)
                .map(|(_, sig)| *sig),
            _ => None,
        }
    }

    /// Field `name` of a struct or pointer to struct.
    pub fn field(&self, ty: TypeId, name: Symbol) -> Option<TypeId> {
        let base = self.pointer_elem(ty).unwrap_or(ty);
        match self.get(self.underlying(base)) {
            Type::Struct(fields) => fields.iter().find(|f| f.name == name).map(|f| f.ty),
            _ => None,
        }
    }

    /// Convert an untyped constant type to its default type.
    pub fn default_type(&self, ty: TypeId) -> TypeId {
        match *self.get(ty) {
            Type::Basic(kind) if kind.is_untyped() => self.basic(kind.default_kind()),
            _ => ty,
        }
    }

    /// Human readable type string, e.g. `*sql.Rows`.
    pub fn display(&self, ty: TypeId, interner: &Interner) -> String {
        match self.get(ty) {
            Type::Invalid => "invalid type".to_string(),
            Type::Basic(kind) => kind.name().to_string(),
            Type::UntypedNil => "untyped nil".to_string(),
            Type::Named(id) => {
                let named = self.named(*id);
                let name = interner.resolve(named.name);
                match named.package {
                    Some(pkg) => {
                        let path = interner.resolve(pkg);
                        let short = path.rsplit('/').next().unwrap_or(path);
                        format!("{}.{}", short, name)
                    }
                    None => name.to_string(),
                }
            }
            Type::Pointer(elem) => format!("*{}", self.display(*elem, interner)),
            Type::Slice(elem) => format!("[]{}", self.display(*elem, interner)),
            Type::Tuple(elems) => format!("({})", self.display_list(elems, interner)),
            Type::Signature(sig) => {
                let mut params: Vec<String> =
                    sig.params.iter().map(|p| self.display(*p, interner)).collect();
                if sig.variadic {
                    if let Some(last) = params.last_mut() {
                        *last = format!("...{}", last.trim_start_matches("[]"));
                    }
                }
                let results = match sig.results.len() {
                    0 => String::new(),
                    1 => format!(" {}", self.display(sig.results[0], interner)),
                    _ => format!(" ({})", self.display_list(&sig.results, interner)),
                };
                format!("func({}){}", params.join(", "), results)
            }
            Type::Struct(fields) if fields.is_empty() => "struct{}".to_string(),
            Type::Struct(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} {}", interner.resolve(f.name), self.display(f.ty, interner)))
                    .collect();
                format!("struct{{{}}}", parts.join("; "))
            }
            Type::Interface(methods) if methods.is_empty() => "interface{}".to_string(),
            Type::Interface(methods) => {
                let parts: Vec<String> = methods
                    .iter()
                    .map(|(name, sig)| {
                        let sig = self.display(*sig, interner);
                        format!("{}{}", interner.resolve(*name), sig.trim_start_matches("func"))
                    })
                    .collect();
                format!("interface{{{}}}", parts.join("; "))
            }
        }
    }

    fn display_list(&self, elems: &[TypeId], interner: &Interner) -> String {
        elems
            .iter()
            .map(|e| self.display(*e, interner))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::FileId;

    fn span() -> Span {
        Span::new(FileId(0), 0, 1, 1, 1)
    }

    #[test]
    fn test_structural_types_interned_once() {
        let mut interner = Interner::new();
        let mut ctx = TypeContext::new(&mut interner);
        let int = ctx.basic(BasicKind::Int);
        let a = ctx.pointer_to(int);
        let b = ctx.pointer_to(int);
        assert_eq!(a, b);
        assert_eq!(ctx.lookup(&Type::Pointer(int)), Some(a));
        assert_eq!(ctx.lookup(&Type::Slice(a)), None);
    }

    #[test]
    fn test_named_types_are_nominal() {
        let mut interner = Interner::new();
        let mut ctx = TypeContext::new(&mut interner);
        let rows = interner.intern("Rows");
        let sql = interner.intern("database/sql");
        let other = interner.intern("example.com/fake");
        let (_, a) = ctx.declare_named(rows, Some(sql), Some(span()));
        let (_, b) = ctx.declare_named(rows, Some(other), Some(span()));
        assert_ne!(a, b);
        let empty = ctx.intern(Type::Struct(Vec::new()));
        ctx.set_underlying(a, empty);
        assert_eq!(ctx.underlying(a), empty);
        let ptr = ctx.pointer_to(a);
        assert_eq!(ctx.display(ptr, &interner), "*sql.Rows");
    }

    #[test]
    fn test_method_lookup_through_pointer() {
        let mut interner = Interner::new();
        let mut ctx = TypeContext::new(&mut interner);
        let pkg = interner.intern("database/sql");
        let close = interner.intern("Close");
        let (named, rows) = ctx.declare_named(interner.intern("Rows"), Some(pkg), None);
        let error = ctx.error_type();
        let sig = ctx.signature(vec![], vec![error], false);
        let func = ctx.add_func(FuncObj {
            name: close,
            package: pkg,
            recv: Some(MethodRecv {
                named,
                pointer: true,
            }),
            sig,
            span: span(),
            has_body: false,
        });
        let ptr = ctx.pointer_to(rows);
        assert_eq!(
            ctx.lookup_method(ptr, close),
            Some(MethodLookup {
                func,
                through_pointer: true
            })
        );
        assert_eq!(ctx.lookup_method(rows, close).map(|m| m.func), Some(func));
        assert_eq!(ctx.lookup_method(error, close), None);
    }

    #[test]
    fn test_error_is_interface_with_error_method() {
        let mut interner = Interner::new();
        let ctx = TypeContext::new(&mut interner);
        let error = ctx.error_type();
        assert!(ctx.is_interface(error));
        assert!(ctx.is_nillable(error));
        let method = interner.get("Error").unwrap();
        let sig = ctx.interface_method(error, method).unwrap();
        assert_eq!(ctx.display(sig, &interner), "func() string");
        assert_eq!(ctx.display(error, &interner), "error");
    }
}
