//! Package-level checking: imports, type and function declarations,
//! package variables, then function bodies.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::error::CheckError;
use super::info::TypeInfo;
use super::objects::{is_exported, Object, ObjectId, ObjectKind, ObjectTable, PackageScope};
use super::scope::{ScopeKind, ScopeStack};
use crate::parser::ast::*;
use crate::parser::{Interner, Symbol};
use crate::types::{FuncId, FuncObj, MethodRecv, Type, TypeContext, TypeId};

/// Everything the checker produces for one package.
#[derive(Debug, Clone)]
pub struct CheckedPackage {
    pub scope: PackageScope,
    pub info: TypeInfo,
    pub errors: Vec<CheckError>,
}

pub struct Checker<'a> {
    pub(super) path: Symbol,
    pub(super) interner: &'a Interner,
    pub(super) types: &'a mut TypeContext,
    pub(super) objects: &'a mut ObjectTable,
    /// Already checked packages, by import path
    pub(super) deps: &'a FxHashMap<Symbol, PackageScope>,
    pub(super) scope: PackageScope,
    pub(super) file_imports: Vec<FxHashMap<Symbol, ObjectId>>,
    pub(super) current_file: usize,
    pub(super) scopes: ScopeStack,
    pub(super) info: TypeInfo,
    pub(super) errors: Vec<CheckError>,
    /// Result types of the function being checked
    pub(super) results: Vec<TypeId>,
    pub(super) named_results: bool,
    pub(super) blank: Option<Symbol>,
}

impl<'a> Checker<'a> {
    pub fn new(
        path: Symbol,
        interner: &'a Interner,
        types: &'a mut TypeContext,
        objects: &'a mut ObjectTable,
        deps: &'a FxHashMap<Symbol, PackageScope>,
    ) -> Self {
        Self {
            path,
            interner,
            types,
            objects,
            deps,
            scope: PackageScope::new(path, path),
            file_imports: Vec::new(),
            current_file: 0,
            scopes: ScopeStack::new(),
            info: TypeInfo::default(),
            errors: Vec::new(),
            results: Vec::new(),
            named_results: false,
            blank: interner.get("_"),
        }
    }

    /// Check all files of a package. Files must share one package clause;
    /// the loader guarantees it.
    pub fn check(mut self, files: &[File]) -> CheckedPackage {
        if let Some(first) = files.first() {
            self.scope.name = first.package.name;
        }

        for file in files {
            let imports = self.collect_imports(file);
            self.file_imports.push(imports);
        }

        let named = self.collect_types(files);
        self.resolve_underlying(&named);
        let funcs = self.collect_funcs(files);

        for (index, file) in files.iter().enumerate() {
            self.current_file = index;
            for decl in &file.decls {
                if let Decl::Var(var) = decl {
                    self.check_var_decl(var, true);
                }
            }
        }

        for (file_index, decl, func) in funcs {
            self.current_file = file_index;
            self.check_func_body(decl, func);
        }

        trace!(
            package = self.interner.resolve(self.path),
            errors = self.errors.len(),
            "checked package"
        );
        CheckedPackage {
            scope: self.scope,
            info: self.info,
            errors: self.errors,
        }
    }

    fn collect_imports(&mut self, file: &File) -> FxHashMap<Symbol, ObjectId> {
        let mut bindings = FxHashMap::default();
        for spec in &file.imports {
            if !self.info.imports.contains(&spec.path) {
                self.info.imports.push(spec.path);
            }
            let dep = self.deps.get(&spec.path);
            if dep.is_none() {
                self.errors.push(CheckError::UnknownImport {
                    path: self.interner.resolve(spec.path).to_string(),
                    span: spec.path_span,
                });
            }
            let local = match (&spec.name, dep) {
                (Some(name), _) => Some(name.name),
                (None, Some(dep)) => Some(dep.name),
                (None, None) => {
                    let path = self.interner.resolve(spec.path);
                    self.interner.get(path.rsplit('/').next().unwrap_or(path))
                }
            };
            let Some(local) = local else { continue };
            if Some(local) == self.blank {
                continue;
            }
            let object = self.objects.add(Object {
                name: local,
                kind: ObjectKind::PkgName(spec.path),
                ty: self.types.invalid(),
                package: Some(self.path),
                span: Some(spec.span),
            });
            if let Some(name) = &spec.name {
                self.info.defs.insert(name.id, object);
            }
            if bindings.insert(local, object).is_some() {
                self.errors.push(CheckError::Redeclared {
                    name: self.interner.resolve(local).to_string(),
                    span: spec.span,
                });
            }
        }
        bindings
    }

    fn collect_types<'f>(&mut self, files: &'f [File]) -> Vec<(usize, &'f TypeDecl, TypeId)> {
        let mut named = Vec::new();
        for (index, file) in files.iter().enumerate() {
            for decl in &file.decls {
                let Decl::Type(td) = decl else { continue };
                let (_, ty) = self
                    .types
                    .declare_named(td.name.name, Some(self.path), Some(td.name.span));
                let object = self.objects.add(Object {
                    name: td.name.name,
                    kind: ObjectKind::TypeName,
                    ty,
                    package: Some(self.path),
                    span: Some(td.name.span),
                });
                self.declare_package(td.name, object);
                named.push((index, td, ty));
            }
        }
        named
    }

    /// Resolve underlying types. `type A B` needs `B` resolved first, so
    /// unresolved declarations are retried until nothing changes.
    fn resolve_underlying(&mut self, named: &[(usize, &TypeDecl, TypeId)]) {
        let mut pending: Vec<_> = named.to_vec();
        let mut first_pass = true;
        loop {
            let before = pending.len();
            let mut still = Vec::new();
            for &(file, td, ty) in &pending {
                self.current_file = file;
                let underlying = if first_pass {
                    self.resolve_type(&td.ty)
                } else {
                    self.resolve_type_quiet(&td.ty)
                };
                self.types.set_underlying(ty, underlying);
                if self.types.is_invalid(self.types.underlying(ty))
                    && !self.types.is_invalid(underlying)
                {
                    still.push((file, td, ty));
                }
            }
            first_pass = false;
            if still.is_empty() || still.len() == before {
                for (_, td, _) in still {
                    self.errors.push(CheckError::RecursiveType {
                        name: self.interner.resolve(td.name.name).to_string(),
                        span: td.name.span,
                    });
                }
                return;
            }
            pending = still;
        }
    }

    fn collect_funcs<'f>(&mut self, files: &'f [File]) -> Vec<(usize, &'f FuncDecl, FuncId)> {
        let init = self.interner.get("init");
        let mut funcs = Vec::new();
        for (index, file) in files.iter().enumerate() {
            self.current_file = index;
            for fd in file.funcs() {
                let sig = self.resolve_signature(&fd.sig);
                let recv = match &fd.recv {
                    Some(r) => match self.method_receiver(r, fd.name) {
                        Some(recv) => Some(recv),
                        None => continue,
                    },
                    None => None,
                };
                let func = self.types.add_func(FuncObj {
                    name: fd.name.name,
                    package: self.path,
                    recv,
                    sig,
                    span: fd.name.span,
                    has_body: fd.body.is_some(),
                });
                self.info.funcs.insert(fd.name.id, func);
                if recv.is_none() && Some(fd.name.name) != init {
                    let object = self.objects.add(Object {
                        name: fd.name.name,
                        kind: ObjectKind::Func(func),
                        ty: sig,
                        package: Some(self.path),
                        span: Some(fd.name.span),
                    });
                    self.declare_package(fd.name, object);
                }
                funcs.push((index, fd, func));
            }
        }
        funcs
    }

    fn method_receiver(&mut self, recv: &Receiver, method: Ident) -> Option<MethodRecv> {
        let invalid = |this: &Self| CheckError::InvalidReceiver {
            name: this.interner.resolve(recv.type_name.name).to_string(),
            span: recv.type_name.span,
        };
        let Some(object) = self.scope.lookup(recv.type_name.name) else {
            let err = CheckError::Undefined {
                name: self.interner.resolve(recv.type_name.name).to_string(),
                span: recv.type_name.span,
            };
            self.errors.push(err);
            return None;
        };
        self.info.uses.insert(recv.type_name.id, object);
        let obj = self.objects.get(object);
        let named = match (obj.kind, self.types.get(obj.ty)) {
            (ObjectKind::TypeName, Type::Named(named)) => *named,
            _ => {
                let err = invalid(self);
                self.errors.push(err);
                return None;
            }
        };
        let underlying = self.types.named(named).underlying;
        if matches!(self.types.get(underlying), Type::Pointer(_) | Type::Interface(_)) {
            let err = invalid(self);
            self.errors.push(err);
            return None;
        }
        if self.types.named(named).methods.contains_key(&method.name) {
            self.errors.push(CheckError::Redeclared {
                name: format!(
                    "method {}.{}",
                    self.interner.resolve(recv.type_name.name),
                    self.interner.resolve(method.name)
                ),
                span: method.span,
            });
            return None;
        }
        Some(MethodRecv {
            named,
            pointer: recv.pointer,
        })
    }

    fn check_func_body(&mut self, decl: &FuncDecl, func: FuncId) {
        let Some(body) = &decl.body else { return };
        let sig = self.types.func(func).sig;
        let Some(signature) = self.types.as_signature(sig).cloned() else {
            return;
        };

        self.scopes.push(ScopeKind::Function);
        if let Some(recv) = &decl.recv {
            if let Some(name) = recv.name {
                let mut ty = self
                    .info
                    .uses
                    .get(&recv.type_name.id)
                    .map(|o| self.objects.get(*o).ty)
                    .unwrap_or_else(|| self.types.invalid());
                if recv.pointer {
                    ty = self.types.pointer_to(ty);
                }
                self.declare_local(name, ty);
            }
        }
        for (param, ty) in decl.sig.params.iter().zip(&signature.params) {
            if let Some(name) = param.name {
                self.declare_local(name, *ty);
            }
        }
        self.named_results = false;
        for (result, ty) in decl.sig.results.iter().zip(&signature.results) {
            if let Some(name) = result.name {
                self.named_results = true;
                self.declare_local(name, *ty);
            }
        }
        self.results = signature.results.clone();

        self.check_stmts(&body.stmts);
        self.scopes.pop();
    }

    // ------------------------------------------------------------------
    // Declarations and lookup
    // ------------------------------------------------------------------

    pub(super) fn is_blank(&self, name: Symbol) -> bool {
        Some(name) == self.blank
    }

    fn declare_package(&mut self, ident: Ident, object: ObjectId) {
        if self.is_blank(ident.name) {
            return;
        }
        self.info.defs.insert(ident.id, object);
        if self.scope.members.insert(ident.name, object).is_some() {
            self.errors.push(CheckError::Redeclared {
                name: self.interner.resolve(ident.name).to_string(),
                span: ident.span,
            });
        }
    }

    /// Declare a package variable. Package variables live in the package
    /// scope and are visible to every file.
    pub(super) fn declare_global(&mut self, ident: Ident, ty: TypeId) -> Option<ObjectId> {
        if self.is_blank(ident.name) {
            return None;
        }
        let object = self.objects.add(Object {
            name: ident.name,
            kind: ObjectKind::Global,
            ty,
            package: Some(self.path),
            span: Some(ident.span),
        });
        self.declare_package(ident, object);
        Some(object)
    }

    /// Declare a local in the innermost block scope.
    pub(super) fn declare_local(&mut self, ident: Ident, ty: TypeId) -> Option<ObjectId> {
        if self.is_blank(ident.name) {
            return None;
        }
        let object = self.objects.add(Object {
            name: ident.name,
            kind: ObjectKind::Local,
            ty,
            package: Some(self.path),
            span: Some(ident.span),
        });
        self.info.defs.insert(ident.id, object);
        if self.scopes.define(ident.name, object).is_some() {
            self.errors.push(CheckError::Redeclared {
                name: self.interner.resolve(ident.name).to_string(),
                span: ident.span,
            });
        }
        Some(object)
    }

    /// Resolve a name through block scopes, file imports, the package and
    /// the universe.
    pub(super) fn lookup(&self, name: Symbol) -> Option<ObjectId> {
        self.scopes
            .lookup(name)
            .or_else(|| {
                self.file_imports
                    .get(self.current_file)
                    .and_then(|imports| imports.get(&name).copied())
            })
            .or_else(|| self.scope.lookup(name))
            .or_else(|| self.objects.universe(name))
    }

    /// Member `name` of the package bound to `pkg`, enforcing the export
    /// rule. Errors are recorded; `None` means the selection is invalid.
    pub(super) fn package_member(&mut self, pkg_path: Symbol, name: Ident) -> Option<ObjectId> {
        let dep = self.deps.get(&pkg_path)?;
        let text = self.interner.resolve(name.name);
        match dep.lookup(name.name) {
            Some(member) if is_exported(text) => {
                self.info.uses.insert(name.id, member);
                Some(member)
            }
            Some(_) => {
                self.errors.push(CheckError::NotExported {
                    name: text.to_string(),
                    package: self.interner.resolve(dep.name).to_string(),
                    span: name.span,
                });
                None
            }
            None => {
                self.errors.push(CheckError::Undefined {
                    name: format!("{}.{}", self.interner.resolve(dep.name), text),
                    span: name.span,
                });
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    pub(super) fn resolve_type(&mut self, expr: &TypeExpr) -> TypeId {
        match expr {
            TypeExpr::Name(ident) => match self.lookup(ident.name) {
                Some(object) => {
                    self.info.uses.insert(ident.id, object);
                    let obj = self.objects.get(object);
                    if obj.kind == ObjectKind::TypeName {
                        obj.ty
                    } else {
                        self.errors.push(CheckError::NotAType {
                            name: self.interner.resolve(ident.name).to_string(),
                            span: ident.span,
                        });
                        self.types.invalid()
                    }
                }
                None => {
                    self.errors.push(CheckError::Undefined {
                        name: self.interner.resolve(ident.name).to_string(),
                        span: ident.span,
                    });
                    self.types.invalid()
                }
            },
            TypeExpr::Qualified { pkg, name, .. } => {
                let Some(path) = self.pkg_path_of(*pkg) else {
                    return self.types.invalid();
                };
                let Some(member) = self.package_member(path, *name) else {
                    return self.types.invalid();
                };
                let obj = self.objects.get(member);
                if obj.kind == ObjectKind::TypeName {
                    obj.ty
                } else {
                    self.errors.push(CheckError::NotAType {
                        name: self.interner.resolve(name.name).to_string(),
                        span: name.span,
                    });
                    self.types.invalid()
                }
            }
            TypeExpr::Pointer(elem, _) => {
                let elem = self.resolve_type(elem);
                self.types.pointer_to(elem)
            }
            TypeExpr::Slice(elem, _) => {
                let elem = self.resolve_type(elem);
                self.types.slice_of(elem)
            }
            TypeExpr::Struct(fields, _) => {
                let mut resolved = Vec::new();
                for field in fields {
                    let ty = self.resolve_type(&field.ty);
                    for name in &field.names {
                        resolved.push(crate::types::Field {
                            name: name.name,
                            ty,
                        });
                    }
                }
                self.types.intern(Type::Struct(resolved))
            }
            TypeExpr::Interface(methods, _) => {
                let mut resolved: Vec<(Symbol, TypeId)> = methods
                    .iter()
                    .map(|m| (m.name.name, self.resolve_signature(&m.sig)))
                    .collect();
                resolved.sort_by(|a, b| {
                    self.interner
                        .resolve(a.0)
                        .cmp(self.interner.resolve(b.0))
                });
                self.types.intern(Type::Interface(resolved))
            }
        }
    }

    /// Like [`resolve_type`](Self::resolve_type) but without recording
    /// errors, for retries of declarations already reported once.
    fn resolve_type_quiet(&mut self, expr: &TypeExpr) -> TypeId {
        let len = self.errors.len();
        let ty = self.resolve_type(expr);
        self.errors.truncate(len);
        ty
    }

    /// Import path bound to a package name in the current file.
    pub(super) fn pkg_path_of(&mut self, pkg: Ident) -> Option<Symbol> {
        let object = self.lookup(pkg.name);
        match object.map(|o| (o, self.objects.get(o).kind)) {
            Some((object, ObjectKind::PkgName(path))) => {
                self.info.uses.insert(pkg.id, object);
                Some(path)
            }
            Some(_) => {
                self.errors.push(CheckError::NotAType {
                    name: self.interner.resolve(pkg.name).to_string(),
                    span: pkg.span,
                });
                None
            }
            None => {
                self.errors.push(CheckError::Undefined {
                    name: self.interner.resolve(pkg.name).to_string(),
                    span: pkg.span,
                });
                None
            }
        }
    }

    pub(super) fn resolve_signature(&mut self, sig: &FuncSig) -> TypeId {
        let mut params = Vec::with_capacity(sig.params.len());
        for param in &sig.params {
            let mut ty = self.resolve_type(&param.ty);
            if param.variadic {
                ty = self.types.slice_of(ty);
            }
            params.push(ty);
        }
        let results = sig
            .results
            .iter()
            .map(|r| self.resolve_type(&r.ty))
            .collect();
        self.types.signature(params, results, sig.is_variadic())
    }
}
