//! Per-package resolution of the tracked resource type and the methods
//! that discharge it.
//!
//! Misses are not errors: a package that does not import the library, or
//! a library without the type, is skipped as a whole. Only direct imports
//! count; re-exports through other packages are not followed.

use tracing::trace;

use super::config::AnalyzerConfig;
use super::rule::{RuleMeta, MUST_CHECK_ERR, MUST_CLOSE};
use super::{PackagePass, SkipReason};
use crate::checker::ObjectKind;
use crate::loader::Program;
use crate::types::{FuncId, Type, TypeId};

const ERR_METHOD: &str = "Err";

/// A requirement checked at every definition site: one of `methods` must
/// be called on the resource along every path.
#[derive(Debug, Clone)]
pub struct Obligation {
    pub rule: &'static RuleMeta,
    pub methods: Vec<FuncId>,
    /// Only deferred calls count.
    pub require_defer: bool,
    pub message: String,
}

/// What both analyzers need to know about the resource in one package.
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    /// The pointer type `*pkg.Name`
    pub resource_type: TypeId,
    /// Universe `error`
    pub error_type: TypeId,
    /// Empty when no discharging method resolves; the close check is then
    /// a no-op while the ordering check still runs.
    pub obligations: Vec<Obligation>,
}

pub fn resolve(pass: &PackagePass<'_>, config: &AnalyzerConfig) -> Result<ResolvedContext, SkipReason> {
    let program = pass.program;
    let spec = &config.resource;

    let imported = program
        .interner
        .get(&spec.package)
        .is_some_and(|path| pass.package.info.imports_path(path));
    if !imported {
        return Err(SkipReason::LibraryNotImported);
    }

    let library = program.package(&spec.package).ok_or(SkipReason::ResourceTypeMissing)?;
    let type_name = program
        .interner
        .get(&spec.type_name)
        .ok_or(SkipReason::ResourceTypeMissing)?;
    let object = library
        .scope
        .lookup(type_name)
        .map(|o| program.objects.get(o))
        .filter(|o| o.kind == ObjectKind::TypeName)
        .ok_or(SkipReason::ResourceTypeMissing)?;
    if !matches!(program.types.get(object.ty), Type::Named(_)) {
        return Err(SkipReason::ResourceTypeMissing);
    }
    let resource_type = program
        .types
        .lookup(&Type::Pointer(object.ty))
        .ok_or(SkipReason::ResourceTypeMissing)?;

    let prefix = spec.type_name.to_lowercase();
    let mut obligations = Vec::new();
    let close = resolve_methods(program, resource_type, spec.close.iter().map(String::as_str));
    if let Some(&(_, first)) = close.first() {
        let require_defer = config.close_check.require_defer;
        let mut message = format!("{}.{} must be called", prefix, first);
        if require_defer {
            message.push_str(" in defer function");
        }
        obligations.push(Obligation {
            rule: &MUST_CLOSE,
            methods: close.iter().map(|(f, _)| *f).collect(),
            require_defer,
            message,
        });
    }
    if config.close_check.check_err {
        let err = resolve_methods(program, resource_type, [ERR_METHOD]);
        if let Some(&(func, name)) = err.first() {
            obligations.push(Obligation {
                rule: &MUST_CHECK_ERR,
                methods: vec![func],
                require_defer: false,
                message: format!("{}.{} must be called", prefix, name),
            });
        }
    }

    trace!(
        package = %pass.package.path,
        obligations = obligations.len(),
        "resolved resource type"
    );
    Ok(ResolvedContext {
        resource_type,
        error_type: program.types.error_type(),
        obligations,
    })
}

/// Method-set entries for `names`; unknown names are dropped.
fn resolve_methods<'n>(
    program: &Program,
    resource_type: TypeId,
    names: impl IntoIterator<Item = &'n str>,
) -> Vec<(FuncId, &'n str)> {
    names
        .into_iter()
        .filter_map(|name| {
            let sym = program.interner.get(name)?;
            let method = program.types.lookup_method(resource_type, sym)?;
            Some((method.func, name))
        })
        .collect()
}
