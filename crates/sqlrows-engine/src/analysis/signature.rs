//! Recognizes calls shaped like `db.Query(...)`: a selector callee whose
//! statically recorded signature returns exactly `(*Rows, error)`.

use super::resolver::ResolvedContext;
use crate::checker::TypeInfo;
use crate::parser::ast::{CallExpr, ExprKind};
use crate::types::TypeContext;

pub fn returns_resource(
    call: &CallExpr,
    info: &TypeInfo,
    types: &TypeContext,
    resolved: &ResolvedContext,
) -> bool {
    let callee = call.func.unparen();
    if !matches!(callee.kind, ExprKind::Selector { .. }) {
        return false;
    }
    let Some(sig) = info
        .type_of(callee.id)
        .and_then(|ty| types.as_signature(ty))
    else {
        return false;
    };
    matches!(
        sig.results.as_slice(),
        [first, second] if *first == resolved.resource_type && *second == resolved.error_type
    )
}
