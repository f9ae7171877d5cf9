//! Flags `defer rows.Close()` placed before the error check:
//!
//! ```text
//! rows, err := db.Query(q)
//! defer rows.Close()   // rows is nil when err != nil
//! if err != nil { ... }
//! ```
//!
//! Purely syntactic: the statement holding a `(*Rows, error)` call must be
//! an assignment immediately followed by a `defer` rooted at the assigned
//! identifier.

use super::resolver::ResolvedContext;
use super::rule::{Reporter, ORDERING};
use super::signature::returns_resource;
use super::{Check, PackagePass};
use crate::parser::ast::{walk_call, walk_stmt, Block, CallExpr, Expr, File, Ident, Stmt, Visitor};

pub fn check_file(file: &File, pass: &PackagePass<'_>, resolved: &ResolvedContext, reporter: &mut Reporter) {
    let mut matcher = OrderingMatcher {
        pass,
        resolved,
        reporter,
        frames: Vec::new(),
    };
    matcher.visit_file(file);
}

struct OrderingMatcher<'a, 'p> {
    pass: &'a PackagePass<'p>,
    resolved: &'a ResolvedContext,
    reporter: &'a mut Reporter,
    /// One entry per statement being walked, innermost last; set when a
    /// matching call was seen directly in that statement's block.
    frames: Vec<bool>,
}

impl OrderingMatcher<'_, '_> {
    fn check_suffix(&mut self, stmts: &[Stmt]) {
        let [first, second, ..] = stmts else {
            return;
        };
        let Some(resp) = assigned_root(first) else {
            return;
        };
        let Stmt::Defer(defer) = second else {
            return;
        };
        let Some(root) = defer.call.unparen().as_call().and_then(|c| c.func.root_ident()) else {
            return;
        };
        let info = &self.pass.package.info;
        let (Some(assigned), Some(deferred)) = (info.object_of(resp.id), info.object_of(root.id)) else {
            return;
        };
        if assigned == deferred {
            let name = self.pass.program.interner.resolve(resp.name);
            self.reporter.report(
                &ORDERING,
                root.span,
                format!("using {} before checking for errors", name),
            );
        }
    }
}

/// First target of an assignment or initialized `var`, through selectors.
fn assigned_root(stmt: &Stmt) -> Option<Ident> {
    match stmt {
        Stmt::Assign(assign) => assign.lhs.first()?.root_ident(),
        Stmt::Var(decl) if !decl.values.is_empty() => decl.names.first().copied(),
        _ => None,
    }
}

impl Visitor for OrderingMatcher<'_, '_> {
    fn visit_block(&mut self, block: &Block) {
        for (i, stmt) in block.stmts.iter().enumerate() {
            self.frames.push(false);
            walk_stmt(self, stmt);
            if self.frames.pop() == Some(true) {
                self.check_suffix(&block.stmts[i..]);
            }
        }
    }

    fn visit_call(&mut self, expr: &Expr, call: &CallExpr) {
        let program = self.pass.program;
        if returns_resource(call, &self.pass.package.info, &program.types, self.resolved) {
            if let Some(top) = self.frames.last_mut() {
                *top = true;
            }
        }
        walk_call(self, expr, call);
    }
}

#[derive(Debug, Default)]
pub struct OrderingCheck;

impl Check for OrderingCheck {
    fn name(&self) -> &'static str {
        "ordering"
    }

    fn run(&self, pass: &PackagePass<'_>, resolved: &ResolvedContext, reporter: &mut Reporter) {
        for file in &pass.package.files {
            check_file(file, pass, resolved, reporter);
        }
    }
}
