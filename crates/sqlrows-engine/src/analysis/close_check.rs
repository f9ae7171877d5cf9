//! Liveness-to-close analysis over the SSA form.
//!
//! Every instruction producing a resource value is a definition site. From
//! each site the analysis searches forward through the CFG for a path that
//! ends without calling a discharging method on the value (or on a phi that
//! merges it). One such path is enough to report the site.

use rustc_hash::FxHashSet;
use tracing::trace;

use super::resolver::{Obligation, ResolvedContext};
use super::rule::Reporter;
use super::{Check, PackagePass};
use crate::ir::{BlockId, Constant, Function, InstrKind, Instruction, Terminator, ValueId};
use crate::parser::ast::{BinaryOp, UnaryOp};

/// A resource value and where it is produced.
#[derive(Debug, Clone, Copy)]
struct Site {
    value: ValueId,
    block: BlockId,
    index: usize,
    /// Tuple and component for a value extracted from a call result
    tuple: Option<(ValueId, usize)>,
}

pub fn check_function(func: &Function, resolved: &ResolvedContext, reporter: &mut Reporter) {
    if resolved.obligations.is_empty() {
        return;
    }
    for site in definition_sites(func, resolved) {
        let aliases = aliases(func, site.value);
        if escapes(func, &aliases) {
            trace!(function = %func.name, value = %site.value, "resource escapes, skipped");
            continue;
        }
        let search = PathSearch {
            func,
            resolved,
            site,
            aliases: &aliases,
        };
        for obligation in &resolved.obligations {
            let leaked = search.leaks(obligation);
            trace!(
                function = %func.name,
                value = %site.value,
                rule = obligation.rule.name,
                leaked,
                "definition site"
            );
            if leaked {
                let span = func.diagnostic_span(site.block, site.index);
                reporter.report(obligation.rule, span, obligation.message.clone());
            }
        }
    }
}

fn definition_sites(func: &Function, resolved: &ResolvedContext) -> Vec<Site> {
    let mut sites = Vec::new();
    for block in func.blocks() {
        for (index, instr) in block.instructions.iter().enumerate() {
            let Some(value) = instr.dest else { continue };
            if func.value(value).ty != resolved.resource_type {
                continue;
            }
            let tuple = match instr.kind {
                InstrKind::Call(_) => None,
                InstrKind::Extract { tuple, index } => Some((tuple, index)),
                _ => continue,
            };
            sites.push(Site {
                value,
                block: block.id,
                index,
                tuple,
            });
        }
    }
    sites
}

/// `value` plus every phi that (transitively) merges it.
fn aliases(func: &Function, value: ValueId) -> FxHashSet<ValueId> {
    let mut set = FxHashSet::default();
    set.insert(value);
    loop {
        let mut changed = false;
        for block in func.blocks() {
            for instr in block.instructions.iter().take_while(|i| i.is_phi()) {
                let (Some(dest), InstrKind::Phi { edges }) = (instr.dest, &instr.kind) else {
                    continue;
                };
                if !set.contains(&dest) && edges.iter().any(|(_, v)| set.contains(v)) {
                    set.insert(dest);
                    changed = true;
                }
            }
        }
        if !changed {
            return set;
        }
    }
}

/// Returned, stored or address-taken values are owned by someone else.
/// Passing the value as a call argument does not count.
fn escapes(func: &Function, aliases: &FxHashSet<ValueId>) -> bool {
    func.blocks().any(|block| {
        let stored = block.instructions.iter().any(|instr| match &instr.kind {
            InstrKind::Store { value, .. } => aliases.contains(value),
            InstrKind::UnOp {
                op: UnaryOp::Addr,
                operand,
            } => aliases.contains(operand),
            _ => false,
        });
        let returned = matches!(&block.terminator, Terminator::Return(values) if values.iter().any(|v| aliases.contains(v)));
        stored || returned
    })
}

struct PathSearch<'a> {
    func: &'a Function,
    resolved: &'a ResolvedContext,
    site: Site,
    aliases: &'a FxHashSet<ValueId>,
}

/// Where a block hands control after its instructions.
enum Exit {
    Leak,
    End,
    Next(Vec<BlockId>),
}

impl PathSearch<'_> {
    fn leaks(&self, obligation: &Obligation) -> bool {
        let site_block = self.func.block(self.site.block);
        if self.discharged(&site_block.instructions[self.site.index + 1..], obligation) {
            return false;
        }
        let mut worklist = match self.exit(self.site.block) {
            Exit::Leak => return true,
            Exit::End => return false,
            Exit::Next(succs) => succs,
        };
        let mut visited = FxHashSet::default();
        while let Some(b) = worklist.pop() {
            if !visited.insert(b) {
                continue;
            }
            let instructions = &self.func.block(b).instructions;
            if b == self.site.block {
                // Back at the definition: the value is about to be rebound.
                if self.discharged(&instructions[..self.site.index], obligation) {
                    continue;
                }
                return true;
            }
            if self.discharged(instructions, obligation) {
                continue;
            }
            match self.exit(b) {
                Exit::Leak => return true,
                Exit::End => {}
                Exit::Next(succs) => worklist.extend(succs),
            }
        }
        false
    }

    fn discharged(&self, instructions: &[Instruction], obligation: &Obligation) -> bool {
        instructions.iter().any(|instr| {
            let call = match &instr.kind {
                InstrKind::Defer(call) => call,
                InstrKind::Call(call) if !obligation.require_defer => call,
                _ => return false,
            };
            call.receiver.is_some_and(|r| self.aliases.contains(&r))
                && call
                    .static_callee()
                    .is_some_and(|f| obligation.methods.contains(&f))
        })
    }

    fn exit(&self, block: BlockId) -> Exit {
        match &self.func.block(block).terminator {
            Terminator::Return(_) => Exit::Leak,
            Terminator::Panic(_) | Terminator::Unreachable => Exit::End,
            Terminator::Jump(target) => Exit::Next(vec![*target]),
            Terminator::If {
                cond,
                then_block,
                else_block,
            } => match self.error_guard(*cond) {
                Some(Guard::ErrorWhenTrue) => Exit::Next(vec![*else_block]),
                Some(Guard::ErrorWhenFalse) => Exit::Next(vec![*then_block]),
                None => Exit::Next(vec![*then_block, *else_block]),
            },
        }
    }

    /// Classifies `cond` as a nil comparison of the error produced
    /// together with the resource. On the error side the resource is nil.
    fn error_guard(&self, cond: ValueId) -> Option<Guard> {
        let (tuple, site_index) = self.site.tuple?;
        let InstrKind::BinOp { op, lhs, rhs } = self.func.def_instr(cond)?.kind else {
            return None;
        };
        let guard = match op {
            BinaryOp::Ne => Guard::ErrorWhenTrue,
            BinaryOp::Eq => Guard::ErrorWhenFalse,
            _ => return None,
        };
        let is_err = |v: ValueId| {
            self.func.value(v).ty == self.resolved.error_type
                && matches!(
                    self.func.def_instr(v).map(|i| &i.kind),
                    Some(&InstrKind::Extract { tuple: t, index }) if t == tuple && index != site_index
                )
        };
        let is_nil = |v: ValueId| matches!(self.func.constant_of(v), Some(Constant::Nil));
        ((is_err(lhs) && is_nil(rhs)) || (is_nil(lhs) && is_err(rhs))).then_some(guard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    /// `err != nil`
    ErrorWhenTrue,
    /// `err == nil`
    ErrorWhenFalse,
}

/// The must-close (and optional must-check-err) check over every lowered
/// function of the package.
#[derive(Debug, Default)]
pub struct CloseCheck;

impl Check for CloseCheck {
    fn name(&self) -> &'static str {
        "close-check"
    }

    fn run(&self, pass: &PackagePass<'_>, resolved: &ResolvedContext, reporter: &mut Reporter) {
        for func in &pass.package.functions {
            check_function(func, resolved, reporter);
        }
    }
}
