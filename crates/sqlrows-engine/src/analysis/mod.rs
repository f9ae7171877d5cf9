//! The `*sql.Rows` lifecycle analyzers.
//!
//! # Architecture
//!
//! - [`resolver`] decides per package whether there is anything to check
//!   and produces a [`ResolvedContext`] shared by the checks.
//! - Each check implements [`Check`]: [`CloseCheck`] walks the SSA form of
//!   every function, [`OrderingCheck`] walks the AST.
//! - [`Analyzer`] runs the checks for one package and applies severity
//!   overrides; [`Analyzer::analyze_program`] fans packages out over a
//!   worker pool.

pub mod close_check;
pub mod config;
pub mod ordering;
pub mod resolver;
pub mod rule;
mod runner;
pub mod signature;

use std::fmt;

use tracing::debug;

pub use close_check::CloseCheck;
pub use config::{AnalyzerConfig, CloseCheckOptions, ResourceSpec};
pub use ordering::OrderingCheck;
pub use resolver::{Obligation, ResolvedContext};
pub use rule::{all_rules, find_rule, Diagnostic, Reporter, RuleMeta, Severity};

use crate::loader::{Package, Program};

/// One package of a loaded program, as seen by a check.
#[derive(Debug, Clone, Copy)]
pub struct PackagePass<'a> {
    pub program: &'a Program,
    pub package: &'a Package,
}

/// Why a package produced no analysis at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The package does not import the library directly.
    LibraryNotImported,
    /// The library has no such type, or it is never used as a pointer.
    ResourceTypeMissing,
    /// The package failed to parse.
    SyntaxErrors,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::LibraryNotImported => "library not imported",
            SkipReason::ResourceTypeMissing => "resource type not found",
            SkipReason::SyntaxErrors => "syntax errors",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Skipped(SkipReason),
    Analyzed(Vec<Diagnostic>),
}

impl PassOutcome {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            PassOutcome::Skipped(_) => &[],
            PassOutcome::Analyzed(diagnostics) => diagnostics,
        }
    }
}

/// Outcome for one package of a program run.
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub path: String,
    pub outcome: PassOutcome,
}

impl PackageReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.outcome.diagnostics()
    }
}

/// A package-level check.
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, pass: &PackagePass<'_>, resolved: &ResolvedContext, reporter: &mut Reporter);
}

pub struct Analyzer {
    checks: Vec<Box<dyn Check>>,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Both checks with default configuration.
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::new())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            checks: vec![Box::new(CloseCheck), Box::new(OrderingCheck)],
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a single package.
    pub fn analyze(&self, pass: &PackagePass<'_>) -> PassOutcome {
        if pass.package.is_broken() {
            debug!(package = %pass.package.path, "skipped: syntax errors");
            return PassOutcome::Skipped(SkipReason::SyntaxErrors);
        }
        let resolved = match resolver::resolve(pass, &self.config) {
            Ok(resolved) => resolved,
            Err(reason) => {
                debug!(package = %pass.package.path, %reason, "skipped");
                return PassOutcome::Skipped(reason);
            }
        };

        let mut reporter = Reporter::new();
        for check in &self.checks {
            check.run(pass, &resolved, &mut reporter);
        }
        let mut diagnostics = reporter.finish();

        diagnostics.retain_mut(|d| {
            let eff = self.config.effective_severity(d.rule, d.severity);
            if eff == Severity::Off {
                return false;
            }
            d.severity = eff;
            true
        });
        debug!(
            package = %pass.package.path,
            diagnostics = diagnostics.len(),
            "analyzed"
        );
        PassOutcome::Analyzed(diagnostics)
    }

    /// Analyze every package with function bodies, in load order. `jobs`
    /// of zero means one worker per CPU.
    pub fn analyze_program(&self, program: &Program, jobs: usize) -> Vec<PackageReport> {
        let packages: Vec<&Package> = program.packages.iter().filter(|p| !p.is_stub).collect();
        self.analyze_packages(program, &packages, jobs)
    }

    /// Analyze the given packages; reports come back in the same order.
    pub fn analyze_packages(&self, program: &Program, packages: &[&Package], jobs: usize) -> Vec<PackageReport> {
        runner::run(self, program, packages, jobs)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
