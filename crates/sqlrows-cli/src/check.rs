//! Load a source tree, run the analyzers and print what they found.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use sqlrows_engine::analysis::{Analyzer, AnalyzerConfig, PassOutcome, Severity};
use sqlrows_engine::diagnostic::{Diagnostic, JsonDiagnostic};
use sqlrows_engine::ir::{PrettyPrint, PrintContext};
use sqlrows_engine::loader::{Loader, Package, Program};
use tracing::debug;

use crate::manifest::{find_manifest, Manifest};
use crate::output::{resolve_color_choice, StyledOutput};
use crate::{Cli, Format};

/// Overall result, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Clean,
    Findings,
    /// The tree could not be loaded, a package failed to parse, or the
    /// configuration was rejected.
    Failed,
}

impl Status {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Status::Clean => ExitCode::SUCCESS,
            Status::Findings => ExitCode::from(1),
            Status::Failed => ExitCode::from(2),
        }
    }
}

pub fn execute(cli: &Cli) -> anyhow::Result<Status> {
    let config = load_config(cli)?;
    let mut out = StyledOutput::new(resolve_color_choice(cli.color));
    let term_config = term::Config::default();

    let program = match Loader::new().load_dir(&cli.root) {
        Ok(program) => program,
        Err(err) => {
            let diag = Diagnostic::from_load_error(&err);
            let files: SimpleFiles<String, String> = SimpleFiles::new();
            match cli.format {
                Format::Json => print_json(&[diag.to_json(&files)])?,
                Format::Pretty => diag.emit(out.stderr(), &term_config, &files)?,
            }
            return Ok(Status::Failed);
        }
    };

    let packages = select_packages(&program, &cli.packages)?;

    if cli.dump_ir {
        dump_ir(&program, &packages, &mut out);
        let broken = packages.iter().any(|p| p.is_broken());
        return Ok(if broken { Status::Failed } else { Status::Clean });
    }

    // Frontend errors of the selected packages are reported alongside the
    // findings; parse errors make the run fail.
    let mut frontend = Vec::new();
    let mut status = Status::Clean;
    for package in &packages {
        if !package.parse_errors.is_empty() {
            status = Status::Failed;
        }
        frontend.extend(package.parse_errors.iter().map(Diagnostic::from_parse_error));
        frontend.extend(package.check_errors.iter().map(Diagnostic::from_check_error));
    }

    let analyzer = Analyzer::with_config(config);
    let reports = analyzer.analyze_packages(&program, &packages, cli.jobs);

    let mut findings = Vec::new();
    let mut skipped = 0usize;
    for report in &reports {
        if let PassOutcome::Skipped(reason) = &report.outcome {
            debug!(package = %report.path, %reason, "skipped");
            skipped += 1;
        }
        findings.extend(report.diagnostics().iter());
    }
    let errors = findings.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = findings.iter().filter(|d| d.severity == Severity::Warn).count();
    if !findings.is_empty() {
        status = status.max(Status::Findings);
    }

    let findings: Vec<Diagnostic> = findings.into_iter().map(Diagnostic::from_finding).collect();
    match cli.format {
        Format::Json => {
            let all: Vec<JsonDiagnostic> = frontend
                .iter()
                .chain(findings.iter())
                .map(|d| d.to_json(&program.files))
                .collect();
            print_json(&all)?;
        }
        Format::Pretty => {
            for diag in &frontend {
                diag.emit(out.stderr(), &term_config, &program.files)?;
            }
            for diag in &findings {
                diag.emit(out.stdout(), &term_config, &program.files)?;
            }
            print_summary(&mut out, reports.len(), skipped, errors, warnings);
        }
    }
    Ok(status)
}

/// Engine defaults, then the manifest, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<AnalyzerConfig> {
    let path: Option<PathBuf> = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_manifest(&cli.root),
    };

    let mut config = AnalyzerConfig::new();
    if let Some(path) = path {
        debug!(path = %path.display(), "loading config");
        Manifest::from_file(&path)
            .and_then(|manifest| manifest.apply(&mut config))
            .with_context(|| format!("invalid config {}", path.display()))?;
    }
    if cli.require_defer {
        config.close_check.require_defer = true;
    }
    if cli.check_err {
        config.close_check.check_err = true;
    }
    Ok(config)
}

fn select_packages<'p>(program: &'p Program, names: &[String]) -> anyhow::Result<Vec<&'p Package>> {
    if names.is_empty() {
        return Ok(program
            .packages
            .iter()
            .filter(|p| !p.is_stub || p.is_broken())
            .collect());
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let Some(package) = program.package(name) else {
            bail!("package {} not found", name);
        };
        selected.push(package);
    }
    Ok(selected)
}

fn dump_ir(program: &Program, packages: &[&Package], out: &mut StyledOutput) {
    let cx = PrintContext {
        interner: &program.interner,
        types: &program.types,
    };
    for package in packages {
        out.success(&format!("package {}", package.path));
        out.newline();
        for function in &package.functions {
            out.plain(&function.pretty_print(cx));
            out.newline();
        }
    }
}

fn print_json(diagnostics: &[JsonDiagnostic]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(diagnostics)?);
    Ok(())
}

fn print_summary(out: &mut StyledOutput, analyzed: usize, skipped: usize, errors: usize, warnings: usize) {
    out.plain(&format!(
        "Checked {} package{}",
        analyzed,
        if analyzed == 1 { "" } else { "s" }
    ));
    if skipped > 0 {
        out.plain(&format!(" ({} skipped)", skipped));
    }
    out.plain(": ");
    if errors == 0 && warnings == 0 {
        out.success("no problems found.");
        out.newline();
        return;
    }
    if errors > 0 {
        out.error(&format!("{} error{}", errors, if errors == 1 { "" } else { "s" }));
    } else {
        out.plain("0 errors");
    }
    out.plain(", ");
    if warnings > 0 {
        out.warning(&format!("{} warning{}", warnings, if warnings == 1 { "" } else { "s" }));
    } else {
        out.plain("0 warnings");
    }
    out.plain(".");
    out.newline();
}
