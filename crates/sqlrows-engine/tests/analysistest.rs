//! Fixture-driven tests over `tests/testdata/src`.
//!
//! Each fixture line carrying `// want "regex"` expects exactly one
//! diagnostic on that line whose message matches the regex; any other
//! diagnostic is a failure.

use std::path::PathBuf;

use regex::Regex;
use sqlrows_engine::analysis::{AnalyzerConfig, Analyzer, PackagePass, PassOutcome, SkipReason};
use sqlrows_engine::loader::{Loader, Program};

fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/testdata")
}

fn load() -> Program {
    Loader::new().load_dir(&testdata()).expect("load testdata")
}

struct Expectation {
    file: usize,
    line: u32,
    pattern: Regex,
}

fn expectations(program: &Program, package: &str) -> Vec<Expectation> {
    let want = Regex::new(r"//\s*want\s+(.*)$").unwrap();
    let quoted = Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap();
    let mut out = Vec::new();
    for id in &program.package(package).unwrap().file_ids {
        let file = program.files.get(id.index()).unwrap();
        for (i, text) in file.source().lines().enumerate() {
            let Some(caps) = want.captures(text) else { continue };
            for pattern in quoted.captures_iter(&caps[1]) {
                out.push(Expectation {
                    file: id.index(),
                    line: i as u32 + 1,
                    pattern: Regex::new(&pattern[1]).unwrap(),
                });
            }
        }
    }
    out
}

/// Analyze `package` and compare its diagnostics to the `want` comments.
fn run(config: AnalyzerConfig, package: &str) {
    let program = load();
    let pkg = program.package(package).unwrap();
    assert!(
        pkg.parse_errors.is_empty() && pkg.check_errors.is_empty(),
        "{}: {:?} {:?}",
        package,
        pkg.parse_errors,
        pkg.check_errors
    );
    let outcome = Analyzer::with_config(config).analyze(&PackagePass {
        program: &program,
        package: pkg,
    });
    let PassOutcome::Analyzed(diagnostics) = outcome else {
        panic!("{} was skipped: {:?}", package, outcome);
    };

    let mut pending = expectations(&program, package);
    let mut unexpected = Vec::new();
    for d in &diagnostics {
        let found = pending.iter().position(|e| {
            e.file == d.span.file.index() && e.line == d.span.line && e.pattern.is_match(&d.message)
        });
        match found {
            Some(i) => {
                pending.remove(i);
            }
            None => unexpected.push(format!("{}:{}: {}", package, d.span.line, d.message)),
        }
    }
    let missing: Vec<String> = pending
        .iter()
        .map(|e| format!("{}:{}: want {:?}", package, e.line, e.pattern.as_str()))
        .collect();
    assert!(
        unexpected.is_empty() && missing.is_empty(),
        "unexpected: {:#?}\nmissing: {:#?}",
        unexpected,
        missing
    );
}

#[test]
fn test_package_a_require_defer() {
    run(AnalyzerConfig::new().require_defer(true), "a");
}

#[test]
fn test_package_b_check_err() {
    run(AnalyzerConfig::new().check_err(true), "b");
}

#[test]
fn test_loops() {
    run(AnalyzerConfig::new(), "loops");
}

#[test]
fn test_error_guards() {
    run(AnalyzerConfig::new(), "guards");
}

#[test]
fn test_escaping_values() {
    run(AnalyzerConfig::new(), "escape");
}

#[test]
fn test_ordering_patterns() {
    run(AnalyzerConfig::new(), "ordering");
}

#[test]
fn test_package_without_import_is_skipped() {
    let program = load();
    let pkg = program.package("noimport").unwrap();
    let outcome = Analyzer::new().analyze(&PackagePass {
        program: &program,
        package: pkg,
    });
    assert_eq!(outcome, PassOutcome::Skipped(SkipReason::LibraryNotImported));
}

#[test]
fn test_program_run_skips_stubs_and_is_deterministic() {
    let program = load();
    let analyzer = Analyzer::new();
    let reports = analyzer.analyze_program(&program, 0);
    let paths: Vec<&str> = reports.iter().map(|r| r.path.as_str()).collect();
    for stub in ["database/sql", "context", "fmt", "log"] {
        assert!(!paths.contains(&stub), "stub {} analyzed", stub);
    }
    for fixture in ["a", "b", "loops", "guards", "escape", "ordering", "noimport"] {
        assert!(paths.contains(&fixture), "{} missing", fixture);
    }

    let again = analyzer.analyze_program(&program, 1);
    let outcomes = |reports: &[sqlrows_engine::analysis::PackageReport]| -> Vec<(String, PassOutcome)> {
        reports.iter().map(|r| (r.path.clone(), r.outcome.clone())).collect()
    };
    assert_eq!(outcomes(&reports), outcomes(&again));
}
