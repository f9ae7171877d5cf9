use super::*;
use crate::loader::{Loader, SourceFile};

const SQL: &str = r#"package sql

type DB struct{}

type Rows struct{}

func Open(driver string, dsn string) (*DB, error)

func (db *DB) Query(query string, args ...any) (*Rows, error)

func (rs *Rows) Close() error

func (rs *Rows) Next() bool

func (rs *Rows) Err() error
"#;

fn load(src: &str) -> Program {
    Loader::new()
        .load_sources(vec![
            SourceFile::new("database/sql", "sql.go", SQL),
            SourceFile::new("a", "a.go", src),
        ])
        .unwrap()
}

fn run(src: &str, config: AnalyzerConfig) -> PassOutcome {
    let program = load(src);
    let package = program.package("a").unwrap();
    assert_eq!(package.error_count(), 0, "{:?} {:?}", package.parse_errors, package.check_errors);
    Analyzer::with_config(config).analyze(&PackagePass {
        program: &program,
        package,
    })
}

/// (line, rule, message) triples.
fn findings(src: &str, config: AnalyzerConfig) -> Vec<(u32, &'static str, String)> {
    match run(src, config) {
        PassOutcome::Analyzed(diagnostics) => diagnostics
            .into_iter()
            .map(|d| (d.span.line, d.rule, d.message))
            .collect(),
        PassOutcome::Skipped(reason) => panic!("package skipped: {}", reason),
    }
}

fn line_of(src: &str, needle: &str) -> u32 {
    let offset = src.find(needle).unwrap();
    src[..offset].matches('\n').count() as u32 + 1
}

fn package(body: &str) -> String {
    format!("package a\n\nimport \"database/sql\"\n\n{}", body)
}

#[test]
fn test_check_then_defer_is_clean() {
    let src = package(
        r#"func f(db *sql.DB) error {
	rows, err := db.Query("q")
	if err != nil {
		return err
	}
	defer rows.Close()
	return nil
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_missing_close_is_reported_at_the_call() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	if err != nil {
		return
	}
	rows.Next()
}
"#,
    );
    assert_eq!(
        findings(&src, AnalyzerConfig::new()),
        vec![(line_of(&src, "db.Query"), "must-close", "rows.Close must be called".to_string())]
    );
}

#[test]
fn test_defer_before_check_is_an_ordering_violation() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	defer rows.Close()
	if err != nil {
		return
	}
}
"#,
    );
    assert_eq!(
        findings(&src, AnalyzerConfig::new()),
        vec![(
            line_of(&src, "defer"),
            "ordering",
            "using rows before checking for errors".to_string()
        )]
    );
}

#[test]
fn test_ordering_reports_at_the_deferred_root() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	defer rows.Close()
	_ = err
}
"#,
    );
    let outcome = run(&src, AnalyzerConfig::new());
    let ordering: Vec<&Diagnostic> = outcome.diagnostics().iter().filter(|d| d.rule == "ordering").collect();
    assert_eq!(ordering.len(), 1);
    let column = src.lines().nth(line_of(&src, "defer") as usize - 1).unwrap().find("rows").unwrap() as u32 + 1;
    assert_eq!(ordering[0].span.column, column);
}

#[test]
fn test_ordering_accepts_initialized_var() {
    let src = package(
        r#"func f(db *sql.DB) {
	var rows, err = db.Query("q")
	defer rows.Close()
	if err != nil {
		return
	}
}
"#,
    );
    let rules: Vec<&str> = findings(&src, AnalyzerConfig::new()).iter().map(|f| f.1).collect();
    assert_eq!(rules, vec!["ordering"]);
}

#[test]
fn test_ordering_ignores_other_deferred_values() {
    let src = package(
        r#"func f(db *sql.DB, other *sql.Rows) {
	rows, err := db.Query("q")
	defer other.Close()
	if err != nil {
		return
	}
	rows.Close()
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_close_on_one_branch_only_leaks() {
    let src = package(
        r#"func f(db *sql.DB, done bool) {
	rows, err := db.Query("q")
	if err != nil {
		return
	}
	if done {
		rows.Close()
	}
}
"#,
    );
    let rules: Vec<&str> = findings(&src, AnalyzerConfig::new()).iter().map(|f| f.1).collect();
    assert_eq!(rules, vec!["must-close"]);
}

#[test]
fn test_error_guard_with_equality() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	if err == nil {
		defer rows.Close()
	}
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_close_through_merged_values() {
    let src = package(
        r#"func f(db *sql.DB, first bool) {
	var rows *sql.Rows
	if first {
		rows, _ = db.Query("a")
	} else {
		rows, _ = db.Query("b")
	}
	rows.Close()
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_loop_with_close_in_body_terminates_clean() {
    let src = package(
        r#"func f(db *sql.DB) {
	for i := 0; i < 3; i++ {
		rows, err := db.Query("q")
		if err != nil {
			return
		}
		for rows.Next() {
		}
		rows.Close()
	}
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_rebinding_in_loop_leaks() {
    let src = package(
        r#"func f(db *sql.DB) {
	var rows *sql.Rows
	for i := 0; i < 3; i++ {
		rows, _ = db.Query("q")
	}
	rows.Close()
}
"#,
    );
    assert_eq!(
        findings(&src, AnalyzerConfig::new()),
        vec![(line_of(&src, "db.Query"), "must-close", "rows.Close must be called".to_string())]
    );
}

#[test]
fn test_returned_value_escapes() {
    let src = package(
        r#"func open(db *sql.DB) (*sql.Rows, error) {
	rows, err := db.Query("q")
	if err != nil {
		return nil, err
	}
	return rows, nil
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_stored_value_escapes() {
    let src = package(
        r#"var current *sql.Rows

func f(db *sql.DB) {
	rows, _ := db.Query("q")
	current = rows
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_argument_passing_is_not_an_escape() {
    let src = package(
        r#"func consume(r *sql.Rows) {}

func f(db *sql.DB) {
	rows, _ := db.Query("q")
	consume(rows)
}
"#,
    );
    let rules: Vec<&str> = findings(&src, AnalyzerConfig::new()).iter().map(|f| f.1).collect();
    assert_eq!(rules, vec!["must-close"]);
}

#[test]
fn test_panic_paths_do_not_leak() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	if err != nil {
		panic(err)
	}
	if !rows.Next() {
		panic("empty")
	}
	rows.Close()
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
}

#[test]
fn test_discarded_rows_are_still_reported() {
    let src = package(
        r#"func f(db *sql.DB) {
	_, err := db.Query("q")
	if err != nil {
		return
	}
}
"#,
    );
    let rules: Vec<&str> = findings(&src, AnalyzerConfig::new()).iter().map(|f| f.1).collect();
    assert_eq!(rules, vec!["must-close"]);
}

#[test]
fn test_require_defer_rejects_plain_close() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	if err != nil {
		return
	}
	rows.Close()
}
"#,
    );
    assert!(findings(&src, AnalyzerConfig::new()).is_empty());
    assert_eq!(
        findings(&src, AnalyzerConfig::new().require_defer(true)),
        vec![(
            line_of(&src, "db.Query"),
            "must-close",
            "rows.Close must be called in defer function".to_string()
        )]
    );
}

#[test]
fn test_check_err_requires_err_call() {
    let missing = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	if err != nil {
		return
	}
	defer rows.Close()
	for rows.Next() {
	}
}
"#,
    );
    assert_eq!(
        findings(&missing, AnalyzerConfig::new().check_err(true)),
        vec![(line_of(&missing, "db.Query"), "must-check-err", "rows.Err must be called".to_string())]
    );

    let present = package(
        r#"func f(db *sql.DB) error {
	rows, err := db.Query("q")
	if err != nil {
		return err
	}
	defer rows.Close()
	for rows.Next() {
	}
	return rows.Err()
}
"#,
    );
    assert!(findings(&present, AnalyzerConfig::new().check_err(true)).is_empty());
}

#[test]
fn test_package_without_import_is_skipped() {
    let program = Loader::new()
        .load_sources(vec![
            SourceFile::new("database/sql", "sql.go", SQL),
            SourceFile::new("a", "a.go", "package a\n\nfunc f() {}\n"),
        ])
        .unwrap();
    let package = program.package("a").unwrap();
    let outcome = Analyzer::new().analyze(&PackagePass {
        program: &program,
        package,
    });
    assert_eq!(outcome, PassOutcome::Skipped(SkipReason::LibraryNotImported));
}

#[test]
fn test_missing_resource_type_is_skipped() {
    let program = Loader::new()
        .load_sources(vec![
            SourceFile::new("database/sql", "sql.go", "package sql\n\ntype DB struct{}\n"),
            SourceFile::new("a", "a.go", "package a\n\nimport \"database/sql\"\n\nfunc f(db *sql.DB) {}\n"),
        ])
        .unwrap();
    let package = program.package("a").unwrap();
    let outcome = Analyzer::new().analyze(&PackagePass {
        program: &program,
        package,
    });
    assert_eq!(outcome, PassOutcome::Skipped(SkipReason::ResourceTypeMissing));
}

#[test]
fn test_broken_package_is_skipped() {
    let program = Loader::new()
        .load_sources(vec![SourceFile::new("a", "a.go", "package a\n\nfunc f() { go g() }\n")])
        .unwrap();
    let package = program.package("a").unwrap();
    let outcome = Analyzer::new().analyze(&PackagePass {
        program: &program,
        package,
    });
    assert_eq!(outcome, PassOutcome::Skipped(SkipReason::SyntaxErrors));
}

#[test]
fn test_severity_overrides() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	defer rows.Close()
	if err != nil {
		return
	}
	rows, err = db.Query("again")
}
"#,
    );
    let mut config = AnalyzerConfig::new();
    config.set_severity("must-close", Severity::Off);
    config.set_severity("ordering", Severity::Error);
    let outcome = run(&src, config);
    let severities: Vec<(&str, Severity)> = outcome.diagnostics().iter().map(|d| (d.rule, d.severity)).collect();
    assert_eq!(severities, vec![("ordering", Severity::Error)]);
}

#[test]
fn test_analysis_is_idempotent() {
    let src = package(
        r#"func f(db *sql.DB) {
	rows, err := db.Query("q")
	defer rows.Close()
	if err != nil {
		return
	}
	other, _ := db.Query("q")
	other.Next()
}
"#,
    );
    let program = load(&src);
    let package = program.package("a").unwrap();
    let analyzer = Analyzer::new();
    let pass = PackagePass {
        program: &program,
        package,
    };
    let first = analyzer.analyze(&pass);
    assert_eq!(first.diagnostics().len(), 2);
    assert_eq!(first, analyzer.analyze(&pass));
}

#[test]
fn test_parallel_run_matches_sequential() {
    let mut sources = vec![SourceFile::new("database/sql", "sql.go", SQL)];
    for i in 0..8 {
        let body = if i % 2 == 0 {
            "func f(db *sql.DB) {\n\trows, _ := db.Query(\"q\")\n\trows.Next()\n}\n"
        } else {
            "func f(db *sql.DB) {\n\trows, _ := db.Query(\"q\")\n\trows.Close()\n}\n"
        };
        sources.push(SourceFile::new(
            format!("p{}", i),
            "p.go",
            format!("package p{}\n\nimport \"database/sql\"\n\n{}", i, body),
        ));
    }
    let program = Loader::new().load_sources(sources).unwrap();
    let analyzer = Analyzer::new();
    let sequential = analyzer.analyze_program(&program, 1);
    let parallel = analyzer.analyze_program(&program, 4);
    assert_eq!(sequential.len(), 8);
    let summary = |reports: &[PackageReport]| -> Vec<(String, usize)> {
        reports.iter().map(|r| (r.path.clone(), r.diagnostics().len())).collect()
    };
    assert_eq!(summary(&sequential), summary(&parallel));
    assert_eq!(
        sequential.iter().filter(|r| !r.diagnostics().is_empty()).count(),
        4
    );
}
