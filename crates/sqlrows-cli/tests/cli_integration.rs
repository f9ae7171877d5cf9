//! Runs the built `sqlrows` binary over temporary source trees.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const SQL_STUB: &str = r#"package sql

type DB struct{}

type Rows struct{}

func (db *DB) Query(query string, args ...any) (*Rows, error)

func (rs *Rows) Next() bool

func (rs *Rows) Err() error

func (rs *Rows) Close() error
"#;

const CLEAN: &str = r#"package app

import "database/sql"

func list(db *sql.DB) error {
	rows, err := db.Query("SELECT 1")
	if err != nil {
		return err
	}
	defer rows.Close()
	for rows.Next() {
	}
	return rows.Err()
}
"#;

const LEAK: &str = r#"package app

import "database/sql"

func leak(db *sql.DB) {
	rows, err := db.Query("SELECT 1")
	if err != nil {
		return
	}
	rows.Next()
}
"#;

const EARLY_DEFER: &str = r#"package app

import "database/sql"

func early(db *sql.DB) error {
	rows, err := db.Query("SELECT 1")
	defer rows.Close()
	if err != nil {
		return err
	}
	return nil
}
"#;

const PLAIN_CLOSE: &str = r#"package app

import "database/sql"

func plain(db *sql.DB) {
	rows, err := db.Query("SELECT 1")
	if err != nil {
		return
	}
	rows.Close()
}
"#;

/// A tree with the `database/sql` stub and one `app` package.
fn tree(app: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/database/sql/sql.go", SQL_STUB);
    write(dir.path(), "src/app/app.go", app);
    dir
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

fn sqlrows(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlrows"))
        .arg("--root")
        .arg(root)
        .args(["--color", "never"])
        .args(args)
        .env_remove("SQLROWS_LOG")
        .output()
        .expect("failed to run sqlrows")
}

fn json(output: &Output) -> Vec<Value> {
    let text = String::from_utf8_lossy(&output.stdout);
    match serde_json::from_str(&text) {
        Ok(Value::Array(items)) => items,
        other => panic!("expected a JSON array, got {:?} from {}", other, text),
    }
}

#[test]
fn test_clean_tree_exits_zero() {
    let dir = tree(CLEAN);
    let output = sqlrows(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Checked 1 package: no problems found."), "{}", stdout);
}

#[test]
fn test_leak_reported_as_json() {
    let dir = tree(LEAK);
    let output = sqlrows(dir.path(), &["--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let items = json(&output);
    assert_eq!(items.len(), 1, "{:?}", items);
    let item = &items[0];
    assert_eq!(item["rule"], "must-close");
    assert_eq!(item["code"], "S1001");
    assert_eq!(item["severity"], "warning");
    assert_eq!(item["line"], 6);
    assert_eq!(item["message"], "rows.Close must be called");
    assert!(item["file"].as_str().unwrap().ends_with("app.go"));
}

#[test]
fn test_pretty_output_has_source_and_summary() {
    let dir = tree(EARLY_DEFER);
    let output = sqlrows(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("warning[S1002]: using rows before checking for errors"), "{}", stdout);
    assert!(stdout.contains("app.go:7:8"), "{}", stdout);
    assert!(stdout.contains("0 errors, 1 warning."), "{}", stdout);
}

#[test]
fn test_require_defer_flag() {
    let dir = tree(PLAIN_CLOSE);
    assert_eq!(sqlrows(dir.path(), &[]).status.code(), Some(0));

    let output = sqlrows(dir.path(), &["--format", "json", "--require-defer"]);
    assert_eq!(output.status.code(), Some(1));
    let items = json(&output);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["message"], "rows.Close must be called in defer function");
}

#[test]
fn test_check_err_flag() {
    let dir = tree(LEAK.replace("rows.Next()", "defer rows.Close()").as_str());
    assert_eq!(sqlrows(dir.path(), &[]).status.code(), Some(0));

    let output = sqlrows(dir.path(), &["--format", "json", "--check-err"]);
    assert_eq!(output.status.code(), Some(1));
    let items = json(&output);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["rule"], "must-check-err");
}

#[test]
fn test_config_file_severity() {
    let dir = tree(LEAK);
    write(dir.path(), "sqlrows.toml", "[lint]\nmust-close = \"error\"\n");
    let output = sqlrows(dir.path(), &["--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json(&output)[0]["severity"], "error");

    write(dir.path(), "sqlrows.toml", "[lint]\nmust-close = \"off\"\n");
    let output = sqlrows(dir.path(), &["--format", "json"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(json(&output).is_empty());
}

#[test]
fn test_explicit_config_path() {
    let dir = tree(PLAIN_CLOSE);
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[close-check]\nrequire-defer = true\n").unwrap();
    let output = sqlrows(dir.path(), &["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tree(CLEAN);
    write(dir.path(), "sqlrows.toml", "[lint]\nmust-close = \"loud\"\n");
    let output = sqlrows(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid config"), "{}", stderr);
}

#[test]
fn test_missing_tree_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = sqlrows(dir.path(), &["--format", "json"]);
    assert_eq!(output.status.code(), Some(2));
    let items = json(&output);
    assert_eq!(items[0]["code"], "E2001");
}

#[test]
fn test_unknown_package_fails() {
    let dir = tree(CLEAN);
    let output = sqlrows(dir.path(), &["nope"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("package nope not found"), "{}", stderr);
}

#[test]
fn test_parse_error_fails_but_other_packages_are_checked() {
    let dir = tree(LEAK);
    write(dir.path(), "src/broken/broken.go", "package broken\n\nfunc f( {\n}\n");
    let output = sqlrows(dir.path(), &["--format", "json"]);
    assert_eq!(output.status.code(), Some(2));
    let items = json(&output);
    assert!(items.iter().any(|d| d["code"].as_str().is_some_and(|c| c.starts_with("E0"))));
    assert!(items.iter().any(|d| d["rule"] == "must-close"));
}

#[test]
fn test_selected_packages_only() {
    let dir = tree(LEAK);
    write(dir.path(), "src/other/other.go", CLEAN.replace("package app", "package other").as_str());
    let output = sqlrows(dir.path(), &["other"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_dump_ir() {
    let dir = tree(CLEAN);
    let output = sqlrows(dir.path(), &["--dump-ir", "app"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("package app"), "{}", stdout);
    assert!(stdout.contains("func list("), "{}", stdout);
}

#[test]
fn test_dump_ir_with_parse_errors_fails() {
    let dir = tree(CLEAN);
    write(dir.path(), "src/broken/broken.go", "package broken\n\nfunc f( {\n}\n");
    let output = sqlrows(dir.path(), &["--dump-ir"]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("package app"), "{}", stdout);
}
