use crate::ir::{Callee, Constant, Function, InstrKind, Instruction, StoreTarget, Terminator};
use crate::loader::{Loader, Program, SourceFile};
use crate::parser::ast::BinaryOp;

const SQL: &str = r#"package sql

type DB struct{}

type Rows struct{}

func (db *DB) Query(query string, args ...any) (*Rows, error)

func (rs *Rows) Close() error

func (rs *Rows) Next() bool
"#;

fn load(body: &str) -> Program {
    let src = format!("package a\n\nimport \"database/sql\"\n\n{}", body);
    let program = Loader::new()
        .load_sources(vec![
            SourceFile::new("database/sql", "sql.go", SQL),
            SourceFile::new("a", "a.go", src),
        ])
        .unwrap();
    let a = program.package("a").unwrap();
    assert_eq!(a.error_count(), 0, "{:?} {:?}", a.parse_errors, a.check_errors);
    for f in &a.functions {
        f.validate().unwrap_or_else(|e| panic!("{}: {}", f.name, e));
    }
    program
}

fn function<'p>(program: &'p Program, name: &str) -> &'p Function {
    program
        .package("a")
        .and_then(|p| p.functions.iter().find(|f| f.name == name))
        .unwrap_or_else(|| panic!("no function {}", name))
}

fn instructions(f: &Function) -> impl Iterator<Item = &Instruction> {
    f.blocks().flat_map(|b| b.instructions.iter())
}

fn phi_count(f: &Function) -> usize {
    instructions(f).filter(|i| i.is_phi()).count()
}

#[test]
fn test_tuple_results_are_extracted() {
    let program = load(
        r#"func f(db *sql.DB) {
	_, err := db.Query("q")
	_ = err
}
"#,
    );
    let f = function(&program, "f");
    let kinds: Vec<&InstrKind> = instructions(f).map(|i| &i.kind).collect();
    assert!(matches!(kinds[0], InstrKind::Call(call) if matches!(call.callee, Callee::Method(_))));
    let extracts: Vec<usize> = kinds
        .iter()
        .filter_map(|k| match k {
            InstrKind::Extract { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(extracts, vec![0, 1]);
}

#[test]
fn test_extract_reports_at_the_call() {
    let program = load(
        r#"func f(db *sql.DB) {
	rows, _ := db.Query("q")
	rows.Close()
}
"#,
    );
    let f = function(&program, "f");
    let entry = f.block(f.entry());
    let call_span = entry.instructions[0].span;
    let index = entry
        .instructions
        .iter()
        .position(|i| matches!(i.kind, InstrKind::Extract { index: 0, .. }))
        .unwrap();
    assert_eq!(f.diagnostic_span(f.entry(), index), call_span);
}

#[test]
fn test_defer_keeps_the_receiver() {
    let program = load(
        r#"func f(db *sql.DB) {
	rows, _ := db.Query("q")
	defer rows.Close()
}
"#,
    );
    let f = function(&program, "f");
    let extract = instructions(f)
        .find(|i| matches!(i.kind, InstrKind::Extract { index: 0, .. }))
        .and_then(|i| i.dest)
        .unwrap();
    let deferred = instructions(f)
        .find_map(|i| match &i.kind {
            InstrKind::Defer(call) => Some(call),
            _ => None,
        })
        .unwrap();
    assert_eq!(deferred.receiver, Some(extract));
    assert!(deferred.static_callee().is_some());
}

#[test]
fn test_panic_terminates_and_prunes_dead_code() {
    let program = load(
        r#"func f(x int) int {
	if x > 0 {
		panic("positive")
		x = 2
	}
	return x
	x = 3
}
"#,
    );
    let f = function(&program, "f");
    assert!(f.blocks().any(|b| matches!(b.terminator, Terminator::Panic(_))));
    assert!(f.blocks().all(|b| b.comment != Some("unreachable")));
    // entry, if.then, if.done
    assert_eq!(f.block_count(), 3);
}

#[test]
fn test_if_else_merges_with_phi() {
    let program = load(
        r#"func f(c bool) int {
	x := 1
	if c {
		x = 2
	} else {
		x = 3
	}
	return x
}
"#,
    );
    let f = function(&program, "f");
    let phi = instructions(f)
        .find_map(|i| match &i.kind {
            InstrKind::Phi { edges } => Some(edges),
            _ => None,
        })
        .unwrap();
    assert_eq!(phi.len(), 2);
    assert_eq!(phi_count(f), 1);
}

#[test]
fn test_unchanged_variable_in_loop_has_no_phi() {
    let program = load(
        r#"func f(n int) int {
	k := 10
	for i := 0; i < n; i++ {
		print(k)
	}
	return k
}
"#,
    );
    let f = function(&program, "f");
    // only the induction variable
    assert_eq!(phi_count(f), 1);
}

#[test]
fn test_loop_carried_value_and_break() {
    let program = load(
        r#"func f(db *sql.DB) {
	var rows *sql.Rows
	for {
		rows, _ = db.Query("q")
		if rows.Next() {
			break
		}
		rows.Close()
	}
	rows.Close()
}
"#,
    );
    let f = function(&program, "f");
    let closes = instructions(f)
        .filter(|i| matches!(&i.kind, InstrKind::Call(c) if c.receiver.is_some() && c.args.is_empty()))
        .count();
    // two Close calls plus Next
    assert_eq!(closes, 3);
    assert!(f.blocks().any(|b| b.comment == Some("for.done")));
}

#[test]
fn test_short_circuit_branches() {
    let program = load(
        r#"func f(a bool, b bool) int {
	if a && !b {
		return 1
	}
	ok := a || b
	if ok {
		return 2
	}
	return 3
}
"#,
    );
    let f = function(&program, "f");
    assert!(f.blocks().any(|b| b.comment == Some("cond.true")));
    assert!(f.blocks().any(|b| b.comment == Some("binop.rhs")));
    let returns = f
        .blocks()
        .filter(|b| matches!(b.terminator, Terminator::Return(_)))
        .count();
    assert_eq!(returns, 3);
}

#[test]
fn test_nil_comparison_uses_nil_constant() {
    let program = load(
        r#"func f(db *sql.DB) error {
	rows, err := db.Query("q")
	if err != nil {
		return err
	}
	return rows.Close()
}
"#,
    );
    let f = function(&program, "f");
    let (lhs, rhs) = instructions(f)
        .find_map(|i| match i.kind {
            InstrKind::BinOp {
                op: BinaryOp::Ne,
                lhs,
                rhs,
            } => Some((lhs, rhs)),
            _ => None,
        })
        .unwrap();
    assert!(matches!(
        f.def_instr(lhs).map(|i| &i.kind),
        Some(InstrKind::Extract { index: 1, .. })
    ));
    assert_eq!(f.constant_of(rhs), Some(&Constant::Nil));
    assert!(matches!(
        f.block(f.entry()).terminator,
        Terminator::If { .. }
    ));
}

#[test]
fn test_bare_return_uses_named_results() {
    let program = load(
        r#"func f(db *sql.DB) (rows *sql.Rows, err error) {
	rows, err = db.Query("q")
	return
}
"#,
    );
    let f = function(&program, "f");
    let Terminator::Return(values) = &f.block(f.entry()).terminator else {
        panic!("expected return");
    };
    assert_eq!(values.len(), 2);
    assert!(matches!(
        f.def_instr(values[0]).map(|i| &i.kind),
        Some(InstrKind::Extract { index: 0, .. })
    ));
}

#[test]
fn test_package_var_initializers_lower_to_init() {
    let program = load(
        r#"var limit = 10

func f() int {
	return limit
}
"#,
    );
    let init = function(&program, "init");
    assert!(init.func.is_none());
    assert!(instructions(init).any(|i| matches!(
        i.kind,
        InstrKind::Store {
            target: StoreTarget::Global(_),
            ..
        }
    )));
    let f = function(&program, "f");
    assert!(instructions(f).any(|i| matches!(i.kind, InstrKind::Global(_))));
}

#[test]
fn test_method_names() {
    let program = load(
        r#"type Repo struct {
	db *sql.DB
}

func (r *Repo) Load() {
	rows, _ := r.db.Query("q")
	rows.Close()
}

func (r Repo) Name() string {
	return "repo"
}
"#,
    );
    function(&program, "(*Repo).Load");
    function(&program, "Repo.Name");
}
