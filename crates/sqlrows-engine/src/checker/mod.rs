//! Type checker for the Go subset.
//!
//! Checks one package at a time against the exported scopes of the packages
//! it imports, producing a [`TypeInfo`] keyed by AST node ids:
//!
//! - expression types (calls returning several results get a tuple type),
//! - identifier definitions and uses, resolved to program-wide objects,
//! - what each selector denotes (package member, field, method),
//! - the package's direct imports.
//!
//! Errors are collected and never abort checking.

#[allow(clippy::module_inception)]
pub mod checker;
pub mod error;
mod expr;
pub mod info;
pub mod objects;
pub mod scope;
mod stmt;

pub use checker::{CheckedPackage, Checker};
pub use error::CheckError;
pub use info::{Selection, TypeInfo};
pub use objects::{Builtin, Object, ObjectId, ObjectKind, ObjectTable, PackageScope};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::*;
    use crate::parser::{FileId, Interner, NodeIdGen, Parser, Symbol};
    use crate::types::{Type, TypeContext};
    use rustc_hash::FxHashMap;

    const SQL: &str = r#"package sql

type DB struct{}
type Rows struct{}

func Open(driver, dsn string) (*DB, error)
func (db *DB) Query(query string, args ...any) (*Rows, error)
func (rs *Rows) Close() error
func (rs *Rows) Next() bool
func (rs *Rows) Err() error
func driverName() string
"#;

    struct World {
        interner: Interner,
        types: TypeContext,
        objects: ObjectTable,
        scopes: FxHashMap<Symbol, PackageScope>,
    }

    impl World {
        fn new() -> Self {
            let mut interner = Interner::new();
            let types = TypeContext::new(&mut interner);
            let objects = ObjectTable::new(&types, &mut interner);
            let mut world = World {
                interner,
                types,
                objects,
                scopes: FxHashMap::default(),
            };
            let (_, checked) = world.check("database/sql", SQL);
            assert!(checked.errors.is_empty(), "{:?}", checked.errors);
            world
        }

        fn check(&mut self, path: &str, source: &str) -> (File, CheckedPackage) {
            let mut ids = NodeIdGen::new();
            let file = Parser::new(source, FileId(0), &mut self.interner, &mut ids)
                .and_then(|p| p.parse_file())
                .unwrap_or_else(|e| panic!("parse failed: {:?}", e));
            let path = self.interner.intern(path);
            let checked = Checker::new(
                path,
                &self.interner,
                &mut self.types,
                &mut self.objects,
                &self.scopes,
            )
            .check(std::slice::from_ref(&file));
            self.scopes.insert(path, checked.scope.clone());
            (file, checked)
        }
    }

    fn body(file: &File) -> &Block {
        file.funcs().find(|f| f.body.is_some()).unwrap().body.as_ref().unwrap()
    }

    #[test]
    fn test_query_call_gets_tuple_type() {
        let mut world = World::new();
        let (file, checked) = world.check(
            "a",
            "package a\nimport \"database/sql\"\nfunc f(db *sql.DB) {\n\trows, err := db.Query(\"q\")\n\t_ = err\n\trows.Close()\n}\n",
        );
        assert!(checked.errors.is_empty(), "{:?}", checked.errors);
        let Stmt::Assign(assign) = &body(&file).stmts[0] else { panic!() };
        let call = &assign.rhs[0];
        let ty = checked.info.type_of(call.id).unwrap();
        let elems = world.types.tuple_elems(ty).unwrap().to_vec();
        assert_eq!(world.types.display(elems[0], &world.interner), "*sql.Rows");
        assert_eq!(elems[1], world.types.error_type());

        let callee = &call.as_call().unwrap().func;
        assert!(matches!(
            checked.info.selection(callee.id),
            Some(Selection::Method { through_pointer: true, .. })
        ));
        let sig = checked.info.type_of(callee.id).unwrap();
        assert!(matches!(world.types.get(sig), Type::Signature(s) if s.results.len() == 2));
    }

    #[test]
    fn test_define_reuses_existing_variable() {
        let mut world = World::new();
        let (file, checked) = world.check(
            "a",
            "package a\nimport \"database/sql\"\nfunc f(db *sql.DB) error {\n\trows, err := db.Query(\"q\")\n\trows2, err := db.Query(\"q\")\n\trows.Close()\n\trows2.Close()\n\treturn err\n}\n",
        );
        assert!(checked.errors.is_empty(), "{:?}", checked.errors);
        let stmts = &body(&file).stmts;
        let (Stmt::Assign(a), Stmt::Assign(b)) = (&stmts[0], &stmts[1]) else { panic!() };
        let first_err = checked.info.object_of(a.lhs[1].id).unwrap();
        let second_err = checked.info.object_of(b.lhs[1].id).unwrap();
        assert_eq!(first_err, second_err);
        assert_ne!(
            checked.info.object_of(a.lhs[0].id),
            checked.info.object_of(b.lhs[0].id)
        );
    }

    #[test]
    fn test_errors_are_collected() {
        let mut world = World::new();
        let (_, checked) = world.check(
            "a",
            "package a\nimport \"database/sql\"\nfunc f(db *sql.DB) {\n\tx := undefinedName\n\tdb.Missing()\n\tsql.driverName()\n\tbreak\n}\n",
        );
        let codes: Vec<_> = checked.errors.iter().map(|e| e.code()).collect();
        assert!(codes.contains(&"E1001"), "{:?}", checked.errors);
        assert!(codes.contains(&"E1006"), "{:?}", checked.errors);
        assert!(codes.contains(&"E1005"), "{:?}", checked.errors);
        assert!(codes.contains(&"E1017"), "{:?}", checked.errors);
    }

    #[test]
    fn test_single_value_context() {
        let mut world = World::new();
        let (_, checked) = world.check(
            "a",
            "package a\nimport \"database/sql\"\nfunc f(db *sql.DB) {\n\tx := db.Query(\"q\")\n\t_ = x\n}\n",
        );
        assert!(checked
            .errors
            .iter()
            .any(|e| matches!(e, CheckError::AssignmentMismatch { .. } | CheckError::MultiValue { .. })));
    }

    #[test]
    fn test_error_interface_satisfied_by_method() {
        let mut world = World::new();
        let (_, checked) = world.check(
            "a",
            "package a\ntype myErr struct{}\nfunc (e *myErr) Error() string { return \"x\" }\nfunc f(p *myErr, v myErr) error {\n\tvar err error = p\n\tif err != nil {\n\t\treturn err\n\t}\n\treturn v\n}\n",
        );
        assert_eq!(checked.errors.len(), 1, "{:?}", checked.errors);
        assert!(matches!(checked.errors[0], CheckError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unknown_import_reported() {
        let mut world = World::new();
        let (_, checked) = world.check("a", "package a\nimport \"nope/pkg\"\n");
        assert!(matches!(checked.errors[0], CheckError::UnknownImport { .. }));
        assert_eq!(checked.info.imports.len(), 1);
    }
}
