//! Program loading
//!
//! Reads a GOPATH-style tree (`<root>/src/<import path>/*.go`), parses every
//! package, checks packages in import order and lowers their functions.
//!
//! Package-level problems (syntax and type errors, missing imports) are
//! recorded on the package and never abort loading; only unreadable trees
//! and import cycles are fatal.

mod error;
mod graph;

pub use error::LoadError;
pub use graph::PackageGraph;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use codespan_reporting::files::SimpleFiles;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::checker::{CheckError, Checker, ObjectTable, PackageScope, TypeInfo};
use crate::ir::Function;
use crate::lower::{lower_package, LowerContext};
use crate::parser::ast::{Decl, File};
use crate::parser::{FileId, Interner, NodeIdGen, ParseError, Parser, Symbol};
use crate::types::TypeContext;

/// A checked and lowered package.
#[derive(Debug)]
pub struct Package {
    /// Import path, e.g. `database/sql`
    pub path: String,
    pub path_symbol: Symbol,
    /// Name from the package clause
    pub name: Symbol,
    pub files: Vec<File>,
    pub file_ids: Vec<FileId>,
    pub scope: PackageScope,
    pub info: TypeInfo,
    pub functions: Vec<Function>,
    pub parse_errors: Vec<ParseError>,
    pub check_errors: Vec<CheckError>,
    /// Declarations only: no function has a body
    pub is_stub: bool,
}

impl Package {
    /// Packages with syntax errors are not analyzed.
    pub fn is_broken(&self) -> bool {
        !self.parse_errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.parse_errors.len() + self.check_errors.len()
    }
}

/// Everything loaded from one tree. Types, objects and symbols are shared
/// program wide so identities agree across packages.
pub struct Program {
    pub interner: Interner,
    pub types: TypeContext,
    pub objects: ObjectTable,
    /// Source text by [`FileId`] index, for diagnostics
    pub files: SimpleFiles<String, String>,
    /// In dependency order
    pub packages: Vec<Package>,
}

impl Program {
    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }

}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("packages", &self.packages.iter().map(|p| &p.path).collect::<Vec<_>>())
            .finish()
    }
}

/// One source file handed to [`Loader::load_sources`].
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Import path of the containing package
    pub package: String,
    /// Display name used in diagnostics
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(package: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Loader {
    include_tests: bool,
}

struct ParsedPackage {
    path: String,
    files: Vec<File>,
    file_ids: Vec<FileId>,
    errors: Vec<ParseError>,
    imports: Vec<String>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also load `_test.go` files.
    pub fn with_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    /// Load every package under `<root>/src`.
    pub fn load_dir(&self, root: &Path) -> Result<Program, LoadError> {
        let src = root.join("src");
        let mut paths = Vec::new();
        self.collect_go_files(&src, &mut paths)?;
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let package = path
                .parent()
                .and_then(|dir| dir.strip_prefix(&src).ok())
                .map(|rel| {
                    rel.components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .unwrap_or_default();
            if package.is_empty() {
                continue;
            }
            sources.push(SourceFile::new(package, path.display().to_string(), text));
        }
        if sources.is_empty() {
            return Err(LoadError::NoPackages(src));
        }
        self.load_sources(sources)
    }

    fn collect_go_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
        let io = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };
        for entry in std::fs::read_dir(dir).map_err(io)? {
            let entry = entry.map_err(io)?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if path.is_dir() {
                if !name.starts_with('.') && !name.starts_with('_') {
                    self.collect_go_files(&path, files)?;
                }
            } else if name.ends_with(".go") && (self.include_tests || !name.ends_with("_test.go")) {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Load a program from in-memory sources.
    pub fn load_sources(&self, sources: impl IntoIterator<Item = SourceFile>) -> Result<Program, LoadError> {
        let mut by_package: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
        for source in sources {
            if !self.include_tests && source.name.ends_with("_test.go") {
                continue;
            }
            by_package.entry(source.package.clone()).or_default().push(source);
        }
        if by_package.is_empty() {
            return Err(LoadError::NoPackages(PathBuf::new()));
        }

        let mut interner = Interner::new();
        let mut files = SimpleFiles::new();
        let mut parsed: BTreeMap<String, ParsedPackage> = BTreeMap::new();
        let mut graph = PackageGraph::new();
        for (path, mut sources) in by_package {
            sources.sort_by(|a, b| a.name.cmp(&b.name));
            let package = parse_package(&path, sources, &mut interner, &mut files)?;
            graph.add_package(&path);
            for import in &package.imports {
                graph.add_import(&path, import);
            }
            parsed.insert(path, package);
        }

        let order = graph.topological_order()?;
        debug!(order = ?order, "package order");

        let mut types = TypeContext::new(&mut interner);
        let mut objects = ObjectTable::new(&types, &mut interner);
        let path_symbols: Vec<Symbol> = order.iter().map(|p| interner.intern(p)).collect();

        let mut scopes: FxHashMap<Symbol, PackageScope> = FxHashMap::default();
        let mut packages = Vec::with_capacity(order.len());
        for (path, path_symbol) in order.into_iter().zip(path_symbols) {
            let Some(package) = parsed.remove(&path) else {
                continue;
            };
            let checked = Checker::new(path_symbol, &interner, &mut types, &mut objects, &scopes)
                .check(&package.files);
            scopes.insert(path_symbol, checked.scope.clone());
            let is_stub = !package
                .files
                .iter()
                .flat_map(|f| f.decls.iter())
                .any(|d| matches!(d, Decl::Func(f) if f.body.is_some()));
            debug!(
                package = %path,
                files = package.files.len(),
                parse_errors = package.errors.len(),
                check_errors = checked.errors.len(),
                stub = is_stub,
                "loaded package"
            );
            packages.push(Package {
                path,
                path_symbol,
                name: checked.scope.name,
                files: package.files,
                file_ids: package.file_ids,
                scope: checked.scope,
                info: checked.info,
                functions: Vec::new(),
                parse_errors: package.errors,
                check_errors: checked.errors,
                is_stub,
            });
        }

        for package in &mut packages {
            let cx = LowerContext {
                interner: &interner,
                types: &types,
                objects: &objects,
                info: &package.info,
            };
            package.functions = lower_package(&package.files, cx);
            trace!(package = %package.path, functions = package.functions.len(), "lowered package");
        }

        Ok(Program {
            interner,
            types,
            objects,
            files,
            packages,
        })
    }
}

fn parse_package(
    path: &str,
    sources: Vec<SourceFile>,
    interner: &mut Interner,
    files: &mut SimpleFiles<String, String>,
) -> Result<ParsedPackage, LoadError> {
    let mut ids = NodeIdGen::new();
    let mut package = ParsedPackage {
        path: path.to_string(),
        files: Vec::new(),
        file_ids: Vec::new(),
        errors: Vec::new(),
        imports: Vec::new(),
    };
    let mut clause: Option<(String, String)> = None;
    for source in sources {
        let file_id = FileId(files.add(source.name.clone(), source.text.clone()) as u32);
        let parsed = Parser::new(&source.text, file_id, interner, &mut ids).and_then(|p| p.parse_file());
        match parsed {
            Ok(file) => {
                let name = interner.resolve(file.package.name).to_string();
                match &clause {
                    Some((first, first_file)) if *first != name => {
                        return Err(LoadError::MixedPackages {
                            path: package.path,
                            first: format!("{} ({})", first, first_file),
                            second: format!("{} ({})", name, source.name),
                        });
                    }
                    Some(_) => {}
                    None => clause = Some((name, source.name.clone())),
                }
                for import in &file.imports {
                    let import = interner.resolve(import.path).to_string();
                    if !package.imports.contains(&import) {
                        package.imports.push(import);
                    }
                }
                package.files.push(file);
                package.file_ids.push(file_id);
            }
            Err(errors) => {
                trace!(file = %source.name, errors = errors.len(), "parse failed");
                package.errors.extend(errors);
            }
        }
    }
    Ok(package)
}
