//! sqlrows engine
//!
//! Static analysis of `database/sql` cursor lifecycles for a Go subset.
//!
//! # Pipeline
//!
//! - [`parser`]: logos lexer (with Go semicolon insertion) and a recursive
//!   descent parser producing the AST.
//! - [`types`] and [`checker`]: program-wide type interning, name
//!   resolution, per-package type info.
//! - [`ir`] and [`lower`]: SSA form per function body (basic blocks, phis,
//!   tuple extraction, defer).
//! - [`loader`]: reads a GOPATH-style tree and checks packages in import
//!   order, producing a [`Program`](loader::Program).
//! - [`analysis`]: the two analyzers (close check and ordering check), the
//!   rule registry, configuration and the parallel runner.
//! - [`diagnostic`]: codespan bridge for pretty and JSON output.
//!
//! # Example
//!
//! ```ignore
//! use sqlrows_engine::analysis::Analyzer;
//! use sqlrows_engine::loader::Loader;
//!
//! let program = Loader::new().load_dir("testdata".as_ref())?;
//! let analyzer = Analyzer::new();
//! for report in analyzer.analyze_program(&program, 4) {
//!     for d in report.diagnostics() {
//!         println!("{}: {}", d.rule, d.message);
//!     }
//! }
//! ```

pub mod analysis;
pub mod checker;
pub mod diagnostic;
pub mod ir;
pub mod loader;
pub mod lower;
pub mod parser;
pub mod types;
