//! Lexer and parser for the Go subset analyzed by sqlrows.
//!
//! # Example
//!
//! ```ignore
//! use sqlrows_engine::parser::{FileId, Interner, NodeIdGen, Parser};
//!
//! let mut interner = Interner::new();
//! let mut ids = NodeIdGen::new();
//! let file = Parser::new("package a\n", FileId(0), &mut interner, &mut ids)?
//!     .parse_file()?;
//! assert!(file.decls.is_empty());
//! ```

pub mod ast;
pub mod interner;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod token;

pub use ast::{NodeId, NodeIdGen};
pub use interner::{Interner, Symbol};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use token::{FileId, Span, Token};
