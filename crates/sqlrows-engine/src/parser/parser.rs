//! Recursive descent parser for the Go subset.
//!
//! The whole file is tokenized up front; the parser then walks the token
//! vector with one token of lookahead. Errors inside a declaration are
//! recorded and the parser resynchronizes at the next top-level `func` or
//! `type`, so one file can report several independent errors.

pub mod decl;
pub mod error;
pub mod expr;
pub mod guards;
pub mod precedence;
pub mod stmt;
pub mod types;

use crate::parser::ast::*;
use crate::parser::interner::Interner;
use crate::parser::lexer::Lexer;
use crate::parser::token::{FileId, Span, Token};

pub use error::{ParseError, ParseErrorKind};
pub use guards::{DepthGuard, MAX_DEPTH};

pub struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    errors: Vec<ParseError>,
    ids: &'a mut NodeIdGen,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Tokenize `source` and prepare to parse it. Lexical errors are
    /// returned as parse errors.
    pub fn new(
        source: &str,
        file: FileId,
        interner: &mut Interner,
        ids: &'a mut NodeIdGen,
    ) -> Result<Self, Vec<ParseError>> {
        let tokens = Lexer::new(source, file)
            .tokenize(interner)
            .map_err(|errs| errs.into_iter().map(ParseError::from).collect::<Vec<_>>())?;
        Ok(Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            ids,
            depth: 0,
        })
    }

    /// Parse a complete source file.
    pub fn parse_file(mut self) -> Result<File, Vec<ParseError>> {
        let start = self.current_span();
        self.skip_semicolons();

        let package = match self.parse_package_clause() {
            Ok(ident) => ident,
            Err(err) => return Err(vec![err]),
        };

        let mut imports = Vec::new();
        while self.check(&Token::Import) {
            match decl::parse_import_decl(&mut self) {
                Ok(mut specs) => imports.append(&mut specs),
                Err(err) => {
                    self.errors.push(err);
                    self.sync_to_declaration();
                }
            }
            self.skip_semicolons();
        }

        let mut decls = Vec::new();
        while !self.at_eof() {
            match decl::parse_top_level(&mut self) {
                Ok(mut parsed) => decls.append(&mut parsed),
                Err(err) => {
                    self.errors.push(err);
                    self.sync_to_declaration();
                }
            }
            self.skip_semicolons();
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        let span = start.to(&self.current_span());
        Ok(File {
            package,
            imports,
            decls,
            span,
        })
    }

    fn parse_package_clause(&mut self) -> Result<Ident, ParseError> {
        self.expect(Token::Package)?;
        let name = self.expect_ident()?;
        self.expect_semicolon()?;
        self.skip_semicolons();
        Ok(name)
    }

    // ------------------------------------------------------------------
    // Token management
    // ------------------------------------------------------------------

    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Span of the most recently consumed token.
    pub fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].1
        }
    }

    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(tok, _)| tok)
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Whether the current token has the same kind as `expected`.
    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Consume the current token if it has the kind of `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    pub fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        match self.current() {
            Token::Identifier(name) => {
                let name = *name;
                let span = self.current_span();
                self.advance();
                Ok(Ident {
                    id: self.next_id(),
                    name,
                    span,
                })
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// A statement or declaration terminator. Go lets the semicolon be
    /// omitted before a closing `)` or `}`.
    pub fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semicolon) {
            return Ok(());
        }
        if matches!(self.current(), Token::RightBrace | Token::RightParen | Token::Eof) {
            return Ok(());
        }
        Err(self.unexpected("';' or newline"))
    }

    pub fn skip_semicolons(&mut self) {
        while self.eat(&Token::Semicolon) {}
    }

    pub fn next_id(&mut self) -> NodeId {
        self.ids.next_id()
    }

    // ------------------------------------------------------------------
    // Errors and limits
    // ------------------------------------------------------------------

    /// An "unexpected token" error at the current position.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        let span = self.current_span();
        if let Some(kw) = self.current().unsupported_keyword() {
            return ParseError::unsupported(kw, span);
        }
        if self.at_eof() {
            ParseError::unexpected_eof(expected, span)
        } else {
            ParseError::unexpected_token(expected, self.current().clone(), span)
        }
    }

    /// Enter one level of nesting; parse the nested construct through the
    /// returned guard.
    pub fn enter(&mut self) -> Result<DepthGuard<'_, 'a>, ParseError> {
        DepthGuard::new(self)
    }

    /// Skip ahead to the next top-level `func` or `type` that starts a
    /// line, or end of file.
    fn sync_to_declaration(&mut self) {
        self.advance();
        while !self.at_eof() {
            let after_break = self.pos > 0 && matches!(self.tokens[self.pos - 1].0, Token::Semicolon);
            if after_break && matches!(self.current(), Token::Func | Token::Type) {
                return;
            }
            self.advance();
        }
    }
}
