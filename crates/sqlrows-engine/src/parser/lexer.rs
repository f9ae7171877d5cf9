//! Lexer for the Go subset.
//!
//! Built on logos. Whitespace and comments are skipped by hand so that
//! newlines can drive Go's automatic semicolon insertion: a newline (or end
//! of file) after a token that can end a statement produces a `;` token.

use logos::Logos;
use thiserror::Error;

use crate::parser::interner::Interner;
use crate::parser::token::{FileId, Span, Token};

#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("func")]
    Func,
    #[token("type")]
    Type,
    #[token("var")]
    Var,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("defer")]
    Defer,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("const")]
    Const,
    #[token("go")]
    Go,
    #[token("switch")]
    Switch,
    #[token("select")]
    Select,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("range")]
    Range,
    #[token("chan")]
    Chan,
    #[token("map")]
    Map,
    #[token("goto")]
    Goto,
    #[token("fallthrough")]
    Fallthrough,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"0[xX][0-9a-fA-F]+(_[0-9a-fA-F]+)*", parse_hex)]
    #[regex(r"[0-9]+(_[0-9]+)*", parse_int)]
    IntLiteral(i64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    FloatLiteral(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[regex(r"`[^`]*`", parse_raw_string)]
    StringLiteral(String),

    #[token("...")]
    Ellipsis,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token(":=")]
    ColonEqual,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("=")]
    Equal,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
}

fn parse_hex(lex: &mut logos::Lexer<LogosToken>) -> Option<i64> {
    let s = lex.slice()[2..].replace('_', "");
    i64::from_str_radix(&s, 16).ok()
}

fn parse_int(lex: &mut logos::Lexer<LogosToken>) -> Option<i64> {
    lex.slice().replace('_', "").parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<LogosToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let s = lex.slice();
    Some(unescape(&s[1..s.len() - 1]))
}

fn parse_raw_string(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let s = lex.slice();
    Some(s[1..s.len() - 1].to_string())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Errors produced while tokenizing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, span: Span },

    #[error("string literal not terminated")]
    UnterminatedString { span: Span },

    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

/// Tokenizer for one source file.
pub struct Lexer<'a> {
    source: &'a str,
    file: FileId,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: FileId) -> Self {
        Self {
            source,
            file,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the whole file. The returned stream always ends with `Eof`.
    pub fn tokenize(
        mut self,
        interner: &mut Interner,
    ) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let bytes = self.source.as_bytes();
        let mut pos = 0;
        let mut line = 1u32;
        let mut column = 1u32;

        while pos < bytes.len() {
            // Whitespace and comments. Newlines (including those inside
            // block comments) may terminate the previous statement.
            let mut saw_newline_at: Option<Span> = None;
            while pos < bytes.len() {
                match bytes[pos] {
                    b' ' | b'\t' | b'\r' => {
                        pos += 1;
                        column += 1;
                    }
                    b'\n' => {
                        saw_newline_at
                            .get_or_insert(Span::new(self.file, pos, pos + 1, line, column));
                        pos += 1;
                        line += 1;
                        column = 1;
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => {
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            pos += 1;
                            column += 1;
                        }
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'*' => {
                        pos += 2;
                        column += 2;
                        while pos < bytes.len() {
                            if bytes[pos] == b'*' && pos + 1 < bytes.len() && bytes[pos + 1] == b'/'
                            {
                                pos += 2;
                                column += 2;
                                break;
                            }
                            if bytes[pos] == b'\n' {
                                saw_newline_at
                                    .get_or_insert(Span::new(self.file, pos, pos + 1, line, column));
                                line += 1;
                                column = 1;
                            } else {
                                column += 1;
                            }
                            pos += 1;
                        }
                    }
                    _ => break,
                }
            }

            if let Some(span) = saw_newline_at {
                self.insert_semicolon(span);
            }
            if pos >= bytes.len() {
                break;
            }

            let mut logos_lexer = LogosToken::lexer(&self.source[pos..]);
            let Some(result) = logos_lexer.next() else {
                break;
            };
            let range = logos_lexer.span();
            let start = pos + range.start;
            let end = pos + range.end;
            let span = Span::new(self.file, start, end, line, column);

            match result {
                Ok(tok) => {
                    let token = convert(tok, interner);
                    self.tokens.push((token, span));
                }
                Err(()) => {
                    let ch = self.source[start..].chars().next().unwrap_or('\0');
                    let err = match ch {
                        '"' | '`' => LexError::UnterminatedString { span },
                        '0'..='9' => LexError::InvalidNumber {
                            text: self.source[start..end].to_string(),
                            span,
                        },
                        _ => LexError::UnexpectedCharacter { ch, span },
                    };
                    self.errors.push(err);
                }
            }

            // Advance at least one character so a lexing error cannot stall.
            let consumed_end = if end > start {
                end
            } else {
                start + self.source[start..].chars().next().map_or(1, char::len_utf8)
            };
            for c in self.source[start..consumed_end].chars() {
                if c == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
            }
            pos = consumed_end;
        }

        let eof = Span::new(self.file, self.source.len(), self.source.len(), line, column);
        self.insert_semicolon(eof);
        self.tokens.push((Token::Eof, eof));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn insert_semicolon(&mut self, span: Span) {
        if let Some((last, _)) = self.tokens.last() {
            if last.ends_statement() {
                self.tokens.push((Token::Semicolon, span));
            }
        }
    }
}

fn convert(tok: LogosToken, interner: &mut Interner) -> Token {
    match tok {
        LogosToken::Package => Token::Package,
        LogosToken::Import => Token::Import,
        LogosToken::Func => Token::Func,
        LogosToken::Type => Token::Type,
        LogosToken::Var => Token::Var,
        LogosToken::Struct => Token::Struct,
        LogosToken::Interface => Token::Interface,
        LogosToken::If => Token::If,
        LogosToken::Else => Token::Else,
        LogosToken::For => Token::For,
        LogosToken::Return => Token::Return,
        LogosToken::Defer => Token::Defer,
        LogosToken::Break => Token::Break,
        LogosToken::Continue => Token::Continue,
        LogosToken::Const => Token::Const,
        LogosToken::Go => Token::Go,
        LogosToken::Switch => Token::Switch,
        LogosToken::Select => Token::Select,
        LogosToken::Case => Token::Case,
        LogosToken::Default => Token::Default,
        LogosToken::Range => Token::Range,
        LogosToken::Chan => Token::Chan,
        LogosToken::Map => Token::Map,
        LogosToken::Goto => Token::Goto,
        LogosToken::Fallthrough => Token::Fallthrough,
        LogosToken::Identifier(s) => Token::Identifier(interner.intern(&s)),
        LogosToken::IntLiteral(n) => Token::IntLiteral(n),
        LogosToken::FloatLiteral(n) => Token::FloatLiteral(n),
        LogosToken::StringLiteral(s) => Token::StringLiteral(interner.intern(&s)),
        LogosToken::Ellipsis => Token::Ellipsis,
        LogosToken::EqualEqual => Token::EqualEqual,
        LogosToken::BangEqual => Token::BangEqual,
        LogosToken::LessEqual => Token::LessEqual,
        LogosToken::GreaterEqual => Token::GreaterEqual,
        LogosToken::AmpAmp => Token::AmpAmp,
        LogosToken::PipePipe => Token::PipePipe,
        LogosToken::ColonEqual => Token::ColonEqual,
        LogosToken::PlusPlus => Token::PlusPlus,
        LogosToken::MinusMinus => Token::MinusMinus,
        LogosToken::Plus => Token::Plus,
        LogosToken::Minus => Token::Minus,
        LogosToken::Star => Token::Star,
        LogosToken::Slash => Token::Slash,
        LogosToken::Percent => Token::Percent,
        LogosToken::Less => Token::Less,
        LogosToken::Greater => Token::Greater,
        LogosToken::Bang => Token::Bang,
        LogosToken::Amp => Token::Amp,
        LogosToken::Equal => Token::Equal,
        LogosToken::Dot => Token::Dot,
        LogosToken::Comma => Token::Comma,
        LogosToken::Colon => Token::Colon,
        LogosToken::Semicolon => Token::Semicolon,
        LogosToken::LeftParen => Token::LeftParen,
        LogosToken::RightParen => Token::RightParen,
        LogosToken::LeftBrace => Token::LeftBrace,
        LogosToken::RightBrace => Token::RightBrace,
        LogosToken::LeftBracket => Token::LeftBracket,
        LogosToken::RightBracket => Token::RightBracket,
    }
}
