//! Token definitions for the Go subset.

use std::fmt;

use crate::parser::interner::Symbol;

/// A token of the Go subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Declarations
    Package,
    Import,
    Func,
    Type,
    Var,
    Struct,
    Interface,

    // Control flow
    If,
    Else,
    For,
    Return,
    Defer,
    Break,
    Continue,

    // Keywords the parser recognizes only to reject them
    Const,
    Go,
    Switch,
    Select,
    Case,
    Default,
    Range,
    Chan,
    Map,
    Goto,
    Fallthrough,

    // Literals
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(Symbol),

    // Identifiers (including `_`, `nil`, `true`, `false`)
    Identifier(Symbol),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logical
    AmpAmp,
    PipePipe,
    Bang,

    // Address
    Amp,

    // Assignment
    Equal,
    ColonEqual,
    PlusPlus,
    MinusMinus,

    // Punctuation
    Dot,
    Ellipsis,
    Comma,
    Colon,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    Eof,
}

impl Token {
    /// Whether a newline directly after this token inserts a semicolon.
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::IntLiteral(_)
                | Token::FloatLiteral(_)
                | Token::StringLiteral(_)
                | Token::Return
                | Token::Break
                | Token::Continue
                | Token::Fallthrough
                | Token::PlusPlus
                | Token::MinusMinus
                | Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
        )
    }

    /// Keyword text for keywords the subset does not support.
    pub fn unsupported_keyword(&self) -> Option<&'static str> {
        Some(match self {
            Token::Const => "const",
            Token::Go => "go",
            Token::Switch => "switch",
            Token::Select => "select",
            Token::Case => "case",
            Token::Default => "default",
            Token::Range => "range",
            Token::Chan => "chan",
            Token::Map => "map",
            Token::Goto => "goto",
            Token::Fallthrough => "fallthrough",
            _ => return None,
        })
    }
}

/// Identifies a source file within a loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source location: byte range plus the 1-based line/column of its start.
///
/// Ordering is by file, then offset, which is the order diagnostics are
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(file: FileId, start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            file,
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            file: self.file,
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kw) = self.unsupported_keyword() {
            return write!(f, "'{}'", kw);
        }
        let text = match self {
            Token::Package => "'package'",
            Token::Import => "'import'",
            Token::Func => "'func'",
            Token::Type => "'type'",
            Token::Var => "'var'",
            Token::Struct => "'struct'",
            Token::Interface => "'interface'",
            Token::If => "'if'",
            Token::Else => "'else'",
            Token::For => "'for'",
            Token::Return => "'return'",
            Token::Defer => "'defer'",
            Token::Break => "'break'",
            Token::Continue => "'continue'",
            Token::IntLiteral(n) => return write!(f, "integer {}", n),
            Token::FloatLiteral(n) => return write!(f, "float {}", n),
            Token::StringLiteral(_) => "string literal",
            Token::Identifier(_) => "identifier",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::EqualEqual => "'=='",
            Token::BangEqual => "'!='",
            Token::Less => "'<'",
            Token::LessEqual => "'<='",
            Token::Greater => "'>'",
            Token::GreaterEqual => "'>='",
            Token::AmpAmp => "'&&'",
            Token::PipePipe => "'||'",
            Token::Bang => "'!'",
            Token::Amp => "'&'",
            Token::Equal => "'='",
            Token::ColonEqual => "':='",
            Token::PlusPlus => "'++'",
            Token::MinusMinus => "'--'",
            Token::Dot => "'.'",
            Token::Ellipsis => "'...'",
            Token::Comma => "','",
            Token::Colon => "':'",
            Token::Semicolon => "';'",
            Token::LeftParen => "'('",
            Token::RightParen => "')'",
            Token::LeftBrace => "'{'",
            Token::RightBrace => "'}'",
            Token::LeftBracket => "'['",
            Token::RightBracket => "']'",
            Token::Eof => "end of file",
            _ => "keyword",
        };
        f.write_str(text)
    }
}
