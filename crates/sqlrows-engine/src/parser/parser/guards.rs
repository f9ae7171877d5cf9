//! Recursion depth guard.

use std::ops::{Deref, DerefMut};

use super::{ParseError, Parser};

/// Maximum nesting of blocks, expressions and types.
///
/// Each level costs several frames of the recursive descent; in debug
/// builds the default 2 MB thread stack holds a few hundred levels, so the
/// limit stays well below that.
pub const MAX_DEPTH: usize = 64;

/// One level of nesting, given back on drop. Derefs to the parser so the
/// nested parse runs through the guard.
pub struct DepthGuard<'p, 'a> {
    parser: &'p mut Parser<'a>,
}

impl<'p, 'a> DepthGuard<'p, 'a> {
    pub(super) fn new(parser: &'p mut Parser<'a>) -> Result<Self, ParseError> {
        parser.depth += 1;
        if parser.depth > MAX_DEPTH {
            parser.depth -= 1;
            return Err(ParseError::nesting_too_deep(parser.current_span()));
        }
        Ok(Self { parser })
    }
}

impl<'a> Deref for DepthGuard<'_, 'a> {
    type Target = Parser<'a>;

    fn deref(&self) -> &Parser<'a> {
        self.parser
    }
}

impl<'a> DerefMut for DepthGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Parser<'a> {
        self.parser
    }
}

impl Drop for DepthGuard<'_, '_> {
    fn drop(&mut self) {
        self.parser.depth -= 1;
    }
}
