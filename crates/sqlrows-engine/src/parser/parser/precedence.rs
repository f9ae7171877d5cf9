//! Binary operator precedence, following the Go specification.

use crate::parser::ast::BinaryOp;
use crate::parser::token::Token;

/// Operator precedence level (higher binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    LogicalOr = 1,
    LogicalAnd = 2,
    Comparison = 3,
    Additive = 4,
    Multiplicative = 5,
    /// Above every binary operator; operands only.
    Unary = 6,
}

/// Precedence and operator for a binary operator token. All Go binary
/// operators are left-associative.
pub fn binary_op(token: &Token) -> Option<(Precedence, BinaryOp)> {
    Some(match token {
        Token::PipePipe => (Precedence::LogicalOr, BinaryOp::Or),
        Token::AmpAmp => (Precedence::LogicalAnd, BinaryOp::And),
        Token::EqualEqual => (Precedence::Comparison, BinaryOp::Eq),
        Token::BangEqual => (Precedence::Comparison, BinaryOp::Ne),
        Token::Less => (Precedence::Comparison, BinaryOp::Lt),
        Token::LessEqual => (Precedence::Comparison, BinaryOp::Le),
        Token::Greater => (Precedence::Comparison, BinaryOp::Gt),
        Token::GreaterEqual => (Precedence::Comparison, BinaryOp::Ge),
        Token::Plus => (Precedence::Additive, BinaryOp::Add),
        Token::Minus => (Precedence::Additive, BinaryOp::Sub),
        Token::Star => (Precedence::Multiplicative, BinaryOp::Mul),
        Token::Slash => (Precedence::Multiplicative, BinaryOp::Div),
        Token::Percent => (Precedence::Multiplicative, BinaryOp::Rem),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_precedence_levels() {
        let (or, _) = binary_op(&Token::PipePipe).unwrap();
        let (and, _) = binary_op(&Token::AmpAmp).unwrap();
        let (ne, _) = binary_op(&Token::BangEqual).unwrap();
        let (mul, _) = binary_op(&Token::Star).unwrap();
        assert!(or < and && and < ne && ne < mul);
        assert!(binary_op(&Token::Equal).is_none());
    }
}
