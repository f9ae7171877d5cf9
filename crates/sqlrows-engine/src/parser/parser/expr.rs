//! Expression parsing (precedence climbing).

use super::precedence::{binary_op, Precedence};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Parenthesized expressions and call arguments come back through here, so
/// this is where expression depth is counted.
pub fn parse_expr(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary(&mut *p.enter()?, Precedence::LogicalOr)
}

/// Comma-separated expressions (at least one).
pub fn parse_expr_list(p: &mut Parser) -> Result<Vec<Expr>, ParseError> {
    let mut exprs = vec![parse_expr(p)?];
    while p.eat(&Token::Comma) {
        exprs.push(parse_expr(p)?);
    }
    Ok(exprs)
}

fn parse_binary(p: &mut Parser, min: Precedence) -> Result<Expr, ParseError> {
    let mut lhs = parse_unary(p)?;
    while let Some((prec, op)) = binary_op(p.current()) {
        if prec < min {
            break;
        }
        p.advance();
        let next = next_level(prec);
        let rhs = parse_binary(p, next)?;
        let span = lhs.span.to(&rhs.span);
        lhs = Expr {
            id: p.next_id(),
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        };
    }
    Ok(lhs)
}

fn next_level(prec: Precedence) -> Precedence {
    match prec {
        Precedence::LogicalOr => Precedence::LogicalAnd,
        Precedence::LogicalAnd => Precedence::Comparison,
        Precedence::Comparison => Precedence::Additive,
        Precedence::Additive => Precedence::Multiplicative,
        Precedence::Multiplicative | Precedence::Unary => Precedence::Unary,
    }
}

fn parse_unary(p: &mut Parser) -> Result<Expr, ParseError> {
    let op = match p.current() {
        Token::Bang => Some(UnaryOp::Not),
        Token::Minus => Some(UnaryOp::Neg),
        Token::Amp => Some(UnaryOp::Addr),
        Token::Star => Some(UnaryOp::Deref),
        _ => None,
    };
    let Some(op) = op else {
        return parse_postfix(p);
    };
    let start = p.current_span();
    p.advance();
    let operand = parse_unary(&mut *p.enter()?)?;
    let span = start.to(&operand.span);
    Ok(Expr {
        id: p.next_id(),
        kind: ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    })
}

fn parse_postfix(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(p)?;
    loop {
        match p.current() {
            Token::Dot => {
                p.advance();
                if p.check(&Token::LeftParen) {
                    return Err(ParseError::unsupported("type assertion", p.current_span()));
                }
                let field = p.expect_ident()?;
                let span = expr.span.to(&field.span);
                expr = Expr {
                    id: p.next_id(),
                    kind: ExprKind::Selector {
                        base: Box::new(expr),
                        field,
                    },
                    span,
                };
            }
            Token::LeftParen => {
                p.advance();
                let (args, spread) = parse_call_args(p)?;
                let span = expr.span.to(&p.prev_span());
                expr = Expr {
                    id: p.next_id(),
                    kind: ExprKind::Call(CallExpr {
                        func: Box::new(expr),
                        args,
                        spread,
                    }),
                    span,
                };
            }
            Token::LeftBracket => {
                return Err(ParseError::unsupported("index expression", p.current_span()));
            }
            _ => return Ok(expr),
        }
    }
}

/// Arguments after the opening parenthesis, through the closing one.
fn parse_call_args(p: &mut Parser) -> Result<(Vec<Expr>, bool), ParseError> {
    let mut args = Vec::new();
    let mut spread = false;
    while !p.check(&Token::RightParen) {
        args.push(parse_expr(p)?);
        if p.eat(&Token::Ellipsis) {
            spread = true;
            p.eat(&Token::Comma);
            break;
        }
        if !p.eat(&Token::Comma) {
            break;
        }
    }
    p.expect(Token::RightParen)?;
    Ok((args, spread))
}

fn parse_primary(p: &mut Parser) -> Result<Expr, ParseError> {
    let span = p.current_span();
    let kind = match p.current().clone() {
        Token::Identifier(name) => {
            p.advance();
            if p.check(&Token::Colon) {
                return Err(ParseError::unsupported("label", span));
            }
            ExprKind::Ident(name)
        }
        Token::IntLiteral(n) => {
            p.advance();
            ExprKind::IntLit(n)
        }
        Token::FloatLiteral(n) => {
            p.advance();
            ExprKind::FloatLit(n)
        }
        Token::StringLiteral(s) => {
            p.advance();
            ExprKind::StringLit(s)
        }
        Token::LeftParen => {
            p.advance();
            let inner = parse_expr(p)?;
            p.expect(Token::RightParen)?;
            let span = span.to(&p.prev_span());
            return Ok(Expr {
                id: p.next_id(),
                kind: ExprKind::Paren(Box::new(inner)),
                span,
            });
        }
        Token::Func => return Err(ParseError::unsupported("function literal", span)),
        Token::LeftBracket => return Err(ParseError::unsupported("composite literal", span)),
        Token::Struct => return Err(ParseError::unsupported("composite literal", span)),
        _ => return Err(p.unexpected("expression")),
    };
    Ok(Expr {
        id: p.next_id(),
        kind,
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::interner::Interner;
    use crate::parser::parser::ParseErrorKind;
    use crate::parser::token::FileId;

    fn parse(source: &str) -> Result<(Expr, Interner), ParseError> {
        let mut interner = Interner::new();
        let mut ids = NodeIdGen::new();
        let mut parser = Parser::new(source, FileId(0), &mut interner, &mut ids)
            .map_err(|mut e| e.remove(0))?;
        let expr = parse_expr(&mut parser)?;
        Ok((expr, interner))
    }

    #[test]
    fn test_precedence_and_over_or() {
        let (expr, _) = parse("a || b && c").unwrap();
        match expr.kind {
            ExprKind::Binary { op, rhs, .. } => {
                assert_eq!(op, BinaryOp::Or);
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_left_associative_subtraction() {
        let (expr, _) = parse("a - b - c").unwrap();
        match expr.kind {
            ExprKind::Binary { op, lhs, .. } => {
                assert_eq!(op, BinaryOp::Sub);
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_method_call_chain() {
        let (expr, interner) = parse("db.Query(\"SELECT\", args...)").unwrap();
        let call = expr.as_call().unwrap();
        assert!(call.spread);
        assert_eq!(call.args.len(), 2);
        match &call.func.kind {
            ExprKind::Selector { field, .. } => assert_eq!(interner.resolve(field.name), "Query"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comparison_with_nil() {
        let (expr, interner) = parse("err != nil").unwrap();
        match expr.kind {
            ExprKind::Binary { op, rhs, .. } => {
                assert_eq!(op, BinaryOp::Ne);
                assert_eq!(interner.resolve(rhs.as_ident().unwrap().name), "nil");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unary_address_and_not() {
        let (expr, _) = parse("!*&x").unwrap();
        assert!(matches!(expr.kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn test_function_literal_unsupported() {
        let err = parse("func() {}").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Unsupported {
                construct: "function literal"
            }
        ));
    }

    #[test]
    fn test_call_span_covers_arguments() {
        let (expr, _) = parse("f(a, b)").unwrap();
        assert_eq!((expr.span.start, expr.span.end), (0, 7));
    }
}
