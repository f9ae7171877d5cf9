//! Statement parsing.

use super::decl::parse_var_spec;
use super::expr::{parse_expr, parse_expr_list};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

pub fn parse_block(p: &mut Parser) -> Result<Block, ParseError> {
    let start = p.current_span();
    p.expect(Token::LeftBrace)?;
    let stmts = parse_stmt_list(&mut *p.enter()?)?;
    p.expect(Token::RightBrace)?;
    Ok(Block {
        stmts,
        span: start.to(&p.prev_span()),
    })
}

fn parse_stmt_list(p: &mut Parser) -> Result<Vec<Stmt>, ParseError> {
    let mut stmts = Vec::new();
    p.skip_semicolons();
    while !p.check(&Token::RightBrace) && !p.at_eof() {
        stmts.push(parse_stmt(p)?);
        p.expect_semicolon()?;
        p.skip_semicolons();
    }
    Ok(stmts)
}

pub fn parse_stmt(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.current_span();
    match p.current() {
        Token::LeftBrace => Ok(Stmt::Block(parse_block(p)?)),
        Token::Var => {
            p.advance();
            if p.check(&Token::LeftParen) {
                return Err(ParseError::unsupported("grouped local var", start));
            }
            Ok(Stmt::Var(parse_var_spec(p)?))
        }
        Token::Type => Err(ParseError::unsupported("local type declaration", start)),
        Token::Defer => {
            p.advance();
            let call = parse_expr(p)?;
            if !matches!(call.unparen().kind, ExprKind::Call(_)) {
                return Err(ParseError::invalid(
                    "expression in defer must be function call",
                    call.span,
                ));
            }
            Ok(Stmt::Defer(DeferStmt {
                span: start.to(&call.span),
                call,
            }))
        }
        Token::Return => {
            p.advance();
            let values = if matches!(p.current(), Token::Semicolon | Token::RightBrace) {
                Vec::new()
            } else {
                parse_expr_list(p)?
            };
            Ok(Stmt::Return(ReturnStmt {
                values,
                span: start.to(&p.prev_span()),
            }))
        }
        Token::Break => {
            p.advance();
            if matches!(p.current(), Token::Identifier(_)) {
                return Err(ParseError::unsupported("labeled break", start));
            }
            Ok(Stmt::Break(start))
        }
        Token::Continue => {
            p.advance();
            if matches!(p.current(), Token::Identifier(_)) {
                return Err(ParseError::unsupported("labeled continue", start));
            }
            Ok(Stmt::Continue(start))
        }
        Token::If => Ok(Stmt::If(parse_if(p)?)),
        Token::For => Ok(Stmt::For(parse_for(p)?)),
        Token::Semicolon => Ok(Stmt::Empty(start)),
        _ => parse_simple_stmt(p),
    }
}

/// Expression statement, assignment, short variable declaration or
/// increment/decrement.
pub fn parse_simple_stmt(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.current_span();
    let lhs = parse_expr_list(p)?;
    match p.current() {
        Token::Equal | Token::ColonEqual => {
            let op = if p.check(&Token::ColonEqual) {
                AssignOp::Define
            } else {
                AssignOp::Assign
            };
            p.advance();
            if op == AssignOp::Define {
                if let Some(bad) = lhs.iter().find(|e| e.as_ident().is_none()) {
                    return Err(ParseError::invalid(
                        "non-name on left side of :=",
                        bad.span,
                    ));
                }
            }
            let rhs = parse_expr_list(p)?;
            Ok(Stmt::Assign(AssignStmt {
                lhs,
                op,
                rhs,
                span: start.to(&p.prev_span()),
            }))
        }
        Token::PlusPlus | Token::MinusMinus => {
            let increment = p.check(&Token::PlusPlus);
            p.advance();
            let target = single(lhs, "++/--")?;
            Ok(Stmt::IncDec(IncDecStmt {
                target,
                increment,
                span: start.to(&p.prev_span()),
            }))
        }
        _ => {
            let expr = single(lhs, "expression statement")?;
            Ok(Stmt::Expr(ExprStmt {
                span: expr.span,
                expr,
            }))
        }
    }
}

fn single(mut exprs: Vec<Expr>, what: &str) -> Result<Expr, ParseError> {
    if exprs.len() != 1 {
        let span = exprs[1].span;
        return Err(ParseError::invalid(
            format!("expected 1 expression in {}, found {}", what, exprs.len()),
            span,
        ));
    }
    Ok(exprs.remove(0))
}

fn parse_if(p: &mut Parser) -> Result<IfStmt, ParseError> {
    let start = p.current_span();
    p.expect(Token::If)?;
    let first = parse_simple_stmt(p)?;
    let (init, cond) = if p.eat(&Token::Semicolon) {
        (Some(Box::new(first)), parse_expr(p)?)
    } else {
        match first {
            Stmt::Expr(e) => (None, e.expr),
            other => {
                return Err(ParseError::invalid(
                    "cannot use assignment as value",
                    other.span(),
                ))
            }
        }
    };
    let then_block = parse_block(p)?;
    let else_branch = if p.eat(&Token::Else) {
        if p.check(&Token::If) {
            Some(Box::new(Stmt::If(parse_if(p)?)))
        } else if p.check(&Token::LeftBrace) {
            Some(Box::new(Stmt::Block(parse_block(p)?)))
        } else {
            return Err(p.unexpected("'if' or '{'"));
        }
    } else {
        None
    };
    Ok(IfStmt {
        init,
        cond,
        then_block,
        else_branch,
        span: start.to(&p.prev_span()),
    })
}

fn parse_for(p: &mut Parser) -> Result<ForStmt, ParseError> {
    let start = p.current_span();
    p.expect(Token::For)?;
    let mut init = None;
    let mut cond = None;
    let mut post = None;

    if !p.check(&Token::LeftBrace) {
        let first = if p.check(&Token::Semicolon) {
            None
        } else {
            Some(parse_simple_stmt(p)?)
        };
        if p.check(&Token::LeftBrace) {
            match first {
                Some(Stmt::Expr(e)) => cond = Some(e.expr),
                Some(other) => {
                    return Err(ParseError::invalid(
                        "expected for loop condition",
                        other.span(),
                    ))
                }
                None => {}
            }
        } else {
            init = first.map(Box::new);
            p.expect(Token::Semicolon)?;
            if !p.check(&Token::Semicolon) {
                cond = Some(parse_expr(p)?);
            }
            p.expect(Token::Semicolon)?;
            if !p.check(&Token::LeftBrace) {
                post = Some(Box::new(parse_simple_stmt(p)?));
            }
        }
    }

    let body = parse_block(p)?;
    Ok(ForStmt {
        init,
        cond,
        post,
        body,
        span: start.to(&p.prev_span()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::interner::Interner;
    use crate::parser::token::FileId;

    fn body(stmts: &str) -> (Block, Interner) {
        let src = format!("package a\nfunc f() {{\n{}\n}}\n", stmts);
        let mut interner = Interner::new();
        let mut ids = NodeIdGen::new();
        let file = Parser::new(&src, FileId(0), &mut interner, &mut ids)
            .and_then(|p| p.parse_file())
            .unwrap_or_else(|e| panic!("parse failed: {:?}", e));
        let block = file.funcs().next().unwrap().body.clone().unwrap();
        (block, interner)
    }

    #[test]
    fn test_query_defer_then_check() {
        let (block, _) = body(
            "rows, err := db.Query(\"SELECT\")\ndefer rows.Close()\nif err != nil {\n\treturn\n}",
        );
        assert_eq!(block.stmts.len(), 3);
        match &block.stmts[0] {
            Stmt::Assign(a) => {
                assert_eq!(a.op, AssignOp::Define);
                assert_eq!(a.lhs.len(), 2);
                assert_eq!(a.rhs.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(block.stmts[1], Stmt::Defer(_)));
        assert!(matches!(block.stmts[2], Stmt::If(_)));
    }

    #[test]
    fn test_if_with_init_and_else_if() {
        let (block, _) = body("if err := f(); err != nil {\n} else if x {\n} else {\n}");
        match &block.stmts[0] {
            Stmt::If(i) => {
                assert!(i.init.is_some());
                match i.else_branch.as_deref() {
                    Some(Stmt::If(inner)) => assert!(inner.else_branch.is_some()),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_for_forms() {
        let (block, _) = body("for {\n}\nfor rows.Next() {\n}\nfor i := 0; i < 3; i++ {\n}");
        let fors: Vec<_> = block
            .stmts
            .iter()
            .map(|s| match s {
                Stmt::For(f) => (f.init.is_some(), f.cond.is_some(), f.post.is_some()),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            fors,
            vec![(false, false, false), (false, true, false), (true, true, true)]
        );
    }

    #[test]
    fn test_defer_requires_call() {
        let src = "package a\nfunc f() {\ndefer x\n}\n";
        let mut interner = Interner::new();
        let mut ids = NodeIdGen::new();
        let errs = Parser::new(src, FileId(0), &mut interner, &mut ids)
            .and_then(|p| p.parse_file())
            .unwrap_err();
        assert!(errs[0].message.contains("defer"));
    }

    #[test]
    fn test_var_and_assignment_forms() {
        let (block, _) = body("var rows *sql.Rows\nvar err error = nil\nrows, err = db.Query(q)\n_ = rows\nn++");
        assert!(matches!(block.stmts[0], Stmt::Var(VarDecl { ty: Some(_), .. })));
        assert!(matches!(&block.stmts[1], Stmt::Var(v) if v.values.len() == 1));
        assert!(matches!(&block.stmts[2], Stmt::Assign(a) if a.op == AssignOp::Assign));
        assert!(matches!(block.stmts[4], Stmt::IncDec(IncDecStmt { increment: true, .. })));
    }
}
