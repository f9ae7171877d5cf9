//! Type expression parsing.

use super::decl::parse_signature;
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Whether the current token can begin a type.
pub fn starts_type(token: &Token) -> bool {
    matches!(
        token,
        Token::Identifier(_)
            | Token::Star
            | Token::LeftBracket
            | Token::Struct
            | Token::Interface
            | Token::LeftParen
            | Token::Func
            | Token::Map
            | Token::Chan
    )
}

pub fn parse_type(p: &mut Parser) -> Result<TypeExpr, ParseError> {
    let start = p.current_span();
    match p.current() {
        Token::Identifier(_) => {
            let first = p.expect_ident()?;
            if p.eat(&Token::Dot) {
                let name = p.expect_ident()?;
                let span = first.span.to(&name.span);
                Ok(TypeExpr::Qualified {
                    pkg: first,
                    name,
                    span,
                })
            } else {
                Ok(TypeExpr::Name(first))
            }
        }
        Token::Star => {
            p.advance();
            let inner = parse_type(&mut *p.enter()?)?;
            let span = start.to(&inner.span());
            Ok(TypeExpr::Pointer(Box::new(inner), span))
        }
        Token::LeftBracket => {
            p.advance();
            if !p.check(&Token::RightBracket) {
                return Err(ParseError::unsupported("array type", start));
            }
            p.advance();
            let inner = parse_type(&mut *p.enter()?)?;
            let span = start.to(&inner.span());
            Ok(TypeExpr::Slice(Box::new(inner), span))
        }
        Token::LeftParen => {
            p.advance();
            let inner = parse_type(p)?;
            p.expect(Token::RightParen)?;
            Ok(inner)
        }
        Token::Struct => parse_struct_type(p),
        Token::Interface => parse_interface_type(p),
        Token::Func => Err(ParseError::unsupported("function type", start)),
        _ => Err(p.unexpected("type")),
    }
}

fn parse_struct_type(p: &mut Parser) -> Result<TypeExpr, ParseError> {
    let start = p.current_span();
    p.expect(Token::Struct)?;
    p.expect(Token::LeftBrace)?;
    p.skip_semicolons();
    let mut fields = Vec::new();
    while !p.check(&Token::RightBrace) {
        let field_start = p.current_span();
        if !matches!(p.current(), Token::Identifier(_))
            || matches!(p.peek(), Some(Token::Semicolon | Token::Dot | Token::RightBrace))
        {
            return Err(ParseError::unsupported("embedded field", field_start));
        }
        let mut names = vec![p.expect_ident()?];
        while p.eat(&Token::Comma) {
            names.push(p.expect_ident()?);
        }
        let ty = parse_type(p)?;
        // Struct tags are accepted and ignored.
        if matches!(p.current(), Token::StringLiteral(_)) {
            p.advance();
        }
        let span = field_start.to(&p.prev_span());
        fields.push(FieldDecl { names, ty, span });
        p.expect_semicolon()?;
        p.skip_semicolons();
    }
    p.expect(Token::RightBrace)?;
    Ok(TypeExpr::Struct(fields, start.to(&p.prev_span())))
}

fn parse_interface_type(p: &mut Parser) -> Result<TypeExpr, ParseError> {
    let start = p.current_span();
    p.expect(Token::Interface)?;
    p.expect(Token::LeftBrace)?;
    p.skip_semicolons();
    let mut methods = Vec::new();
    while !p.check(&Token::RightBrace) {
        let method_start = p.current_span();
        if !matches!(p.peek(), Some(Token::LeftParen)) {
            return Err(ParseError::unsupported("embedded interface", method_start));
        }
        let name = p.expect_ident()?;
        let sig = parse_signature(p)?;
        methods.push(InterfaceMethod {
            name,
            span: method_start.to(&sig.span),
            sig,
        });
        p.expect_semicolon()?;
        p.skip_semicolons();
    }
    p.expect(Token::RightBrace)?;
    Ok(TypeExpr::Interface(methods, start.to(&p.prev_span())))
}
