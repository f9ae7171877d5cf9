//! Top-level declarations: imports, functions, types and variables.

use super::expr::parse_expr_list;
use super::stmt::parse_block;
use super::types::{parse_type, starts_type};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// `import "p"` or a parenthesized group of import specs.
pub fn parse_import_decl(p: &mut Parser) -> Result<Vec<ImportSpec>, ParseError> {
    p.expect(Token::Import)?;
    let mut specs = Vec::new();
    if p.eat(&Token::LeftParen) {
        p.skip_semicolons();
        while !p.check(&Token::RightParen) {
            specs.push(parse_import_spec(p)?);
            p.expect_semicolon()?;
            p.skip_semicolons();
        }
        p.expect(Token::RightParen)?;
    } else {
        specs.push(parse_import_spec(p)?);
    }
    p.expect_semicolon()?;
    Ok(specs)
}

fn parse_import_spec(p: &mut Parser) -> Result<ImportSpec, ParseError> {
    let start = p.current_span();
    let name = match p.current() {
        Token::Identifier(_) => Some(p.expect_ident()?),
        Token::Dot => return Err(ParseError::unsupported("dot import", start)),
        _ => None,
    };
    match p.current().clone() {
        Token::StringLiteral(path) => {
            let path_span = p.current_span();
            p.advance();
            Ok(ImportSpec {
                name,
                path,
                path_span,
                span: start.to(&path_span),
            })
        }
        _ => Err(p.unexpected("import path")),
    }
}

/// One top-level declaration. Grouped `type (...)` and `var (...)` forms
/// yield several declarations.
pub fn parse_top_level(p: &mut Parser) -> Result<Vec<Decl>, ParseError> {
    match p.current() {
        Token::Func => {
            let decl = parse_func_decl(p)?;
            p.expect_semicolon()?;
            Ok(vec![Decl::Func(decl)])
        }
        Token::Type => {
            p.advance();
            let decls = parse_group(p, parse_type_spec)?;
            Ok(decls.into_iter().map(Decl::Type).collect())
        }
        Token::Var => {
            p.advance();
            let decls = parse_group(p, parse_var_spec)?;
            Ok(decls.into_iter().map(Decl::Var).collect())
        }
        Token::Import => Err(ParseError::invalid(
            "imports must appear before other declarations",
            p.current_span(),
        )),
        _ => Err(p.unexpected("declaration")),
    }
}

/// Either a single spec or `( spec; spec; ... )`, followed by a terminator.
pub fn parse_group<T>(
    p: &mut Parser,
    mut spec: impl FnMut(&mut Parser) -> Result<T, ParseError>,
) -> Result<Vec<T>, ParseError> {
    let mut items = Vec::new();
    if p.eat(&Token::LeftParen) {
        p.skip_semicolons();
        while !p.check(&Token::RightParen) {
            items.push(spec(p)?);
            p.expect_semicolon()?;
            p.skip_semicolons();
        }
        p.expect(Token::RightParen)?;
    } else {
        items.push(spec(p)?);
    }
    p.expect_semicolon()?;
    Ok(items)
}

fn parse_type_spec(p: &mut Parser) -> Result<TypeDecl, ParseError> {
    let start = p.current_span();
    let name = p.expect_ident()?;
    if p.check(&Token::Equal) {
        return Err(ParseError::unsupported("type alias", p.current_span()));
    }
    if p.check(&Token::LeftBracket) && matches!(p.peek(), Some(Token::Identifier(_))) {
        return Err(ParseError::unsupported("generic type", p.current_span()));
    }
    let ty = parse_type(p)?;
    Ok(TypeDecl {
        name,
        span: start.to(&ty.span()),
        ty,
    })
}

/// `a, b [T] [= x, y]`, shared by top-level and local `var`.
pub fn parse_var_spec(p: &mut Parser) -> Result<VarDecl, ParseError> {
    let start = p.current_span();
    let mut names = vec![p.expect_ident()?];
    while p.eat(&Token::Comma) {
        names.push(p.expect_ident()?);
    }
    let ty = if p.check(&Token::Equal) {
        None
    } else {
        Some(parse_type(p)?)
    };
    let values = if p.eat(&Token::Equal) {
        parse_expr_list(p)?
    } else {
        Vec::new()
    };
    if ty.is_none() && values.is_empty() {
        return Err(p.unexpected("type or '='"));
    }
    Ok(VarDecl {
        names,
        ty,
        values,
        span: start.to(&p.prev_span()),
    })
}

pub fn parse_func_decl(p: &mut Parser) -> Result<FuncDecl, ParseError> {
    let start = p.current_span();
    p.expect(Token::Func)?;
    let recv = if p.check(&Token::LeftParen) {
        Some(parse_receiver(p)?)
    } else {
        None
    };
    let name = p.expect_ident()?;
    if p.check(&Token::LeftBracket) {
        return Err(ParseError::unsupported("generic function", p.current_span()));
    }
    let sig = parse_signature(p)?;
    let body = if p.check(&Token::LeftBrace) {
        Some(parse_block(p)?)
    } else {
        None
    };
    Ok(FuncDecl {
        recv,
        name,
        sig,
        body,
        span: start.to(&p.prev_span()),
    })
}

fn parse_receiver(p: &mut Parser) -> Result<Receiver, ParseError> {
    let start = p.current_span();
    p.expect(Token::LeftParen)?;
    let name = if matches!(p.current(), Token::Identifier(_))
        && matches!(p.peek(), Some(Token::Identifier(_) | Token::Star))
    {
        Some(p.expect_ident()?)
    } else {
        None
    };
    let pointer = p.eat(&Token::Star);
    let type_name = p.expect_ident()?;
    p.expect(Token::RightParen)?;
    Ok(Receiver {
        name,
        pointer,
        type_name,
        span: start.to(&p.prev_span()),
    })
}

/// `(params) [results]`
pub fn parse_signature(p: &mut Parser) -> Result<FuncSig, ParseError> {
    let start = p.current_span();
    let params = parse_param_list(p)?;
    let results = if p.check(&Token::LeftParen) {
        parse_param_list(p)?
    } else if starts_type(p.current()) {
        let ty = parse_type(p)?;
        vec![Param {
            name: None,
            span: ty.span(),
            ty,
            variadic: false,
        }]
    } else {
        Vec::new()
    };
    if results.iter().any(|r| r.variadic) {
        return Err(ParseError::invalid("results cannot be variadic", start));
    }
    Ok(FuncSig {
        params,
        results,
        span: start.to(&p.prev_span()),
    })
}

enum Entry {
    /// A lone identifier: a parameter name or a type name, decided later
    Bare(Ident),
    Named(Ident, TypeExpr, bool),
    Type(TypeExpr, bool),
}

/// Parenthesized parameter list. Go allows either all-named parameters
/// with grouped names (`a, b int`) or all-unnamed types (`int, string`);
/// which one applies is only known at the end of the list.
fn parse_param_list(p: &mut Parser) -> Result<Vec<Param>, ParseError> {
    let open = p.current_span();
    p.expect(Token::LeftParen)?;
    let mut entries = Vec::new();
    while !p.check(&Token::RightParen) {
        let entry = if p.eat(&Token::Ellipsis) {
            Entry::Type(parse_type(p)?, true)
        } else if matches!(p.current(), Token::Identifier(_)) {
            match p.peek() {
                Some(Token::Dot) => Entry::Type(parse_type(p)?, false),
                Some(Token::Comma | Token::RightParen) => Entry::Bare(p.expect_ident()?),
                Some(Token::Ellipsis) => {
                    let name = p.expect_ident()?;
                    p.advance();
                    Entry::Named(name, parse_type(p)?, true)
                }
                Some(tok) if starts_type(tok) => {
                    let name = p.expect_ident()?;
                    Entry::Named(name, parse_type(p)?, false)
                }
                _ => {
                    p.advance();
                    return Err(p.unexpected("',' or ')'"));
                }
            }
        } else {
            Entry::Type(parse_type(p)?, false)
        };
        entries.push(entry);
        if !p.eat(&Token::Comma) {
            break;
        }
    }
    p.expect(Token::RightParen)?;

    let named = entries.iter().any(|e| matches!(e, Entry::Named(..)));
    let mut params = Vec::new();
    if named {
        let mut pending = Vec::new();
        for entry in entries {
            match entry {
                Entry::Bare(name) => pending.push(name),
                Entry::Named(name, ty, variadic) => {
                    for prev in pending.drain(..) {
                        params.push(Param {
                            name: Some(prev),
                            ty: ty.clone(),
                            variadic: false,
                            span: prev.span.to(&ty.span()),
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        span: name.span.to(&ty.span()),
                        ty,
                        variadic,
                    });
                }
                Entry::Type(ty, _) => {
                    return Err(ParseError::invalid(
                        "mixed named and unnamed parameters",
                        ty.span(),
                    ))
                }
            }
        }
        if let Some(name) = pending.first() {
            return Err(ParseError::invalid(
                "mixed named and unnamed parameters",
                name.span,
            ));
        }
    } else {
        for entry in entries {
            let (ty, variadic) = match entry {
                Entry::Bare(name) => (TypeExpr::Name(name), false),
                Entry::Type(ty, variadic) => (ty, variadic),
                Entry::Named(..) => unreachable!("checked above"),
            };
            params.push(Param {
                name: None,
                span: ty.span(),
                ty,
                variadic,
            });
        }
    }
    if let Some(pos) = params.iter().position(|p| p.variadic) {
        if pos + 1 != params.len() {
            return Err(ParseError::invalid(
                "can only use ... with final parameter",
                open,
            ));
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::interner::Interner;
    use crate::parser::token::FileId;

    fn parse(source: &str) -> (File, Interner) {
        let mut interner = Interner::new();
        let mut ids = NodeIdGen::new();
        let file = Parser::new(source, FileId(0), &mut interner, &mut ids)
            .and_then(|p| p.parse_file())
            .unwrap_or_else(|e| panic!("parse failed: {:?}", e));
        (file, interner)
    }

    fn func<'f>(file: &'f File, interner: &Interner, name: &str) -> &'f FuncDecl {
        file.funcs()
            .find(|f| interner.resolve(f.name.name) == name)
            .unwrap()
    }

    #[test]
    fn test_grouped_param_names_share_type() {
        let (file, interner) = parse("package a\nfunc f(a, b int, c string) {}\n");
        let f = func(&file, &interner, "f");
        assert_eq!(f.sig.params.len(), 3);
        let names: Vec<_> = f
            .sig
            .params
            .iter()
            .map(|p| interner.resolve(p.name.unwrap().name))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(matches!(&f.sig.params[0].ty, TypeExpr::Name(id) if interner.resolve(id.name) == "int"));
    }

    #[test]
    fn test_unnamed_params_and_tuple_results() {
        let (file, _) = parse("package sql\nfunc (db *DB) Query(string, ...any) (*Rows, error)\n");
        let f = &file.funcs().next().unwrap();
        assert!(f.body.is_none());
        let recv = f.recv.as_ref().unwrap();
        assert!(recv.pointer);
        assert_eq!(f.sig.params.len(), 2);
        assert!(f.sig.is_variadic());
        assert_eq!(f.sig.results.len(), 2);
        assert!(matches!(f.sig.results[0].ty, TypeExpr::Pointer(..)));
    }

    #[test]
    fn test_named_variadic_and_qualified_types() {
        let (file, _) = parse(
            "package a\nfunc f(ctx context.Context, query string, args ...any) (rows *sql.Rows, err error) { return }\n",
        );
        let f = file.funcs().next().unwrap();
        assert!(matches!(f.sig.params[0].ty, TypeExpr::Qualified { .. }));
        assert!(f.sig.params[2].variadic);
        assert!(f.sig.results.iter().all(|r| r.name.is_some()));
    }

    #[test]
    fn test_struct_and_interface_types() {
        let (file, interner) = parse(
            "package sql\ntype (\n\tRows struct{}\n\tDB struct {\n\t\tname string `tag`\n\t\ta, b int\n\t}\n)\ntype Scanner interface {\n\tScan(dest ...any) error\n}\n",
        );
        let names: Vec<_> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Type(t) => Some(interner.resolve(t.name.name).to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["Rows", "DB", "Scanner"]);
        match &file.decls[1] {
            Decl::Type(TypeDecl {
                ty: TypeExpr::Struct(fields, _),
                ..
            }) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].names.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_top_level_var() {
        let (file, _) = parse("package a\nvar (\n\tx int\n\ty = 1\n)\nvar z, w = 1, 2\n");
        let vars = file
            .decls
            .iter()
            .filter(|d| matches!(d, Decl::Var(_)))
            .count();
        assert_eq!(vars, 3);
    }

    #[test]
    fn test_mixed_params_rejected() {
        let mut interner = Interner::new();
        let mut ids = NodeIdGen::new();
        let errs = Parser::new("package a\nfunc f(a int, string) {}\n", FileId(0), &mut interner, &mut ids)
            .and_then(|p| p.parse_file())
            .unwrap_err();
        assert!(errs[0].message.contains("mixed"));
    }
}
