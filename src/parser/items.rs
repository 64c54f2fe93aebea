//! Sub-grammars for the interiors of bracket tokens.

use super::Parser;
use super::ast::{ArmBody, EnumCase, Field, Ident, ImportItem, MatchArm, Param, Stmt, StmtKind, TypeExpr, TypeKind};
use super::pattern::{Captures, Pattern, Slot};
use super::rules;
use crate::diagnostics::CompileError;
use crate::lexer::{bracket_body, Token, TokenKind};
use crate::span::{Span, Spanned};
use std::collections::HashSet;
use std::sync::OnceLock;

fn statement_parser(token: &Token) -> Result<Parser<'static, StmtKind>, CompileError> {
    Ok(Parser::new(bracket_body(token)?, rules::statement_grammar()?))
}

fn span_or(p: &Parser<'_, StmtKind>, fallback: &Span) -> Span {
    p.peek().map(|t| t.span.clone()).unwrap_or_else(|| fallback.clone())
}

fn ident_of(token: &Token) -> Ident {
    Spanned::new(token.text().to_string(), token.span.clone())
}

/// `name: type, ...`. With `bare_self`, a leading `self` may leave its type out.
fn typed_names(block: &Token, what: &str, bare_self: bool) -> Result<Vec<(Ident, Option<TypeExpr>)>, CompileError> {
    let mut p = statement_parser(block)?;
    let mut out: Vec<(Ident, Option<TypeExpr>)> = Vec::new();
    while let Some(t) = p.next_token() {
        if t.kind != TokenKind::Ident {
            return Err(CompileError::parse(format!("unexpected token `{}`", t.text()), t.span)
                .with_hint(format!("expected a {what} name")));
        }
        let name = ident_of(&t);
        let untyped = p.at_end() || p.peek().is_some_and(|next| next.is_punct(","));
        let ty = if bare_self && out.is_empty() && name.node == "self" && untyped {
            None
        } else {
            if !p.eat_punct(":") {
                return Err(CompileError::parse("expected `:` after identifier", span_or(&p, &t.span)));
            }
            Some(
                p.type_statement()?
                    .ok_or_else(|| CompileError::parse("expected type after this", name.span.clone()))?,
            )
        };
        if out.iter().any(|(n, _)| n.node == name.node) {
            return Err(CompileError::parse(format!("duplicate {what} `{}`", name.node), name.span));
        }
        out.push((name, ty));
        if p.at_end() {
            break;
        }
        if !p.eat_punct(",") {
            return Err(CompileError::parse("expected a comma", span_or(&p, &t.span))
                .with_hint(format!("try inserting a `,` before the next {what}")));
        }
    }
    Ok(out)
}

pub fn struct_fields(block: &Token) -> Result<Vec<Field>, CompileError> {
    Ok(typed_names(block, "property", false)?
        .into_iter()
        .filter_map(|(name, ty)| ty.map(|ty| Field { name, ty }))
        .collect())
}

pub fn params(paren: &Token) -> Result<Vec<Param>, CompileError> {
    Ok(typed_names(paren, "parameter", true)?.into_iter().map(|(name, ty)| Param { name, ty }).collect())
}

/// `name: value, ...` inside a struct literal.
pub fn struct_literal_fields(block: &Token) -> Result<Vec<(Ident, Stmt)>, CompileError> {
    let mut p = statement_parser(block)?;
    let mut out: Vec<(Ident, Stmt)> = Vec::new();
    while let Some(t) = p.next_token() {
        if t.kind != TokenKind::Ident {
            return Err(CompileError::parse("expected ident", t.span));
        }
        let name = ident_of(&t);
        if !p.eat_punct(":") {
            return Err(CompileError::parse("expected `:`", span_or(&p, &t.span)));
        }
        let value = p
            .statement()?
            .ok_or_else(|| CompileError::parse("expected statement after `:`", span_or(&p, &t.span)))?;
        if out.iter().any(|(n, _)| n.node == name.node) {
            return Err(CompileError::parse(format!("property `{}` is given twice", name.node), name.span));
        }
        out.push((name, value));
        if p.at_end() {
            break;
        }
        if !p.eat_punct(",") {
            return Err(CompileError::parse("expected `,`", span_or(&p, &t.span)));
        }
    }
    Ok(out)
}

/// Comma separated call arguments.
pub fn call_args(paren: &Token) -> Result<Vec<Stmt>, CompileError> {
    let mut p = statement_parser(paren)?;
    let args = p.argument_list()?;
    p.expect_end()?;
    Ok(args)
}

/// The condition of `if (..)` / `while (..)`.
pub fn single_expression(paren: &Token) -> Result<Stmt, CompileError> {
    let mut stmts = statement_parser(paren)?.statements()?;
    if stmts.len() != 1 {
        return Err(CompileError::parse(
            format!("Expected only one argument, got {}", stmts.len()),
            paren.span.clone(),
        ));
    }
    Ok(stmts.remove(0))
}

/// `ident in expr`
pub fn for_header(paren: &Token) -> Result<(Ident, Stmt), CompileError> {
    let mut p = statement_parser(paren)?;
    let var = match p.next_token() {
        Some(t) if t.kind == TokenKind::Ident => ident_of(&t),
        other => {
            let span = other.map(|t| t.span).unwrap_or_else(|| paren.span.clone());
            return Err(CompileError::parse("expected <ident>", span));
        }
    };
    match p.next_token() {
        Some(t) if t.is_ident("in") => {}
        other => {
            let span = other.map(|t| t.span).unwrap_or_else(|| paren.span.clone());
            return Err(CompileError::parse("expected `in`", span));
        }
    }
    let iter = p
        .statement()?
        .ok_or_else(|| CompileError::parse("expected an expression after `in`", paren.span.clone()))?;
    if let Some(t) = p.peek() {
        return Err(CompileError::parse(format!("unexpected token `{}`", t.text()), t.span.clone())
            .with_hint("There cant be more expressions in a for loop"));
    }
    Ok((var, iter))
}

/// Declared generic parameters must be bare names.
pub fn generic_names(list: Vec<TypeExpr>) -> Result<Vec<Ident>, CompileError> {
    list.into_iter()
        .map(|ty| match ty.node {
            TypeKind::Named { name, args } if args.is_empty() => Ok(name),
            _ => Err(CompileError::parse("generic parameters must be plain names", ty.span)),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct CaseNode {
    name: Ident,
    value: Option<i64>,
    payload: Option<Vec<TypeExpr>>,
}

fn build_tuple_case(c: &mut Captures<CaseNode>, _: &Span) -> Result<Option<CaseNode>, CompileError> {
    let name = c.ident(Slot::Name)?;
    let paren = c.token(Slot::Payload)?;
    let mut p = Parser::new(bracket_body(&paren)?, rules::type_grammar()?);
    let types = p.type_list()?;
    p.expect_end()?;
    Ok(Some(CaseNode { name, value: None, payload: Some(types) }))
}

fn build_valued_case(c: &mut Captures<CaseNode>, _: &Span) -> Result<Option<CaseNode>, CompileError> {
    let name = c.ident(Slot::Name)?;
    let value = c.token(Slot::Value)?;
    let parsed = value
        .text()
        .parse::<i64>()
        .map_err(|_| CompileError::parse("discriminator does not fit in 64 bits", value.span.clone()))?;
    Ok(Some(CaseNode { name, value: Some(parsed), payload: None }))
}

fn build_plain_case(c: &mut Captures<CaseNode>, _: &Span) -> Result<Option<CaseNode>, CompileError> {
    Ok(Some(CaseNode { name: c.ident(Slot::Name)?, value: None, payload: None }))
}

fn case_grammar() -> Result<&'static [Pattern<CaseNode>], CompileError> {
    static GRAMMAR: OnceLock<Result<Vec<Pattern<CaseNode>>, String>> = OnceLock::new();
    GRAMMAR
        .get_or_init(|| {
            Ok(vec![
                Pattern::new("Tuple", "#ident-name #parenthesis-payload", build_tuple_case)?,
                Pattern::new("Plain with discriminator", "#ident-name = #int-value", build_valued_case)?,
                Pattern::new("Plain", "#ident-name", build_plain_case)?,
            ])
        })
        .as_deref()
        .map_err(|e| CompileError::internal(e.clone()))
}

/// Enum cases. Cases without an explicit `= n` take the lowest unused values in order.
pub fn enum_cases(block: &Token) -> Result<Vec<EnumCase>, CompileError> {
    let mut p = Parser::new(bracket_body(block)?, case_grammar()?);
    let nodes = p.argument_list()?;
    p.expect_end()?;

    let mut seen = HashSet::new();
    let mut used = HashSet::new();
    for node in &nodes {
        if !seen.insert(node.node.name.node.clone()) {
            return Err(CompileError::parse(format!("duplicate enum case `{}`", node.node.name.node), node.span.clone()));
        }
        if let Some(v) = node.node.value {
            if !used.insert(v) {
                return Err(CompileError::parse(format!("discriminator `{v}` is used twice"), node.span.clone()));
            }
        }
    }

    let mut next = 0i64;
    let mut cases = Vec::with_capacity(nodes.len());
    for node in nodes {
        let CaseNode { name, value, payload } = node.node;
        let discriminator = match value {
            Some(v) => v,
            None => {
                while used.contains(&next) {
                    next += 1;
                }
                let d = next;
                next += 1;
                d
            }
        };
        cases.push(EnumCase { name, discriminator, payload });
    }
    Ok(cases)
}

/// `pattern => body, ...`
pub fn match_arms(block: &Token) -> Result<Vec<MatchArm>, CompileError> {
    let mut p = statement_parser(block)?;
    let mut arms = Vec::new();
    while !p.at_end() {
        let pattern = p
            .statement()?
            .ok_or_else(|| CompileError::parse("common error parsing match arms", span_or(&p, &block.span)))?;
        if !(p.eat_punct("=") && p.eat_punct(">")) {
            return Err(CompileError::parse("expected `=>`", span_or(&p, &pattern.span)));
        }
        let body = p
            .statement()?
            .ok_or_else(|| CompileError::parse("expected a body after the `=>`", span_or(&p, &pattern.span)))?;
        let span = pattern.span.join(&body.span);
        let body = match body.node {
            StmtKind::Scope(stmts) => ArmBody::Scoped(stmts),
            node => ArmBody::Inline(Stmt { node, span: body.span }),
        };
        arms.push(MatchArm { pattern, body, span });
        if p.at_end() {
            break;
        }
        if !p.eat_punct(",") {
            return Err(CompileError::parse("expected `,`", span_or(&p, &block.span))
                .with_hint("try inserting a `,` before starting a new match case"));
        }
    }
    Ok(arms)
}

fn build_renamed_item(c: &mut Captures<ImportItem>, _: &Span) -> Result<Option<ImportItem>, CompileError> {
    Ok(Some(ImportItem { name: c.ident(Slot::Name)?, alias: Some(c.ident(Slot::Alias)?) }))
}

fn build_item(c: &mut Captures<ImportItem>, _: &Span) -> Result<Option<ImportItem>, CompileError> {
    Ok(Some(ImportItem { name: c.ident(Slot::Name)?, alias: None }))
}

fn import_grammar() -> Result<&'static [Pattern<ImportItem>], CompileError> {
    static GRAMMAR: OnceLock<Result<Vec<Pattern<ImportItem>>, String>> = OnceLock::new();
    GRAMMAR
        .get_or_init(|| {
            Ok(vec![
                Pattern::new("rename", "#ident-name as #ident-alias", build_renamed_item)?,
                Pattern::new("simple", "#ident-name", build_item)?,
            ])
        })
        .as_deref()
        .map_err(|e| CompileError::internal(e.clone()))
}

/// `{ a, b as c }` of a selective import.
pub fn import_items(block: &Token) -> Result<Vec<ImportItem>, CompileError> {
    let mut p = Parser::new(bracket_body(block)?, import_grammar()?);
    let items = p.argument_list()?;
    p.expect_end()?;
    Ok(items.into_iter().map(|i| i.node).collect())
}
