//! Grammar engine behaviour seen through the public parser API.

mod common;

use common::{parse, shape};
use eec::diagnostics::CompileError;
use eec::parser::ast::{ArmBody, ImportScope, StmtKind, TypeKind};
use eec::parser::parse_source;
use eec::span::FileId;

fn parse_err(source: &str) -> CompileError {
    match parse_source(FileId(0), source) {
        Ok(stmts) => panic!("expected a parse error, got {} statement(s)", stmts.len()),
        Err(err) => err,
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(shape("a + b * c"), "add(a, mul(b, c))");
    assert_eq!(shape("a * b + c"), "add(mul(a, b), c)");
    assert_eq!(shape("a * b + c * d"), "add(mul(a, b), mul(c, d))");
}

#[test]
fn same_precedence_is_left_associative() {
    assert_eq!(shape("a / b / c"), "div(div(a, b), c)");
    assert_eq!(shape("a - b + c"), "add(sub(a, b), c)");
}

#[test]
fn comparison_takes_whole_arithmetic_operands() {
    assert_eq!(shape("a + b == c - d"), "==(add(a, b), sub(c, d))");
    assert_eq!(shape("a * 2 <= b"), "<=(mul(a, 2), b)");
}

#[test]
fn parentheses_stop_rebalancing() {
    assert_eq!(shape("(a + b) * c"), "mul((add(a, b)), c)");
}

#[test]
fn postfix_operators_chain_on_the_carry() {
    assert_eq!(shape("lib.make(1).x"), "call(lib.make, [1]).x");
    assert_eq!(shape("f(g(1), 2)"), "call(f, [call(g, [1]), 2])");
}

#[test]
fn line_terminators_split_statements() {
    let stmts = parse("let a = 1; let b = a; b += 2;");
    assert_eq!(stmts.len(), 3);
    assert_eq!(stmts[2].span.text(), "b += 2;");
}

#[test]
fn if_chain_is_one_owned_node() {
    let stmts = parse("if (a) { } else if (b) { x; } else { y; z; }");
    assert_eq!(stmts.len(), 1);
    let StmtKind::If(chain) = &stmts[0].node else { panic!("expected if chain") };
    assert_eq!(chain.arms.len(), 2);
    assert_eq!(chain.arms[1].body.len(), 1);
    assert_eq!(chain.else_body.as_ref().map(Vec::len), Some(2));
}

#[test]
fn else_after_finished_chain_is_rejected() {
    let err = parse_err("if (a) { } else { } else if (b) { }");
    assert!(err.message().contains("as the if chain already ended"), "{err}");
}

#[test]
fn enum_cases_get_lowest_free_discriminators() {
    let stmts = parse("enum Color { Red, Green = 0, Blue = 5, Custom(int, int, int) }");
    let StmtKind::Enum(decl) = &stmts[0].node else { panic!("expected enum") };
    let cases: Vec<(&str, i64)> = decl.cases.iter().map(|c| (c.name.node.as_str(), c.discriminator)).collect();
    assert_eq!(cases, vec![("Red", 1), ("Green", 0), ("Blue", 5), ("Custom", 2)]);
}

#[test]
fn duplicate_enum_case_is_rejected() {
    let err = parse_err("enum E { A, A }");
    assert!(err.message().contains("duplicate enum case `A`"), "{err}");
}

#[test]
fn match_arms_keep_inline_and_scoped_bodies_apart() {
    let stmts = parse("match (v) { Some(x) => x * 2, None => { 0; } }");
    let StmtKind::Match { value, arms } = &stmts[0].node else { panic!("expected match") };
    assert_eq!(value.span.text(), "v");
    assert!(matches!(&arms[0].body, ArmBody::Inline(body) if body.span.text() == "x * 2"));
    assert!(matches!(&arms[1].body, ArmBody::Scoped(body) if body.len() == 1));
}

#[test]
fn missing_arm_separator_is_rejected() {
    let err = parse_err("match (v) { A => 1 B => 2 }");
    assert!(matches!(err, CompileError::Parse { .. }));
}

#[test]
fn selective_import_keeps_aliases() {
    let stmts = parse(r#"import { make, Point as P } from "./geometry.ee""#);
    let StmtKind::Import(decl) = &stmts[0].node else { panic!("expected import") };
    assert_eq!(decl.source.node, "./geometry.ee");
    let ImportScope::Items(items) = &decl.scope else { panic!("expected selective import") };
    let bindings: Vec<&str> = items.iter().map(|i| i.binding()).collect();
    assert_eq!(bindings, vec!["make", "P"]);
}

#[test]
fn type_expressions_use_their_own_table() {
    let stmts = parse("let a: geo.Point = p; let b: Option<List<int>> = q;");
    let StmtKind::Let { ty: Some(ty), .. } = &stmts[0].node else { panic!("expected typed let") };
    assert!(matches!(&ty.node, TypeKind::Dot { member, .. } if member.node == "Point"));
    let StmtKind::Let { ty: Some(ty), .. } = &stmts[1].node else { panic!("expected typed let") };
    assert_eq!(ty.span.text(), "Option<List<int>>");
}

#[test]
fn keywords_are_not_identifiers() {
    let err = parse_err("let a = function;");
    assert!(err.message().contains("`function` is a keyword"), "{err}");
}

#[test]
fn unbalanced_brackets_point_at_the_opening() {
    let err = parse_err("let a = (1 + 2];");
    assert_eq!(err.span().map(|s| s.text()), Some("]"));
    let notes = err.notes().unwrap();
    assert_eq!(notes.secondary.as_ref().map(|(s, _)| s.text()), Some("("));
}

#[test]
fn flags_and_doc_comments_wrap_the_next_statement() {
    let stmts = parse("/// Doubles it\n//! compiler.builtin\nfunction twice(x: int): int { }");
    assert_eq!(stmts.len(), 1);
    assert_eq!(common::shape("/// Doubles it\nlet a = 1"), "flag(call(documentation, [\"Doubles it\"]), let(a, 1))");
}

#[test]
fn plain_comments_vanish() {
    let stmts = parse("// leading\nlet a = 1; // trailing\n// and more");
    assert_eq!(stmts.len(), 1);
}
