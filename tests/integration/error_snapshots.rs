//! Snapshots of the user-facing shape of diagnostics: category, message, span and notes.
//!
//! Run `cargo insta review` after an intentional wording change.

mod common;

use common::{build_files, compile_err, describe};
use insta::assert_snapshot;

#[test]
fn let_type_mismatch() {
    let err = compile_err("let a: int = 1.0;");
    assert_snapshot!(describe(&err), @r"
    type error: incorrect type in let assignment: expected `int`, found `float`
      at `int`
      code: E0001
    ");
}

#[test]
fn assignment_type_mismatch() {
    let err = compile_err("let a = 1; a = 2.5");
    assert_snapshot!(describe(&err), @r"
    type error: incorrect type in assignment: expected `int`, found `float`
      at `2.5`
      code: E0002
    ");
}

#[test]
fn private_import() {
    let err = build_files(
        &[("/p/lib.ee", "function secret(): int { return 1; }"), ("/p/main.ee", r#"import { secret } from "./lib.ee""#)],
        "/p/main.ee",
    )
    .unwrap_err();
    assert_snapshot!(describe(&err), @r"
    declaration error: trying to import a private item
      at `secret`
      help: try adding `export` before the function
    ");
}

#[test]
fn stray_closing_bracket() {
    let err = compile_err("let a = 1);");
    assert_snapshot!(describe(&err), @r"
    parse error: unexpected token `)`
      at `)`
      help: Remove the `)` or insert a opening `(` before it
    ");
}

#[test]
fn mismatched_brackets() {
    let err = compile_err("let a = (1];");
    assert_snapshot!(describe(&err), @r"
    parse error: unexpected token `]`
      at `]`
      help: Insert a closing `)` bracket before using any other brackets
      note: Opening bracket here `(`
    ");
}

#[test]
fn keyword_as_identifier() {
    let err = compile_err("let a = return;");
    assert_snapshot!(describe(&err), @r"
    parse error: Expected an <identifier> not a keyword, `return` is a keyword
      at `return`
      help: Rename this
    ");
}

#[test]
fn extension_without_self() {
    let err = compile_err("extension int { function double(x: int): int { return x * 2; } }");
    assert_snapshot!(describe(&err), @r"
    declaration error: The first argument of an extension must be called `self`
      at `x`
    ");
}

#[test]
fn else_after_finished_chain() {
    let err = compile_err("if (true) { } else { } else { }");
    assert_snapshot!(describe(&err), @r"
    parse error: cannot be followed by an `else` as the if chain already ended
      at `if (true) { } else { }`
    ");
}

#[test]
fn unbound_generic_parameter() {
    let err = compile_err("function make<T>(): int { return 1; } let a = make()");
    assert_snapshot!(describe(&err), @r"
    type error: Missing generic parameter `T`
      at `make()`
    ");
}

#[test]
fn return_outside_function() {
    let err = compile_err("return 1");
    assert_snapshot!(describe(&err), @r"
    type error: Unexpected return. Return is not valid in this context
      at `1`
    ");
}

#[test]
fn duplicate_implementation() {
    let err = compile_err(
        "implement int { function a(self: int): int { return self; } }
implement int { function b(self: int): int { return self; } }",
    );
    assert_snapshot!(describe(&err), @r"
    declaration error: `int` is already implemented
      at `implement int { function b(self: int): int { return self; } }`
      note: first implemented here `implement int { function a(self: int): int { return self; } }`
    ");
}
