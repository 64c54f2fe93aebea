//! Scope initialization and type resolution, driven through `compile_source`.

mod common;

use common::{compile, compile_err};
use eec::diagnostics::{CompileError, Explainer};

#[test]
fn let_mismatch_spans_the_declared_type() {
    let err = compile_err("let a: int = 1.0;");
    assert!(matches!(err, CompileError::Type { .. }));
    assert!(err.message().starts_with("incorrect type in let assignment"), "{err}");
    assert_eq!(err.span().unwrap().text(), "int");
    assert_eq!(err.notes().unwrap().code, Some(Explainer::IncorrectTypeInLetAssignment));
}

#[test]
fn assignment_mismatch_carries_its_explainer() {
    let err = compile_err("let a = 1; a = 2.5;");
    assert!(err.message().starts_with("incorrect type in assignment"), "{err}");
    assert_eq!(err.notes().unwrap().code, Some(Explainer::IncorrectRightHandTypeInAssignment));
}

#[test]
fn compound_assignment_follows_arithmetic_rules() {
    compile("let a = 1.5; a += 2;");
    let err = compile_err("let a = 1; a /= 2;");
    assert!(err.message().contains("expected `int`, found `float`"), "{err}");
}

#[test]
fn integer_division_yields_float() {
    compile("let a: float = 7 / 2;");
    let err = compile_err("let a: int = 7 / 2;");
    assert!(err.message().starts_with("incorrect type in let assignment"));
}

#[test]
fn mixed_arithmetic_widens_to_float() {
    compile("let a: float = 1 + 2.0 * 3;");
}

#[test]
fn arithmetic_on_strings_is_rejected() {
    let err = compile_err(r#"let a = "x" + 1;"#);
    assert!(err.message().starts_with("cannot apply `+`"), "{err}");
}

#[test]
fn comparisons_need_equal_builtins() {
    compile("let a: bool = 1 < 2; let b = 1.0 == 2.0;");
    let err = compile_err("let a = 1 < 2.0;");
    assert!(err.message().starts_with("cannot compare values of different types"), "{err}");
}

#[test]
fn comparing_structs_is_rejected() {
    let err = compile_err("struct P { x: int } let p = P { x: 1 }; let same = p == p;");
    assert!(err.message().starts_with("cannot compare non-primitive types"), "{err}");
}

#[test]
fn conditions_must_be_bool() {
    compile("let a = 1; if (a > 0) { a = 2; } while (false) { }");
    let err = compile_err("if (1) { }");
    assert!(err.message().contains("condition must be a `bool`"), "{err}");
}

#[test]
fn return_outside_a_function_is_rejected() {
    let err = compile_err("return 1");
    assert_eq!(err.message(), "Unexpected return. Return is not valid in this context");
    assert_eq!(err.span().unwrap().text(), "1");
}

#[test]
fn return_type_is_checked() {
    let err = compile_err("function f(): int { return 1.5; }");
    assert!(err.message().starts_with("incorrect return type"), "{err}");
}

#[test]
fn call_arity_and_arguments_are_checked() {
    let source = "function add(a: int, b: int): int { return a + b; }";
    compile(&format!("{source} let c = add(1, 2);"));
    let err = compile_err(&format!("{source} let c = add(1);"));
    assert_eq!(err.message(), "`add` expects 2 argument(s), found 1");
    let err = compile_err(&format!("{source} let c = add(1, 2.0);"));
    assert!(err.message().starts_with("incorrect argument type"), "{err}");
}

#[test]
fn unknown_names_are_reported() {
    let err = compile_err("let a = b;");
    assert_eq!(err.message(), "cannot find `b` in this scope");
    let err = compile_err("let a: Missing = 1;");
    assert_eq!(err.message(), "cannot find type `Missing` in this scope");
}

#[test]
fn variables_do_not_leak_out_of_blocks() {
    let err = compile_err("if (true) { let inner = 1; } let outer = inner;");
    assert_eq!(err.message(), "cannot find `inner` in this scope");
}

#[test]
fn nested_function_declarations_are_rejected() {
    let err = compile_err("function outer(): void { function inner(): void { } }");
    assert!(matches!(err, CompileError::Declaration { .. }));
    assert_eq!(err.span().unwrap().text(), "inner");
}

#[test]
fn struct_literals_check_every_property() {
    let decl = "struct P { x: int, y: float }";
    compile(&format!("{decl} let p = P {{ x: 1, y: 2.0 }}; let x: int = p.x;"));
    let err = compile_err(&format!("{decl} let p = P {{ x: 1 }};"));
    assert_eq!(err.message(), "missing property `y` in `P`");
    let err = compile_err(&format!("{decl} let p = P {{ x: 1, y: 2.0, z: 3 }};"));
    assert_eq!(err.message(), "`P` has no property `z`");
    let err = compile_err(&format!("{decl} let p = P {{ x: 1.0, y: 2.0 }};"));
    assert!(err.message().starts_with("incorrect type for property `x`"), "{err}");
}

#[test]
fn struct_types_compare_structurally() {
    let source = "
        struct P { x: int }
        struct Q { x: int }
        function take(q: Q): int { return q.x; }
        let n = take(P { x: 1 });
    ";
    compile(source);
    let err = compile_err(
        "
        struct Q { x: int }
        struct R { x: int, y: int }
        function take(q: Q): int { return q.x; }
        let n = take(R { x: 1, y: 2 });
    ",
    );
    assert!(err.message().starts_with("incorrect argument type"), "{err}");
}

#[test]
fn scope_expression_takes_its_scoped_return_type() {
    compile("let a: int = { let b = 2; //! compiler.scopedReturn b * 3 };");
    let err = compile_err("let a: float = { //! compiler.scopedReturn 1 };");
    assert!(err.message().starts_with("incorrect type in let assignment"), "{err}");
}

#[test]
fn scope_without_scoped_return_is_void() {
    let err = compile_err("let a: int = { let b = 2; };");
    assert!(err.message().contains("found `void`"), "{err}");
}

#[test]
fn extension_methods_need_a_self_parameter() {
    let err = compile_err("extension int { function double(x: int): int { return x * 2; } }");
    assert_eq!(err.message(), "The first argument of an extension must be called `self`");
    let err = compile_err("extension int { function zero(): int { return 0; } }");
    assert_eq!(err.message(), "A extension function must have at least one self parameter");
    let err = compile_err("extension int { function half(self: float): float { return self / 2; } }");
    assert!(err.message().starts_with("`self` must have the extended type"), "{err}");
}

#[test]
fn bare_self_is_only_allowed_in_extensions() {
    compile("extension float { function half(self): float { return self / 2; } } let f = 3.0; let h: float = f.half();");
    let err = compile_err("function f(self): int { return 1; }");
    assert!(matches!(err, CompileError::Declaration { .. }));
    assert_eq!(err.span().unwrap().text(), "self");
}

#[test]
fn extension_bodies_only_hold_functions() {
    let err = compile_err("extension int { let a = 1; }");
    assert_eq!(err.message(), "only functions are allowed in the body of an extension");
    let err = compile_err("extension int { export function id(self: int): int { return self; } }");
    assert_eq!(err.message(), "functions declared in an extension are always exported");
}

#[test]
fn duplicate_extension_in_one_scope_is_rejected() {
    let err = compile_err(
        "extension int { function a(self: int): int { return self; } }
         extension int { function b(self: int): int { return self; } }",
    );
    assert!(matches!(err, CompileError::Declaration { .. }));
    assert_eq!(err.notes().unwrap().secondary.as_ref().unwrap().1, "previous extension here");
}

#[test]
fn reimplementing_a_type_is_rejected() {
    let err = compile_err(
        "implement float { function a(self: float): float { return self; } }
         implement float { function b(self: float): float { return self; } }",
    );
    assert_eq!(err.message(), "`float` is already implemented");
}

#[test]
fn missing_method_is_reported() {
    let err = compile_err("let a = 1; let b = a.double();");
    assert_eq!(err.message(), "no method `double` found for `int`");
}

#[test]
fn member_of_dotted_extension_target_is_rejected() {
    let err = compile_err("extension lib.Point { }");
    assert_eq!(err.message(), "Cannot implement types for module subtypes");
}

#[test]
fn tuple_types_are_not_supported() {
    let err = compile_err("function f(p: (int, int)): void { }");
    assert_eq!(err.message(), "tuple types are not supported");
}

#[test]
fn for_loops_iterate_int_ranges_only() {
    compile("let n = 3; for (i in 0..n) { let j: int = i; }");
    let err = compile_err("for (i in 0..2.5) { }");
    assert!(err.message().starts_with("range bounds must be `int`"), "{err}");
    let err = compile_err("let r = 0..3;");
    assert_eq!(err.message(), "ranges can only be used as the header of a `for` loop");
}
