//! Generic functions, structs and extensions: inference and specialization.

mod common;

use common::{compile, compile_err};

const ID: &str = "function id<T>(x: T): T { return x; }";

#[test]
fn identical_instantiations_share_one_specialization() {
    let js = compile(&format!("{ID} let a = id(1); let b = id(2);"));
    assert_eq!(js, "function generic_0_id(x) {return x};let a = generic_0_id(1);let b = generic_0_id(2)");
}

#[test]
fn distinct_arguments_get_distinct_specializations() {
    let js = compile(&format!("{ID} let a = id(1); let b = id(1.0);"));
    assert_eq!(
        js,
        "function generic_0_id(x) {return x};function generic_1_id(x) {return x};let a = generic_0_id(1);let b = generic_1_id(1.0)"
    );
}

#[test]
fn unused_generic_function_emits_nothing() {
    assert_eq!(compile(&format!("{ID} let a = 1;")), "let a = 1");
}

#[test]
fn return_type_hint_binds_unused_parameters() {
    let decls = "enum Option<T> { None, Some(T) } function none<T>(): Option<T> { return Option.None; }";
    let js = compile(&format!("{decls} let a: Option<int> = none();"));
    assert_eq!(js, "function generic_0_none() {return null};let a = generic_0_none()");

    let err = compile_err(&format!("{decls} let a = none()"));
    assert_eq!(err.message(), "Missing generic parameter `T`");
    assert_eq!(err.span().unwrap().text(), "none()");
}

#[test]
fn specializations_can_request_more_specializations() {
    let js = compile(&format!("{ID} function twice<T>(x: T): T {{ return id(x); }} let a = twice(1);"));
    assert_eq!(
        js,
        "function generic_0_twice(x) {return generic_0_id(x)};function generic_0_id(x) {return x};let a = generic_0_twice(1)"
    );
}

#[test]
fn parameters_bind_on_first_use() {
    let source = "function pair<T>(a: T, b: T): T { return a; }";
    compile(&format!("{source} let p = pair(1, 2);"));
    let err = compile_err(&format!("{source} let p = pair(1, 2.0);"));
    assert!(err.message().starts_with("incorrect argument type: expected `int`, found `float`"), "{err}");
}

#[test]
fn generic_struct_infers_from_its_fields() {
    let decl = "struct Box<T> { value: T }";
    let js = compile(&format!("{decl} let b = Box {{ value: 1 }}; let v = b.value;"));
    assert_eq!(js, "let b = {value:1};let v = b.value");

    let err = compile_err(&format!("{decl} let c = Box {{ value: 1.0 }}; let d: int = c.value;"));
    assert!(err.message().starts_with("incorrect type in let assignment"), "{err}");
}

#[test]
fn generic_arity_is_checked() {
    let err = compile_err("struct Box<T> { value: T } function f(b: Box<int, float>): void { }");
    assert_eq!(err.message(), "`Box` expects 1 generic argument(s), found 2");
}

#[test]
fn generic_extension_is_specialized_for_the_receiver() {
    let js = compile(
        "struct Box<T> { value: T }
         extension Box<T> { function get(self: Box<T>): T { return self.value; } }
         let b = Box { value: 1 }; let v = b.get();",
    );
    assert_eq!(js, "function generic_0_get(self) {return self.value};let b = {value:1};let v = generic_0_get(b)");
}

#[test]
fn generic_bodies_are_checked_once_specialized() {
    let err = compile_err("function half<T>(x: T): int { return x; } let h = half(1.5);");
    assert!(err.message().starts_with("incorrect return type: expected `int`, found `float`"), "{err}");
}

const HINTED: &str = "//! compiler.builtin\nfunction z<T>(): T { }\n";

#[test]
fn comparison_operand_takes_its_generic_from_the_other_side() {
    assert_eq!(compile(&format!("{HINTED}let b = 1 == z();")), "let b = 1==z()");
    assert_eq!(compile(&format!("{HINTED}let b: bool = z() == 1;")), "let b = z()==1");
}

#[test]
fn arithmetic_operand_takes_its_generic_from_the_other_side() {
    assert_eq!(compile(&format!("{HINTED}let c: int = z() + 1;")), "let c = (z() + 1)");
    assert_eq!(compile(&format!("{HINTED}let d: float = 2.5 * z();")), "let d = (2.5 * z())");
}
