//! Enum layout, construction and `match` lowering.

mod common;

use common::{compile, compile_err};

const SHAPE: &str = "enum Shape { Dot, Circle(float), Rect(float, float) }";
const OPTION: &str = "enum Option<T> { None, Some(T) }";

#[test]
fn cases_with_data_carry_their_tag() {
    assert_eq!(compile(&format!("{SHAPE} let r = Shape.Rect(1.0, 2.0);")), "let r = [2,1.0,2.0]");
    assert_eq!(compile(&format!("{SHAPE} let c = Shape.Circle(0.5);")), "let c = [1,0.5]");
}

#[test]
fn empty_cases_are_their_discriminator() {
    assert_eq!(compile(&format!("{SHAPE} let d = Shape.Dot;")), "let d = 0");
    let js = compile("enum Color { Red, Green = 0, Blue = 5 } let a = Color.Red; let b = Color.Blue;");
    assert_eq!(js, "let a = 1;let b = 5");
}

#[test]
fn match_statement_tests_tags_in_arm_order() {
    let js = compile(&format!(
        "{SHAPE} let s = Shape.Circle(1.0);
         match (s) {{ Shape.Rect(w, h) => w * h, Shape.Circle(r) => r, Shape.Dot => 0.0 }}"
    ));
    assert_eq!(
        js,
        "let s = [1,1.0];\
         {let _internal_match_expr = s;\
         if(_internal_match_expr instanceof Array&&_internal_match_expr[0]==2){let w = _internal_match_expr[1];let h = _internal_match_expr[2];(w * h)}\
         else if(_internal_match_expr instanceof Array&&_internal_match_expr[0]==1){let r = _internal_match_expr[1];r}\
         else if(_internal_match_expr==0){0.0}}"
    );
}

#[test]
fn bare_case_names_work_as_patterns() {
    let js = compile(&format!("{SHAPE} let s = Shape.Dot; match (s) {{ Circle(r) => r, Dot => 0.0, Rect(w, h) => w }}"));
    assert!(js.contains("else if(_internal_match_expr==0){0.0}"), "{js}");
}

#[test]
fn null_optimized_option_is_bare_payload_or_null() {
    let js = compile(&format!("{OPTION} let a: Option<int> = Option.None; let b: Option<int> = Option.Some(5);"));
    assert_eq!(js, "let a = null;let b = 5");
}

#[test]
fn int_payload_gets_a_finiteness_guard() {
    let js = compile(&format!(
        "{OPTION} let b: Option<int> = Option.Some(5); match (b) {{ Option.Some(x) => x, Option.None => 0 }}"
    ));
    assert_eq!(
        js,
        "let b = 5;\
         {let _internal_match_expr = b;\
         if(_internal_match_expr!=null&&isFinite(_internal_match_expr)){let x = _internal_match_expr;x}\
         else if(_internal_match_expr==null||!isFinite(_internal_match_expr)){0}}"
    );
}

#[test]
fn float_payload_has_no_guard() {
    let js = compile(&format!(
        "{OPTION} let f: Option<float> = Option.Some(1.5); match (f) {{ Option.Some(x) => x, Option.None => 0.0 }}"
    ));
    assert_eq!(
        js,
        "let f = 1.5;\
         {let _internal_match_expr = f;\
         if(_internal_match_expr!=null){let x = _internal_match_expr;x}\
         else if(_internal_match_expr==null){0.0}}"
    );
}

#[test]
fn null_optimized_multi_value_payload_is_an_array() {
    let js = compile(
        "enum Pair { Empty, Both(int, int) } let p = Pair.Both(1, 2);
         match (p) { Pair.Both(a, b) => a + b, Pair.Empty => 0 }",
    );
    assert_eq!(
        js,
        "let p = [1,2];\
         {let _internal_match_expr = p;\
         if(_internal_match_expr!=null){let a = _internal_match_expr[0];let b = _internal_match_expr[1];(a + b)}\
         else if(_internal_match_expr==null){0}}"
    );
}

#[test]
fn catch_all_arm_binds_the_whole_value() {
    let source = format!("{SHAPE} let s = Shape.Dot; let a: float = match (s) {{ Shape.Dot => 0.0, other => 1.0 }};");
    let start = source.find("match (").unwrap();
    let hidden = format!("main_m{start}_CompilerScopedReturn");
    assert_eq!(
        compile(&source),
        format!(
            "let s = 0;let {hidden};\
             {{let _internal_match_expr = s;\
             if(_internal_match_expr==0){{{hidden} = 0.0}}\
             else if (true) {{let other = _internal_match_expr;{hidden} = 1.0}}}}\
             let a = {hidden}"
        )
    );
}

#[test]
fn scoped_arm_bodies_keep_their_statements() {
    let js = compile(&format!("{SHAPE} let s = Shape.Dot; match (s) {{ Shape.Dot => {{ let k = 1; }}, other => {{ let k = 2; }} }}"));
    assert!(js.contains("if(_internal_match_expr==0){let k = 1}"), "{js}");
    assert!(js.contains("if (true) {let other = _internal_match_expr;let k = 2}"), "{js}");
}

#[test]
fn generic_case_without_a_hint_is_rejected() {
    let err = compile_err(&format!("{OPTION} let a = Option.None;"));
    assert_eq!(err.message(), "cannot interpret the generic value to use");
    assert!(err.notes().unwrap().hint.as_deref().unwrap().contains("Option<int>"));
}

#[test]
fn case_data_is_checked() {
    let err = compile_err(&format!("{SHAPE} let d = Shape.Dot(1.0);"));
    assert_eq!(err.message(), "Trying to add data to a case that doesn't is not allowed");
    let err = compile_err(&format!("{SHAPE} let c = Shape.Circle;"));
    assert_eq!(err.message(), "case `Circle` carries data and must be called");
    let err = compile_err(&format!("{SHAPE} let r = Shape.Rect(1.0);"));
    assert_eq!(err.message(), "`Shape.Rect` expects 2 value(s), found 1");
    let err = compile_err(&format!("{SHAPE} let c = Shape.Circle(1);"));
    assert!(err.message().starts_with("incorrect payload type"), "{err}");
}

#[test]
fn patterns_are_checked_against_the_enum() {
    let err = compile_err(&format!("{SHAPE} let s = Shape.Dot; match (s) {{ Shape.Rect(w) => w }}"));
    assert_eq!(err.message(), "case `Rect` carries 2 value(s), found 1 binding(s)");
    let err = compile_err(&format!("{SHAPE} let s = Shape.Dot; match (s) {{ Shape.Square => 1.0 }}"));
    assert_eq!(err.message(), "`Shape` has no case `Square`");
    let err = compile_err("let n = 1; match (n) { Some(x) => x }");
    assert_eq!(err.message(), "cannot match `int` against an enum case");
}

#[test]
fn arms_must_agree_on_a_type() {
    let err = compile_err(&format!("{SHAPE} let s = Shape.Dot; match (s) {{ Shape.Dot => 1, other => 2.0 }}"));
    assert!(err.message().starts_with("match arms have incompatible types"), "{err}");
}
