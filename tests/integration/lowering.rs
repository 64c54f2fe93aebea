//! JavaScript emission for statements, functions and value-position blocks.

mod common;

use common::{compile, compile_err, compile_with};
use eec::config::CompilationSettings;

#[test]
fn lets_and_arithmetic() {
    assert_eq!(compile("let a = 1; let b = a + 2 * 3;"), "let a = 1;let b = (a + (2 * 3))");
    assert_eq!(compile("let a = (1 + 2) * 3;"), "let a = (((1 + 2)) * 3)");
}

#[test]
fn declarations_emit_nothing() {
    assert_eq!(compile("struct P { x: int } enum E { A, B }"), "");
}

#[test]
fn functions_and_calls() {
    let js = compile("function add(a: int, b: int): int { return a + b; } let c = add(1, 2);");
    assert_eq!(js, "function add(a,b) {return (a + b)};let c = add(1,2)");
}

#[test]
fn if_chains() {
    let js = compile("let a = 1; if (a == 1) { a = 2; } else if (a > 3) { a = 3; } else { a = 4; }");
    assert_eq!(js, "let a = 1;if(a==1){a = 2}else if(a>3){a = 3}else{a = 4}");
}

#[test]
fn while_and_loop() {
    assert_eq!(compile("let i = 0; while (i < 3) { i += 1; }"), "let i = 0;while(i<3){i += 1}");
    assert_eq!(compile("loop { }"), "while(true){}");
}

#[test]
fn for_over_ranges() {
    assert_eq!(compile("for (i in 0..3) { }"), "for(let i = 0;i<3;++i){}");
    assert_eq!(
        compile("let s = 1; let n = 5; for (i in s..=n) { }"),
        "let s = 1;let n = 5;for(let i = s;i<=n;++i){}"
    );
}

#[test]
fn struct_literals_are_objects() {
    let js = compile("struct P { x: int, y: float } let p = P { x: 1, y: 2.0 }; let q = p.x;");
    assert_eq!(js, "let p = {x:1,y:2.0};let q = p.x");
}

#[test]
fn extension_methods_become_free_functions() {
    let js = compile(
        "extension int { function double(self: int): int { return self * 2; } }
         let x = 4; let y = x.double();",
    );
    assert_eq!(js, "function extension_int_double(self) {return (self * 2)};let x = 4;let y = extension_int_double(x)");
}

#[test]
fn method_sugar_matches_the_direct_call() {
    let decl = "extension int { function double(self): int { return self + self; } }";
    let js = compile(&format!("{decl} let x = 4; let y = x.double();"));
    assert_eq!(js, "function extension_int_double(self) {return (self + self)};let x = 4;let y = extension_int_double(x)");
}

#[test]
fn implementations_are_renamed_too() {
    let js = compile(
        "implement int { function triple(self: int): int { return self * 3; } }
         let x = 4; let y = x.triple();",
    );
    assert_eq!(js, "function implementation_int_triple(self) {return (self * 3)};let x = 4;let y = implementation_int_triple(x)");
}

#[test]
fn builtin_type_is_resolved_at_compile_time() {
    let js = compile(
        "//! compiler.builtin
         //! unsafe.js.anyArgs
         function builtin_type(x: int): string { }
         let t = builtin_type(1.5);",
    );
    assert_eq!(js, r#"let t = "float""#);
}

#[test]
fn panic_handler_comes_from_settings() {
    let source = "//! compiler.builtin
         function builtin_panic_handler(): void { }
         builtin_panic_handler();";
    assert_eq!(compile(source), "throw new Error()");

    let settings = CompilationSettings { panic_handler_js: "process.exit(1)".into(), ..Default::default() };
    assert_eq!(compile_with(source, &settings), "process.exit(1)");
}

#[test]
fn scope_in_value_position_assigns_a_hidden_variable() {
    let js = compile("let a: int = { //! compiler.scopedReturn 5 };");
    assert_eq!(
        js,
        "let main_s13_CompilerScopedReturn;{main_s13_CompilerScopedReturn = 5}let a = main_s13_CompilerScopedReturn"
    );
}

#[test]
fn scope_statement_is_a_plain_block() {
    assert_eq!(compile("{ let a = 1; }"), "{let a = 1}");
}

#[test]
fn plain_comments_are_not_emitted() {
    assert_eq!(compile("// setup\nlet a = 1; // one\n"), "let a = 1");
}

#[test]
fn nested_value_blocks_are_rejected() {
    let err = compile_err("function id(x: int): int { return x; } let a: int = id({ //! compiler.scopedReturn 5 });");
    assert!(err.message().starts_with("a block or `match` used as a value"), "{err}");
    assert_eq!(err.span().unwrap().text(), "{ //! compiler.scopedReturn 5 }");

    let err = compile_err("let a: int = 1 + { //! compiler.scopedReturn 5 };");
    assert_eq!(err.span().unwrap().text(), "{ //! compiler.scopedReturn 5 }");
    assert_eq!(err.notes().unwrap().hint.as_deref(), Some("bind it to a variable first"));
}

#[test]
fn bound_value_block_can_feed_an_expression() {
    let js = compile("let v: int = { //! compiler.scopedReturn 5 }; let a = 1 + v;");
    assert!(js.ends_with("let v = main_s13_CompilerScopedReturn;let a = (1 + v)"), "{js}");
}
