//! Imports, exports and the std lib, loaded from an in-memory file set.

mod common;

use common::{build_files, build_files_with};
use eec::config::CompilationSettings;
use eec::diagnostics::{CollectingSink, CompileError};
use eec::modules::{Cluster, Export, MemoryLoader};
use std::path::{Path, PathBuf};

const LIB: &str = "struct P { x: int } export function make(x: int): P { return P { x: x }; }";

fn build(files: &[(&str, &str)]) -> String {
    match build_files(files, "/p/main.ee") {
        Ok(js) => js,
        Err(err) => panic!("build failed: {err}"),
    }
}

fn build_err(files: &[(&str, &str)]) -> CompileError {
    match build_files(files, "/p/main.ee") {
        Ok(js) => panic!("expected an error, got:\n{js}"),
        Err(err) => err,
    }
}

#[test]
fn selective_import_emits_the_dependency_first() {
    let js = build(&[("/p/lib.ee", LIB), ("/p/main.ee", r#"import { make } from "./lib.ee" let p = make(1);"#)]);
    assert_eq!(js, "function make(x) {return {x:x}};let p = make(1)");
}

#[test]
fn aliased_import_keeps_the_emitted_name() {
    let js = build(&[("/p/lib.ee", LIB), ("/p/main.ee", r#"import { make as build } from "./lib.ee" let p = build(1);"#)]);
    assert_eq!(js, "function make(x) {return {x:x}};let p = make(1)");
}

#[test]
fn namespace_import_resolves_members() {
    let js = build(&[("/p/lib.ee", LIB), ("/p/main.ee", r#"import * as lib from "./lib.ee" let p = lib.make(1);"#)]);
    assert_eq!(js, "function make(x) {return {x:x}};let p = make(1)");
}

#[test]
fn importing_a_private_function_is_rejected() {
    let err = build_err(&[
        ("/p/lib.ee", "function secret(): int { return 1; }"),
        ("/p/main.ee", r#"import { secret } from "./lib.ee""#),
    ]);
    assert!(matches!(err, CompileError::Declaration { .. }));
    assert_eq!(err.message(), "trying to import a private item");
    assert_eq!(err.span().unwrap().text(), "secret");
    assert_eq!(err.notes().unwrap().hint.as_deref(), Some("try adding `export` before the function"));
}

#[test]
fn importing_an_unknown_name_is_rejected() {
    let err = build_err(&[("/p/lib.ee", LIB), ("/p/main.ee", r#"import { missing } from "./lib.ee""#)]);
    assert_eq!(err.message(), "`missing` is not exported by `./lib.ee`");
}

#[test]
fn circular_imports_are_reported() {
    let err = build_err(&[
        ("/p/main.ee", r#"import * from "./b.ee""#),
        ("/p/b.ee", r#"import * from "./main.ee""#),
    ]);
    assert!(matches!(err, CompileError::Declaration { .. }));
    assert_eq!(err.message(), "circular import");
}

#[test]
fn missing_files_are_reported_at_the_import() {
    let err = build_err(&[("/p/main.ee", r#"import * from "./nope.ee""#)]);
    assert!(matches!(err, CompileError::Declaration { .. }));
    assert_eq!(err.message(), "cannot resolve '/p/nope.ee': no such file");
}

#[test]
fn shared_dependency_is_loaded_once() {
    let js = build(&[
        ("/p/lib.ee", "export function make(x: int): int { return x; }"),
        ("/p/a.ee", r#"import { make } from "./lib.ee" export function a(): int { return make(1); }"#),
        ("/p/b.ee", r#"import { make } from "./lib.ee" export function b(): int { return make(2); }"#),
        ("/p/main.ee", r#"import { a } from "./a.ee" import { b } from "./b.ee" let x = a(); let y = b();"#),
    ]);
    assert_eq!(js.matches("function make").count(), 1, "{js}");
}

#[test]
fn std_lib_is_imported_implicitly() {
    let settings = CompilationSettings { std_lib: Some(PathBuf::from("/std/std.ee")), ..Default::default() };
    let files = [
        ("/std/std.ee", "export function inc(x: int): int { return x + 1; }"),
        ("/p/main.ee", "let a = inc(1);"),
    ];
    let js = build_files_with(&files, "/p/main.ee", settings).unwrap();
    assert_eq!(js, "function inc(x) {return (x + 1)};let a = inc(1)");

    let err = build_files(&files, "/p/main.ee").unwrap_err();
    assert_eq!(err.message(), "cannot find `inc` in this scope");
}

#[test]
fn structs_from_other_modules_compare_structurally() {
    let js = build(&[
        ("/p/lib.ee", "export struct Point { x: int } export function norm(p: Point): int { return p.x; }"),
        ("/p/main.ee", r#"import { norm } from "./lib.ee" struct Point { x: int } let n = norm(Point { x: 3 });"#),
    ]);
    assert_eq!(js, "function norm(p) {return p.x};let n = norm({x:3})");
}

#[test]
fn exported_extensions_travel_with_wildcard_imports() {
    let ext = "extension int { function double(self: int): int { return self * 2; } }";
    let main = r#"import * from "./lib.ee" let x = 2; let y = x.double();"#;
    let js = build(&[("/p/lib.ee", &format!("export {ext}")), ("/p/main.ee", main)]);
    assert_eq!(js, "function extension_int_double(self) {return (self * 2)};let x = 2;let y = extension_int_double(x)");

    let err = build_err(&[("/p/lib.ee", ext), ("/p/main.ee", main)]);
    assert_eq!(err.message(), "no method `double` found for `int`");
}

#[test]
fn re_exports_forward_another_modules_items() {
    let js = build(&[
        ("/p/lib.ee", LIB),
        ("/p/mid.ee", r#"export * from "./lib.ee""#),
        ("/p/main.ee", r#"import { make } from "./mid.ee" let p = make(1);"#),
    ]);
    assert_eq!(js, "function make(x) {return {x:x}};let p = make(1)");

    let js = build(&[
        ("/p/lib.ee", LIB),
        ("/p/mid.ee", r#"export * as geo from "./lib.ee""#),
        ("/p/main.ee", r#"import { geo } from "./mid.ee" let p = geo.make(1);"#),
    ]);
    assert_eq!(js, "function make(x) {return {x:x}};let p = make(1)");
}

#[test]
fn exports_list_functions_extensions_then_types() {
    let loader = MemoryLoader::new().with_file(
        "/p/lib.ee",
        "export struct Point { x: int }
         export function make(x: int): Point { return Point { x: x }; }
         function hidden(): int { return 0; }
         export extension int { function double(self: int): int { return self * 2; } }",
    );
    let mut cluster = Cluster::new(loader, CompilationSettings::default());
    let id = cluster.add_module("lib", Path::new("/p/lib.ee"), false).unwrap();
    let module = cluster.module(id).unwrap();
    let exports = module.exports();
    let names: Vec<&str> = exports.iter().map(Export::name).collect();
    assert_eq!(names, vec!["make", "int", "Point"]);
    assert_eq!(module.private_functions(), vec!["hidden".to_string()]);
    assert!(matches!(module.export_named("int"), Some(Export::Extension { .. })));
    assert!(module.export_named("hidden").is_none());
}

#[test]
fn replacing_module_text_recompiles() {
    let loader = MemoryLoader::new().with_file("/p/main.ee", "let a = 1;");
    let mut cluster = Cluster::new(loader, CompilationSettings::default());
    let mut sink = CollectingSink::default();
    assert_eq!(cluster.build(Path::new("/p/main.ee"), false, &mut sink).unwrap(), "let a = 1");

    cluster.add_module_source("main", Path::new("/p/main.ee"), "let b = 2.0;", false).unwrap();
    assert_eq!(cluster.compile().unwrap(), "let b = 2.0");
    assert_eq!(cluster.modules().count(), 1);
}
