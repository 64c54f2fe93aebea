#![allow(dead_code)]

use eec::config::CompilationSettings;
use eec::diagnostics::{CollectingSink, CompileError};
use eec::modules::{Cluster, MemoryLoader};
use eec::parser::ast::{sexpr, Stmt};
use eec::parser::parse_source;
use eec::span::FileId;
use std::path::Path;
use std::process::Command;

pub fn eec() -> Command {
    Command::new(env!("CARGO_BIN_EXE_eec"))
}

/// Compile a single source string without a std lib. Panics with the error on failure.
pub fn compile(source: &str) -> String {
    compile_with(source, &CompilationSettings::default())
}

pub fn compile_with(source: &str, settings: &CompilationSettings) -> String {
    let mut sink = CollectingSink::default();
    match eec::compile_source(source, settings, &mut sink) {
        Ok(js) => js,
        Err(err) => panic!("compilation failed: {err}\nsource:\n{source}"),
    }
}

/// Compile `source`, expecting it to fail. The error must also reach the sink exactly once.
pub fn compile_err(source: &str) -> CompileError {
    let mut sink = CollectingSink::default();
    match eec::compile_source(source, &CompilationSettings::default(), &mut sink) {
        Ok(js) => panic!("expected an error, got:\n{js}"),
        Err(err) => {
            assert_eq!(sink.errors.len(), 1, "sink should see the aborting error once");
            err
        }
    }
}

/// In-memory cluster over `files`, building `entry`.
pub fn build_files(files: &[(&str, &str)], entry: &str) -> Result<String, CompileError> {
    build_files_with(files, entry, CompilationSettings::default())
}

pub fn build_files_with(files: &[(&str, &str)], entry: &str, settings: CompilationSettings) -> Result<String, CompileError> {
    let loader = files.iter().fold(MemoryLoader::new(), |l, (path, text)| l.with_file(path, *text));
    let with_std = settings.std_lib.is_some();
    let mut cluster = Cluster::new(loader, settings);
    let mut sink = CollectingSink::default();
    cluster.build(Path::new(entry), with_std, &mut sink)
}

pub fn parse(source: &str) -> Vec<Stmt> {
    match parse_source(FileId(0), source) {
        Ok(stmts) => stmts,
        Err(err) => panic!("parse failed: {err}\nsource:\n{source}"),
    }
}

/// Prefix form of a source holding exactly one statement.
pub fn shape(source: &str) -> String {
    let stmts = parse(source);
    assert_eq!(stmts.len(), 1, "expected one statement in {source:?}");
    sexpr(&stmts[0])
}

/// Category, message, primary span text and notes of an error, one per line.
pub fn describe(err: &CompileError) -> String {
    let mut out = format!("{} error: {}", err.category(), err.message());
    if let Some(span) = err.span() {
        out += &format!("\n  at `{}`", span.text());
    }
    if let Some(notes) = err.notes() {
        if let Some(code) = notes.code {
            out += &format!("\n  code: {}", code.code());
        }
        if let Some(hint) = &notes.hint {
            out += &format!("\n  help: {hint}");
        }
        if let Some((span, label)) = &notes.secondary {
            out += &format!("\n  note: {label} `{}`", span.text());
        }
    }
    out
}
