pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod typeck;
pub mod registry;
pub mod monomorphize;
pub mod codegen;
pub mod modules;
pub mod config;

use config::CompilationSettings;
use diagnostics::{CompileError, DiagnosticSink};
use modules::{Cluster, FsLoader, MemoryLoader, SourceLoader};
use std::path::Path;

/// Path the source of [`compile_source`] is registered under.
pub const SOURCE_PATH: &str = "/main.ee";

/// Compile a single source string to JavaScript (lex → parse → scope init → codegen → monomorphize).
/// No file I/O apart from reading the configured std lib. The aborting error is also reported to `sink`.
pub fn compile_source(
    source: &str,
    settings: &CompilationSettings,
    sink: &mut dyn DiagnosticSink,
) -> Result<String, CompileError> {
    let mut loader = MemoryLoader::new().with_file(SOURCE_PATH, source);
    let with_std = settings.std_lib.is_some();
    if let Some(std) = &settings.std_lib {
        match FsLoader.read(std) {
            Ok(text) => loader.insert(std, text),
            Err(err) => {
                sink.report(&err);
                return Err(err);
            }
        }
    }
    let mut cluster = Cluster::new(loader, settings.clone());
    cluster.build(Path::new(SOURCE_PATH), with_std, sink)
}

/// Compile the module at `path` and everything it imports, reading from the filesystem.
pub fn compile_file(
    path: &Path,
    settings: &CompilationSettings,
    with_std: bool,
    sink: &mut dyn DiagnosticSink,
) -> Result<String, CompileError> {
    let mut cluster = Cluster::new(FsLoader, settings.clone());
    cluster.build(path, with_std && settings.std_lib.is_some(), sink)
}
