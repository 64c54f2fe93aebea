use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::CompileError;

pub const MANIFEST_NAME: &str = "eec.toml";
pub const DEFAULT_PANIC_HANDLER: &str = "throw new Error()";

/// Cluster-wide compilation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationSettings {
    /// Module implicitly imported by every module built with the std lib.
    pub std_lib: Option<PathBuf>,
    /// JavaScript emitted for `builtin_panic_handler()`.
    pub panic_handler_js: String,
}

impl Default for CompilationSettings {
    fn default() -> Self {
        Self { std_lib: None, panic_handler_js: DEFAULT_PANIC_HANDLER.to_string() }
    }
}

// ---- TOML deserialization types ----

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlManifest {
    #[serde(default)]
    compiler: TomlCompiler,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlCompiler {
    std: Option<String>,
    panic_handler_js: Option<String>,
}

/// Walk up from `start_dir` looking for `eec.toml`. Stops at a `.git` boundary.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() || !dir.pop() {
            return None;
        }
    }
}

/// Parse manifest text. Relative `std` paths are resolved against `manifest_path`'s directory.
pub fn parse_manifest(text: &str, manifest_path: &Path) -> Result<CompilationSettings, CompileError> {
    let manifest: TomlManifest = toml::from_str(text)
        .map_err(|e| CompileError::config(format!("{MANIFEST_NAME}: {}", e.message()), manifest_path))?;
    let manifest_dir = manifest_path.parent().unwrap_or(Path::new("."));
    let std_lib = manifest.compiler.std.map(|std| {
        let path = PathBuf::from(std);
        if path.is_absolute() { path } else { manifest_dir.join(path) }
    });
    Ok(CompilationSettings {
        std_lib,
        panic_handler_js: manifest
            .compiler
            .panic_handler_js
            .unwrap_or_else(|| DEFAULT_PANIC_HANDLER.to_string()),
    })
}

/// Settings for a build rooted at `entry_dir`: the nearest manifest, or defaults.
pub fn load_settings(entry_dir: &Path) -> Result<CompilationSettings, CompileError> {
    let Some(manifest_path) = find_manifest(entry_dir) else {
        return Ok(CompilationSettings::default());
    };
    tracing::debug!(manifest = %manifest_path.display(), "using manifest");
    let text = std::fs::read_to_string(&manifest_path)
        .map_err(|e| CompileError::config(format!("cannot read {MANIFEST_NAME}: {e}"), &manifest_path))?;
    parse_manifest(&text, &manifest_path)
}
