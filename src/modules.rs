use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use crate::codegen::Codegen;
use crate::config::CompilationSettings;
use crate::diagnostics::{CompileError, DiagnosticSink};
use crate::monomorphize::monomorphize;
use crate::parser::ast::Stmt;
use crate::parser::parse_source;
use crate::registry::Registry;
use crate::span::FileId;
use crate::typeck::types::{ExtensionTable, FnRef, Type};
use crate::typeck::{ModuleContext, Scope};

/// Index of a module within its [`Cluster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

/// Where module text comes from.
pub trait SourceLoader {
    /// The path modules are cached under.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, CompileError>;
    fn read(&self, path: &Path) -> Result<String, CompileError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, CompileError> {
        path.canonicalize()
            .map_err(|e| CompileError::io(format!("cannot resolve '{}': {e}", path.display()), path))
    }

    fn read(&self, path: &Path) -> Result<String, CompileError> {
        std::fs::read_to_string(path).map_err(|e| CompileError::io(format!("could not read '{}': {e}", path.display()), path))
    }
}

/// In-memory files, keyed by lexically normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), source.into());
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl SourceLoader for MemoryLoader {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, CompileError> {
        let normalized = normalize(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(CompileError::io(format!("cannot resolve '{}': no such file", normalized.display()), normalized))
        }
    }

    fn read(&self, path: &Path) -> Result<String, CompileError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| CompileError::io(format!("could not read '{}': no such file", path.display()), path))
    }
}

/// One item a module makes importable.
#[derive(Debug, Clone)]
pub enum Export {
    Type { name: String, value: Type },
    Extension { name: String, table: Rc<ExtensionTable> },
}

impl Export {
    pub fn name(&self) -> &str {
        match self {
            Export::Type { name, .. } | Export::Extension { name, .. } => name,
        }
    }
}

/// What an importing scope gets to see of another module.
#[derive(Debug, Clone)]
pub struct ImportedModule {
    pub path: PathBuf,
    pub exports: Vec<Export>,
    /// Functions declared without `export`, for the private-import diagnostic.
    pub private_functions: Vec<String>,
}

/// Loads (or returns the cached) module an `import` names.
pub trait ModuleImporter {
    fn import_module(&mut self, from_dir: &Path, path: &str, with_std: bool) -> Result<ImportedModule, CompileError>;
}

pub struct Module {
    pub id: ModuleId,
    pub name: String,
    pub path: PathBuf,
    pub file: FileId,
    pub with_std: bool,
    pub statements: Vec<Stmt>,
    pub scope: Scope<'static>,
}

impl Module {
    /// Exported functions, exported extensions and exported types, sorted by name within each group.
    pub fn exports(&self) -> Vec<Export> {
        let mut functions: Vec<Export> = self
            .scope
            .functions
            .iter()
            .filter(|(_, sig)| sig.flags.export)
            .map(|(name, sig)| Export::Type { name: name.clone(), value: Type::Fn(FnRef::plain(sig.clone())) })
            .collect();
        let mut extensions: Vec<Export> = self
            .scope
            .extensions
            .iter()
            .filter(|(_, table)| table.export)
            .map(|(name, table)| Export::Extension { name: name.clone(), table: table.clone() })
            .collect();
        let mut types: Vec<Export> = self
            .scope
            .export_types
            .iter()
            .map(|(name, value)| Export::Type { name: name.clone(), value: value.clone() })
            .collect();
        for group in [&mut functions, &mut extensions, &mut types] {
            group.sort_by(|a, b| a.name().cmp(b.name()));
        }
        functions.into_iter().chain(extensions).chain(types).collect()
    }

    pub fn export_named(&self, name: &str) -> Option<Export> {
        self.exports().into_iter().find(|export| export.name() == name)
    }

    pub fn private_functions(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.scope.functions.iter().filter(|(_, sig)| !sig.flags.export).map(|(n, _)| n.clone()).collect();
        names.sort();
        names
    }

    fn imported(&self) -> ImportedModule {
        ImportedModule { path: self.path.clone(), exports: self.exports(), private_functions: self.private_functions() }
    }
}

/// Scope names end up in generated identifiers.
fn module_name(path: &Path, id: ModuleId) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let clean: String = stem.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect();
    format!("{clean}_{}", id.0)
}

/// Every module of one compilation, sharing one [`Registry`].
pub struct Cluster<L: SourceLoader = FsLoader> {
    loader: L,
    settings: CompilationSettings,
    registry: Rc<RefCell<Registry>>,
    modules: HashMap<ModuleId, Module>,
    /// Completion order: a module comes after everything it imports.
    order: Vec<ModuleId>,
    by_path: HashMap<PathBuf, ModuleId>,
    loading: Vec<PathBuf>,
    next_module: usize,
    next_file: u32,
}

impl<L: SourceLoader> Cluster<L> {
    pub fn new(loader: L, settings: CompilationSettings) -> Self {
        Self {
            loader,
            settings,
            registry: Rc::new(RefCell::new(Registry::new())),
            modules: HashMap::new(),
            order: Vec::new(),
            by_path: HashMap::new(),
            loading: Vec::new(),
            next_module: 0,
            next_file: 0,
        }
    }

    pub fn settings(&self) -> &CompilationSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Rc<RefCell<Registry>> {
        &self.registry
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Modules in load order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    /// Load, parse and initialize the module at `path`. Already loaded modules are returned from the cache.
    pub fn add_module(&mut self, name: &str, path: &Path, with_std: bool) -> Result<ModuleId, CompileError> {
        let canonical = self.loader.canonicalize(path)?;
        if let Some(id) = self.by_path.get(&canonical) {
            return Ok(*id);
        }
        let source = self.loader.read(&canonical)?;
        self.load(Some(name), canonical, source, with_std)
    }

    /// Load `path` from `source` instead of the loader, replacing a previously loaded version.
    pub fn add_module_source(&mut self, name: &str, path: &Path, source: &str, with_std: bool) -> Result<ModuleId, CompileError> {
        let canonical = self.loader.canonicalize(path).unwrap_or_else(|_| normalize(path));
        self.load(Some(name), canonical, source.to_string(), with_std)
    }

    fn load(&mut self, name: Option<&str>, path: PathBuf, source: String, with_std: bool) -> Result<ModuleId, CompileError> {
        if self.loading.contains(&path) {
            return Err(CompileError::io("circular import", &path));
        }
        let id = match self.by_path.remove(&path) {
            Some(id) => id,
            None => {
                self.next_module += 1;
                ModuleId(self.next_module - 1)
            }
        };
        if let Some(old) = self.modules.remove(&id) {
            tracing::debug!(module = %old.name, "replacing module text");
            self.registry.borrow_mut().forget_file(old.file);
        }
        let name = name.map_or_else(|| module_name(&path, id), str::to_string);
        let file = FileId(self.next_file);
        self.next_file += 1;
        tracing::debug!(module = %name, path = %path.display(), file = file.0, "loading module");

        let statements = parse_source(file, source)?;
        let mut scope = Scope::module_root(name.clone(), id, self.registry.clone());
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let std_lib = self.settings.std_lib.clone();

        self.loading.push(path.clone());
        let result = {
            let mut ctx = ModuleContext { dir: &dir, with_std, std_lib: std_lib.as_deref(), importer: &mut *self };
            scope.init_module(&statements, &mut ctx)
        };
        self.loading.pop();
        result?;

        tracing::debug!(module = %name, "module initialized");
        self.by_path.insert(path.clone(), id);
        if !self.order.contains(&id) {
            self.order.push(id);
        }
        self.modules.insert(id, Module { id, name, path, file, with_std, statements, scope });
        Ok(id)
    }

    /// JavaScript for the whole cluster: specialized generic functions, then every module in load order.
    pub fn compile(&self) -> Result<String, CompileError> {
        let codegen = Codegen::new(&self.settings);
        let mut modules = Vec::with_capacity(self.order.len());
        for module in self.modules() {
            tracing::debug!(module = %module.name, "emitting module");
            modules.push(codegen.statements(&module.statements, &module.scope)?);
        }
        let generics = monomorphize(&codegen, &self.registry, |id| self.modules.get(&id).map(|m| &m.scope))?;
        let parts: Vec<String> = generics.into_iter().chain(modules).filter(|p| !p.is_empty()).collect();
        Ok(parts.join(";"))
    }

    /// Load `path` and compile the cluster. The error that aborts the run is also reported to `sink`.
    pub fn build(&mut self, path: &Path, with_std: bool, sink: &mut dyn DiagnosticSink) -> Result<String, CompileError> {
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "main".to_string());
        let name: String = name.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect();
        let result = self.add_module(&name, path, with_std).and_then(|_| self.compile());
        if let Err(err) = &result {
            sink.report(err);
        }
        result
    }
}

impl<L: SourceLoader> ModuleImporter for Cluster<L> {
    fn import_module(&mut self, from_dir: &Path, path: &str, with_std: bool) -> Result<ImportedModule, CompileError> {
        let target = Path::new(path);
        let target = if target.is_absolute() { target.to_path_buf() } else { from_dir.join(target) };
        let canonical = self.loader.canonicalize(&target)?;
        if self.loading.contains(&canonical) {
            return Err(CompileError::io("circular import", &canonical));
        }
        let id = match self.by_path.get(&canonical) {
            Some(id) => *id,
            None => {
                let source = self.loader.read(&canonical)?;
                self.load(None, canonical, source, with_std)?
            }
        };
        self.modules
            .get(&id)
            .map(Module::imported)
            .ok_or_else(|| CompileError::internal(format!("module {} vanished while importing", id.0)))
    }
}
