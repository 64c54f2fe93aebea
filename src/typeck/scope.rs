use super::types::{ExtensionTable, FnRef, FnSig, Type};
use crate::modules::ModuleId;
use crate::parser::ast::{Stmt, StmtKind};
use crate::registry::Registry;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One node of the scope tree. Children borrow their parent; parents never see children.
#[derive(Debug)]
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    pub name: String,
    pub(crate) module: Option<ModuleId>,
    pub(crate) is_module_top: bool,
    pub(crate) registry: Rc<RefCell<Registry>>,
    pub variables: HashMap<String, Type>,
    pub types: HashMap<String, Type>,
    pub functions: HashMap<String, Rc<FnSig>>,
    pub extensions: HashMap<String, Rc<ExtensionTable>>,
    pub export_types: HashMap<String, Type>,
    pub required_return: Option<Type>,
    pub scoped_return: Option<Type>,
    /// Expected type of this scope's value, when it is used as an expression.
    pub value_hint: Option<Type>,
}

impl Scope<'static> {
    /// Root scope of a module.
    pub fn module_root(name: impl Into<String>, module: ModuleId, registry: Rc<RefCell<Registry>>) -> Self {
        let mut scope = Scope::detached(name, registry);
        scope.module = Some(module);
        scope.is_module_top = true;
        scope
    }

    /// A root scope that belongs to no module.
    pub fn detached(name: impl Into<String>, registry: Rc<RefCell<Registry>>) -> Self {
        Scope {
            parent: None,
            name: name.into(),
            module: None,
            is_module_top: false,
            registry,
            variables: HashMap::new(),
            types: HashMap::new(),
            functions: HashMap::new(),
            extensions: HashMap::new(),
            export_types: HashMap::new(),
            required_return: None,
            scoped_return: None,
            value_hint: None,
        }
    }
}

impl<'p> Scope<'p> {
    pub fn child(&self, name: impl Into<String>) -> Scope<'_> {
        Scope {
            parent: Some(self),
            name: name.into(),
            module: None,
            is_module_top: false,
            registry: self.registry.clone(),
            variables: HashMap::new(),
            types: HashMap::new(),
            functions: HashMap::new(),
            extensions: HashMap::new(),
            export_types: HashMap::new(),
            required_return: None,
            scoped_return: None,
            value_hint: None,
        }
    }

    pub fn parent(&self) -> Option<&Scope<'p>> {
        self.parent
    }

    pub fn registry(&self) -> &Rc<RefCell<Registry>> {
        &self.registry
    }

    pub fn module_id(&self) -> ModuleId {
        match (self.module, self.parent) {
            (Some(id), _) => id,
            (None, Some(parent)) => parent.module_id(),
            (None, None) => ModuleId(0),
        }
    }

    pub fn is_module_top(&self) -> bool {
        self.is_module_top
    }

    /// Value-level lookup: functions, then variables, then types, then the parent.
    pub fn lookup_name(&self, name: &str) -> Option<Type> {
        if let Some(sig) = self.functions.get(name) {
            return Some(Type::Fn(FnRef::plain(sig.clone())));
        }
        if let Some(t) = self.variables.get(name).or_else(|| self.types.get(name)) {
            return Some(t.clone());
        }
        self.parent?.lookup_name(name)
    }

    pub fn lookup_type(&self, name: &str) -> Option<Type> {
        match self.types.get(name) {
            Some(t) => Some(t.clone()),
            None => self.parent?.lookup_type(name),
        }
    }

    /// A named function visible from here, also through function-typed imports.
    pub fn lookup_function(&self, name: &str) -> Option<FnRef> {
        if let Some(sig) = self.functions.get(name) {
            return Some(FnRef::plain(sig.clone()));
        }
        if let Some(Type::Fn(f)) = self.types.get(name) {
            return Some(f.clone());
        }
        self.parent?.lookup_function(name)
    }

    /// Extension method lookup, innermost scope first. Generic targets match any argument.
    pub fn extension_member(&self, ty: &Type, member: &str) -> Option<FnRef> {
        let found = self
            .extensions
            .values()
            .filter(|t| t.ty.matches_wildcard(ty))
            .find_map(|t| t.function(member).cloned());
        found.or_else(|| self.parent?.extension_member(ty, member))
    }

    pub fn required_return_type(&self) -> Option<&Type> {
        match &self.required_return {
            Some(t) => Some(t),
            None => self.parent?.required_return_type(),
        }
    }

    /// Hidden variable a trailing `compiler.scopedReturn` statement assigns to.
    pub fn scoped_return_ident(&self) -> String {
        scoped_return_name(&self.name)
    }
}

pub fn scoped_return_name(scope_name: &str) -> String {
    format!("{scope_name}_CompilerScopedReturn")
}

/// Directives collected from the flags wrapping a statement.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub export: bool,
    pub builtin: bool,
    pub any_args: bool,
    pub scoped_return: bool,
    pub doc: Option<String>,
}

/// Dotted name of a flag expression; a call contributes its callee.
pub fn flag_path(stmt: &Stmt) -> String {
    match &stmt.node {
        StmtKind::Call { callee, .. } => flag_path(callee),
        other => other.path().unwrap_or_else(|| "???".to_string()),
    }
}

fn documentation(flag: &Stmt) -> Option<String> {
    match &flag.node {
        StmtKind::Call { args, .. } => match args.first().map(|a| &a.node) {
            Some(StmtKind::Str(text)) => Some(text.get(1..text.len().saturating_sub(1)).unwrap_or_default().to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// Peel every flag off `stmt`, returning the directives and the flagged statement.
pub fn unwrap_flags(mut stmt: &Stmt) -> (Flags, &Stmt) {
    let mut flags = Flags::default();
    while let StmtKind::Flag { flag, body } = &stmt.node {
        match flag_path(flag).as_str() {
            "compiler.export" => flags.export = true,
            "compiler.builtin" => flags.builtin = true,
            "compiler.scopedReturn" => flags.scoped_return = true,
            "unsafe.js.anyArgs" => flags.any_args = true,
            "documentation" => {
                if let Some(doc) = documentation(flag) {
                    flags.doc = Some(match flags.doc.take() {
                        Some(prev) => format!("{prev}\n{doc}"),
                        None => doc,
                    });
                }
            }
            other => tracing::trace!(flag = other, "ignoring unknown flag"),
        }
        stmt = body;
    }
    (flags, stmt)
}
