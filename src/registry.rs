//! Cluster-wide tables: `implement` blocks and generic function instantiations.

use crate::diagnostics::CompileError;
use crate::modules::ModuleId;
use crate::span::{FileId, Span};
use crate::typeck::types::{ExtensionTable, FnRef, FnSig, Type};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Stable identity of a function declaration, keyed by its declaration site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FnId(pub u32);

#[derive(Debug, Clone)]
pub struct Instantiation {
    pub args: Vec<Type>,
    pub name: String,
}

#[derive(Debug)]
pub struct GenericFunction {
    pub sig: Rc<FnSig>,
    /// Module whose root scope the specialized bodies are compiled in.
    pub owner: ModuleId,
    pub instances: Vec<Instantiation>,
}

#[derive(Debug, Default)]
pub struct Registry {
    ids: HashMap<(FileId, usize), FnId>,
    next_id: u32,
    generics: Vec<GenericFunction>,
    by_id: HashMap<FnId, usize>,
    implementations: BTreeMap<String, Rc<ExtensionTable>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of the function declared at `name`. The same site always yields the same id.
    pub fn fn_id(&mut self, name: &Span) -> FnId {
        if let Some(id) = self.ids.get(&(name.file, name.start)) {
            return *id;
        }
        let id = FnId(self.next_id);
        self.next_id += 1;
        self.ids.insert((name.file, name.start), id);
        id
    }

    /// Record a generic declaration. Registering the same declaration twice is a no-op.
    pub fn add_generic_declaration(&mut self, sig: Rc<FnSig>, owner: ModuleId) {
        if self.by_id.contains_key(&sig.id) {
            return;
        }
        tracing::debug!(function = %sig.name, id = sig.id.0, "registered generic function");
        self.by_id.insert(sig.id, self.generics.len());
        self.generics.push(GenericFunction { sig, owner, instances: Vec::new() });
    }

    /// Name of the specialization of `id` for `args`, creating it when it is new.
    pub fn add_generic_function(&mut self, id: FnId, args: Vec<Type>) -> Result<String, CompileError> {
        let idx = *self
            .by_id
            .get(&id)
            .ok_or_else(|| CompileError::internal(format!("generic function {} was never registered", id.0)))?;
        let entry = &mut self.generics[idx];
        if let Some(existing) = entry.instances.iter().find(|i| list_equals(&i.args, &args)) {
            return Ok(existing.name.clone());
        }
        let name = format!("generic_{}_{}", entry.instances.len(), entry.sig.name);
        tracing::debug!(function = %entry.sig.name, %name, "new generic instantiation");
        entry.instances.push(Instantiation { args, name: name.clone() });
        Ok(name)
    }

    pub fn generic_functions(&self) -> &[GenericFunction] {
        &self.generics
    }

    pub fn instantiation_count(&self) -> usize {
        self.generics.iter().map(|g| g.instances.len()).sum()
    }

    /// Register an `implement` block. Seeing the same block again is a no-op.
    pub fn implement(&mut self, table: Rc<ExtensionTable>) -> Result<(), CompileError> {
        if let Some(existing) = self.implementations.get(&table.target) {
            if existing.decl == table.decl {
                return Ok(());
            }
            return Err(CompileError::declaration(
                format!("`{}` is already implemented", table.target),
                table.decl.clone(),
            )
            .with_secondary(existing.decl.clone(), "first implemented here"));
        }
        self.implementations.insert(table.target.clone(), table);
        Ok(())
    }

    /// Method `member` of an implementation whose type matches `ty`, generic parameters matching anything.
    pub fn implementation_member(&self, ty: &Type, member: &str) -> Option<FnRef> {
        self.implementations
            .values()
            .filter(|t| t.ty.matches_wildcard(ty))
            .find_map(|t| t.function(member).cloned())
    }

    pub fn implementation(&self, target: &str) -> Option<&Rc<ExtensionTable>> {
        self.implementations.get(target)
    }

    /// Drop everything declared in `file`, before its module is recompiled from new text.
    pub fn forget_file(&mut self, file: FileId) {
        self.implementations.retain(|_, t| t.decl.file != file);
        self.generics.retain(|g| g.sig.decl.name.span.file != file);
        self.by_id = self.generics.iter().enumerate().map(|(i, g)| (g.sig.id, i)).collect();
        self.ids.retain(|(f, _), _| *f != file);
    }
}

fn list_equals(lhs: &[Type], rhs: &[Type]) -> bool {
    lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| l.equals(r))
}
