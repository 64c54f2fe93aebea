use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::codegen::Codegen;
use crate::diagnostics::CompileError;
use crate::modules::ModuleId;
use crate::registry::{FnId, Registry};
use crate::typeck::resolve::bindings_for;
use crate::typeck::types::{FnSig, Type};
use crate::typeck::Scope;

struct Pending {
    sig: Rc<FnSig>,
    owner: ModuleId,
    args: Vec<Type>,
    name: String,
}

/// Emit one specialized body per recorded instantiation.
///
/// Bodies are compiled in a child of the declaring module's root scope, with the
/// generic parameters bound as types. Compiling a body can record further
/// instantiations; those are picked up until a round finds nothing new.
pub fn monomorphize<'s>(
    codegen: &Codegen<'_>,
    registry: &Rc<RefCell<Registry>>,
    module_scope: impl Fn(ModuleId) -> Option<&'s Scope<'static>>,
) -> Result<Vec<String>, CompileError> {
    let mut emitted: HashSet<(FnId, String)> = HashSet::new();
    let mut out = Vec::new();
    let mut iteration = 0;

    loop {
        let pending: Vec<Pending> = {
            let registry = registry.borrow();
            registry
                .generic_functions()
                .iter()
                .flat_map(|g| {
                    g.instances.iter().map(move |inst| Pending {
                        sig: g.sig.clone(),
                        owner: g.owner,
                        args: inst.args.clone(),
                        name: inst.name.clone(),
                    })
                })
                .filter(|p| !emitted.contains(&(p.sig.id, p.name.clone())))
                .collect()
        };
        if pending.is_empty() {
            break;
        }
        iteration += 1;
        tracing::debug!(iteration, count = pending.len(), "monomorphizing");

        for item in pending {
            emitted.insert((item.sig.id, item.name.clone()));
            if item.sig.flags.builtin {
                continue;
            }
            let root = module_scope(item.owner).ok_or_else(|| {
                CompileError::internal(format!("module {} of `{}` is not loaded", item.owner.0, item.sig.name))
            })?;
            let bindings = bindings_for(&item.sig.generics, &item.args);
            tracing::debug!(function = %item.sig.name, instance = %item.name, "emitting specialization");
            out.push(codegen.function(root, &item.sig, &bindings, &item.name)?);
        }
    }

    Ok(out)
}
