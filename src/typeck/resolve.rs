//! Generic parameter binding.

use super::types::Type;
use crate::diagnostics::CompileError;
use crate::span::Span;
use std::collections::HashMap;

pub type Bindings = HashMap<String, Type>;

/// Walk `shape` and `actual` in lock-step, binding every generic parameter of `shape`.
/// The first binding of a parameter wins; a still-generic `actual` never binds.
pub fn unify(shape: &Type, actual: &Type, bindings: &mut Bindings) {
    match (shape, actual) {
        (_, Type::Generic(_)) => {}
        (Type::Generic(name), _) => {
            if !bindings.contains_key(name) {
                tracing::trace!(parameter = %name, bound = %actual, "bound generic");
                bindings.insert(name.clone(), actual.clone());
            }
        }
        (Type::Applied { args: shape_args, .. }, Type::Applied { args, .. }) => {
            for (s, a) in shape_args.iter().zip(args) {
                unify(s, a, bindings);
            }
        }
        _ => {}
    }
}

pub fn bindings_for(generics: &[String], args: &[Type]) -> Bindings {
    generics.iter().cloned().zip(args.iter().cloned()).collect()
}

/// The bound arguments, in declaration order.
pub fn bound_args(generics: &[String], bindings: &Bindings, span: &Span) -> Result<Vec<Type>, CompileError> {
    generics
        .iter()
        .map(|g| {
            bindings
                .get(g)
                .cloned()
                .ok_or_else(|| CompileError::type_err(format!("Missing generic parameter `{g}`"), span.clone()))
        })
        .collect()
}

/// [`Type::dissolve`] with the unbound parameter reported at `span`.
pub fn dissolve(ty: &Type, bindings: &Bindings, span: &Span) -> Result<Type, CompileError> {
    ty.dissolve(bindings)
        .map_err(|name| CompileError::type_err(format!("Missing generic parameter `{name}`"), span.clone()))
}
