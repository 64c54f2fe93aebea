//! Scopes, declaration registration and type resolution.
//!
//! A [`Scope`] is initialized from a statement list by a fixed pipeline (see
//! [`Scope::init`]); nested bodies get their own child scopes initialized the
//! same way. Nothing here touches the filesystem: imports go through
//! [`ModuleImporter`].

pub mod check;
pub mod infer;
pub mod register;
pub mod resolve;
pub mod scope;
pub mod types;

use crate::modules::ModuleImporter;
use std::path::Path;

pub use infer::{ArmPattern, CallTarget, Member, ResolvedCall, ResolvedMember};
pub use scope::{scoped_return_name, unwrap_flags, Flags, Scope};
pub use types::Type;

/// What a module root needs to resolve its imports.
pub struct ModuleContext<'a> {
    /// Directory import paths are relative to.
    pub dir: &'a Path,
    pub with_std: bool,
    pub std_lib: Option<&'a Path>,
    pub importer: &'a mut dyn ModuleImporter,
}
