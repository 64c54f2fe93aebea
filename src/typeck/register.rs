//! Declaration passes run by [`Scope::init`], in order: re-exports, imports,
//! types, function signatures, extensions, `let` variables.

use super::scope::{unwrap_flags, Flags, Scope};
use super::types::{EnumType, EnumVariant, ExtensionTable, FnFlags, FnRef, FnSig, StructType, Type};
use super::ModuleContext;
use crate::diagnostics::{CompileError, Explainer};
use crate::modules::{Export, ImportedModule};
use crate::parser::ast::{
    EnumDecl, ExtensionDecl, FunctionDecl, Ident, ImportDecl, ImportScope, Stmt, StmtKind, StructDecl, TypeExpr, TypeKind,
};
use std::collections::BTreeMap;
use std::rc::Rc;

fn names(idents: &[Ident]) -> Vec<String> {
    idents.iter().map(|i| i.node.clone()).collect()
}

impl<'p> Scope<'p> {
    fn import(&self, ctx: &mut ModuleContext<'_>, source: &Ident, with_std: bool) -> Result<ImportedModule, CompileError> {
        ctx.importer.import_module(ctx.dir, &source.node, with_std).map_err(|err| match err {
            CompileError::Io { msg, .. } => CompileError::declaration(msg, source.span.clone()),
            other => other,
        })
    }

    fn add_extension_exports(&mut self, module: &ImportedModule) {
        for export in &module.exports {
            if let Export::Extension { name, table } = export {
                self.extensions.insert(name.clone(), table.clone());
            }
        }
    }

    /// Implicit `import * from <std>`.
    pub(crate) fn register_std(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), CompileError> {
        let Some(std) = ctx.std_lib else { return Ok(()) };
        let path = std.to_string_lossy().into_owned();
        tracing::debug!(scope = %self.name, std = %path, "importing std lib");
        let module = ctx.importer.import_module(ctx.dir, &path, false)?;
        self.add_type_exports(&module);
        self.add_extension_exports(&module);
        Ok(())
    }

    fn add_type_exports(&mut self, module: &ImportedModule) {
        for export in &module.exports {
            if let Export::Type { name, value } = export {
                self.types.insert(name.clone(), value.clone());
            }
        }
    }

    fn namespace(module: &ImportedModule) -> Type {
        let types: BTreeMap<String, Type> = module
            .exports
            .iter()
            .filter_map(|e| match e {
                Export::Type { name, value } => Some((name.clone(), value.clone())),
                Export::Extension { .. } => None,
            })
            .collect();
        Type::Module(Rc::new(types))
    }

    /// Pass 1: `export * from` and `export * as N from`.
    pub(crate) fn register_explicit_exports(
        &mut self,
        body: &[Stmt],
        mut ctx: Option<&mut ModuleContext<'_>>,
    ) -> Result<(), CompileError> {
        for stmt in body {
            let (_, stmt) = unwrap_flags(stmt);
            let StmtKind::ExportModule { source, alias } = &stmt.node else { continue };
            let Some(ctx) = ctx.as_deref_mut() else {
                return Err(CompileError::declaration("can only export modules from the top of a module", stmt.span.clone()));
            };
            let with_std = ctx.with_std;
            let module = self.import(ctx, source, with_std)?;
            self.add_extension_exports(&module);
            match alias {
                Some(alias) => {
                    self.export_types.insert(alias.node.clone(), Self::namespace(&module));
                }
                None => {
                    for export in &module.exports {
                        if let Export::Type { name, value } = export {
                            self.export_types.insert(name.clone(), value.clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Pass 2: imports.
    pub(crate) fn register_imports(
        &mut self,
        body: &[Stmt],
        mut ctx: Option<&mut ModuleContext<'_>>,
    ) -> Result<(), CompileError> {
        for stmt in body {
            let (_, stmt) = unwrap_flags(stmt);
            let StmtKind::Import(ImportDecl { source, scope }) = &stmt.node else { continue };
            let Some(ctx) = ctx.as_deref_mut() else {
                return Err(CompileError::declaration("can only import on modules", stmt.span.clone()));
            };
            let with_std = ctx.with_std;
            let module = self.import(ctx, source, with_std)?;
            match scope {
                ImportScope::All { alias: None } => {
                    self.add_type_exports(&module);
                    self.add_extension_exports(&module);
                }
                ImportScope::All { alias: Some(alias) } => {
                    self.add_extension_exports(&module);
                    self.types.insert(alias.node.clone(), Self::namespace(&module));
                }
                ImportScope::Items(items) => {
                    for item in items {
                        self.import_item(&module, source, &item.name, item.binding())?;
                    }
                }
            }
        }
        Ok(())
    }

    fn import_item(&mut self, module: &ImportedModule, source: &Ident, name: &Ident, binding: &str) -> Result<(), CompileError> {
        if module.private_functions.iter().any(|f| *f == name.node) {
            return Err(CompileError::declaration("trying to import a private item", name.span.clone())
                .with_hint("try adding `export` before the function"));
        }
        for export in &module.exports {
            match export {
                Export::Type { name: n, value } if *n == name.node => {
                    self.types.insert(binding.to_string(), value.clone());
                    return Ok(());
                }
                Export::Extension { name: n, table } if *n == name.node => {
                    self.extensions.insert(n.clone(), table.clone());
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(CompileError::declaration(
            format!("`{}` is not exported by `{}`", name.node, source.node),
            name.span.clone(),
        ))
    }

    fn declare_type(&mut self, name: &Ident, ty: Type, export: bool) -> Result<(), CompileError> {
        if self.types.contains_key(&name.node) && !self.is_module_top() {
            return Err(CompileError::declaration(
                format!("`{}` is already declared in this scope", name.node),
                name.span.clone(),
            ));
        }
        if export {
            self.export_types.insert(name.node.clone(), ty.clone());
        }
        self.types.insert(name.node.clone(), ty);
        Ok(())
    }

    /// Pass 3: structs and enums.
    pub(crate) fn register_types(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        for stmt in body {
            let (flags, stmt) = unwrap_flags(stmt);
            match &stmt.node {
                StmtKind::Struct(decl) => {
                    let ty = self.struct_type(decl, &flags)?;
                    self.declare_type(&decl.name, ty, flags.export)?;
                }
                StmtKind::Enum(decl) => {
                    let ty = self.enum_type(decl, &flags)?;
                    self.declare_type(&decl.name, ty, flags.export)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn struct_type(&self, decl: &StructDecl, flags: &Flags) -> Result<Type, CompileError> {
        let generics = names(&decl.generics);
        let properties = decl
            .fields
            .iter()
            .map(|f| Ok((f.name.node.clone(), self.resolve_type_expr(&f.ty, &generics)?)))
            .collect::<Result<Vec<_>, CompileError>>()?;
        Ok(Type::Struct(Rc::new(StructType {
            name: decl.name.node.clone(),
            properties,
            generics,
            doc: flags.doc.clone(),
        })))
    }

    fn enum_type(&self, decl: &EnumDecl, flags: &Flags) -> Result<Type, CompileError> {
        let generics = names(&decl.generics);
        let mut variants = Vec::with_capacity(decl.cases.len());
        for case in &decl.cases {
            let payload = match &case.payload {
                Some(types) => Some(
                    types.iter().map(|t| self.resolve_type_expr(t, &generics)).collect::<Result<Vec<_>, _>>()?,
                ),
                None => None,
            };
            variants.push(EnumVariant { name: case.name.node.clone(), discriminator: case.discriminator, payload });
        }
        let with_data = variants.iter().filter(|v| v.payload.is_some()).count();
        let null_discriminator = match (variants.len(), with_data) {
            (2, 1) => variants.iter().find(|v| v.payload.is_none()).map(|v| v.discriminator),
            _ => None,
        };
        Ok(Type::Enum(Rc::new(EnumType {
            name: decl.name.node.clone(),
            variants,
            null_discriminator,
            generics,
            doc: flags.doc.clone(),
        })))
    }

    /// Resolve a declaration into a signature. `outer` generics and the `receiver` type of a bare
    /// `self` come from an enclosing extension target.
    pub(crate) fn function_sig(
        &self,
        decl: &Rc<FunctionDecl>,
        flags: &Flags,
        outer: &[String],
        receiver: Option<&TypeExpr>,
    ) -> Result<Rc<FnSig>, CompileError> {
        let mut generics: Vec<String> = outer.to_vec();
        for g in &decl.generics {
            if !generics.contains(&g.node) {
                generics.push(g.node.clone());
            }
        }
        let params = decl
            .params
            .iter()
            .map(|p| match (&p.ty, receiver) {
                (Some(ty), _) | (None, Some(ty)) => self.resolve_type_expr(ty, &generics),
                (None, None) => Err(CompileError::declaration(
                    "`self` without a type is only allowed in an extension",
                    p.name.span.clone(),
                )
                .with_hint("add a type annotation: `self: T`")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ret = self.resolve_type_expr(&decl.ret, &generics)?;
        let id = self.registry.borrow_mut().fn_id(&decl.name.span);
        Ok(Rc::new(FnSig {
            id,
            name: decl.name.node.clone(),
            generics,
            params,
            ret,
            flags: FnFlags {
                export: flags.export,
                builtin: flags.builtin,
                any_args: flags.any_args,
                doc: flags.doc.clone(),
            },
            decl: decl.clone(),
        }))
    }

    /// Pass 4: function signatures.
    pub(crate) fn register_functions(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        for stmt in body {
            let (flags, stmt) = unwrap_flags(stmt);
            let StmtKind::Function(decl) = &stmt.node else { continue };
            if !self.is_module_top() {
                return Err(CompileError::declaration(
                    "function can only be declared module top for now",
                    decl.name.span.clone(),
                ));
            }
            let sig = self.function_sig(decl, &flags, &[], None)?;
            if sig.is_generic() {
                self.registry.borrow_mut().add_generic_declaration(sig.clone(), self.module_id());
            }
            self.functions.insert(sig.name.clone(), sig);
        }
        Ok(())
    }

    /// Pass 5: `extension` and `implement` blocks.
    pub(crate) fn register_extensions(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        for stmt in body {
            let (flags, inner) = unwrap_flags(stmt);
            let StmtKind::Extension(decl) = &inner.node else { continue };
            let table = Rc::new(self.extension_table(decl, flags.export, &inner.span)?);
            if decl.global {
                self.registry.borrow_mut().implement(table)?;
            } else {
                if let Some(existing) = self.extensions.get(&table.target).filter(|e| e.decl.file == table.decl.file) {
                    return Err(CompileError::declaration(
                        format!("an extension for `{}` is already declared in this scope", table.target),
                        decl.target.span.clone(),
                    )
                    .with_secondary(existing.decl.clone(), "previous extension here"));
                }
                self.extensions.insert(table.target.clone(), table);
            }
        }
        Ok(())
    }

    fn extension_table(&self, decl: &ExtensionDecl, export: bool, span: &crate::span::Span) -> Result<ExtensionTable, CompileError> {
        let (target, generics) = match &decl.target.node {
            TypeKind::Named { name, args } => {
                let generics = args
                    .iter()
                    .filter_map(|a| match &a.node {
                        TypeKind::Named { name, args } if args.is_empty() && self.lookup_type(&name.node).is_none() => {
                            Some(name.node.clone())
                        }
                        _ => None,
                    })
                    .collect::<Vec<_>>();
                (name.node.clone(), generics)
            }
            _ => {
                return Err(CompileError::declaration(
                    "Cannot implement types for module subtypes",
                    decl.target.span.clone(),
                ));
            }
        };
        let ty = self.resolve_type_expr(&decl.target, &generics)?;
        let prefix = if decl.global { "implementation" } else { "extension" };

        let mut functions = Vec::new();
        for stmt in &decl.body {
            let (flags, inner) = unwrap_flags(stmt);
            if flags.export {
                return Err(CompileError::declaration(
                    "functions declared in an extension are always exported",
                    stmt.span.clone(),
                ));
            }
            let StmtKind::Function(f) = &inner.node else {
                return Err(CompileError::declaration(
                    "only functions are allowed in the body of an extension",
                    inner.span.clone(),
                ));
            };
            let sig = self.function_sig(f, &flags, &generics, Some(&decl.target))?;
            let Some(first) = f.params.first() else {
                return Err(CompileError::declaration(
                    "A extension function must have at least one self parameter",
                    f.name.span.clone(),
                ));
            };
            if first.name.node != "self" {
                return Err(CompileError::declaration(
                    "The first argument of an extension must be called `self`",
                    first.name.span.clone(),
                ));
            }
            if !sig.params[0].equals(&ty) {
                return Err(CompileError::declaration(
                    format!("`self` must have the extended type: expected `{ty}`, found `{}`", sig.params[0]),
                    first.span().clone(),
                ));
            }
            if sig.is_generic() {
                self.registry.borrow_mut().add_generic_declaration(sig.clone(), self.module_id());
            }
            let rename = format!("{prefix}_{target}_{}", sig.name);
            let associative = sig.flags.builtin;
            functions.push((sig.name.clone(), FnRef { sig, associative, rename: Some(rename) }));
        }

        Ok(ExtensionTable { target, ty, functions, export, global: decl.global, decl: span.clone() })
    }

    /// Pass 6: `let` bindings, in source order.
    pub(crate) fn register_variables(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        for stmt in body {
            let (_, stmt) = unwrap_flags(stmt);
            let StmtKind::Let { name, ty, value } = &stmt.node else { continue };
            let declared = ty.as_ref().map(|t| self.resolve_type_expr(t, &[])).transpose()?;
            let actual = self.resolve_type(value, declared.as_ref())?;
            let binding = match (declared, ty) {
                (Some(declared), Some(ty_expr)) => {
                    if !actual.equals(&declared) {
                        return Err(CompileError::mismatch("incorrect type in let assignment", &declared, &actual, ty_expr.span.clone())
                            .with_code(Explainer::IncorrectTypeInLetAssignment));
                    }
                    declared
                }
                _ => actual,
            };
            tracing::trace!(scope = %self.name, variable = %name.node, ty = %binding, "declared");
            self.variables.insert(name.node.clone(), binding);
        }
        Ok(())
    }
}
