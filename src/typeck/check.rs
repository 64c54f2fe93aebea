//! Pass 7: the scoped return and the statement-level type check.

use super::infer::arithmetic;
use super::resolve::{dissolve, Bindings};
use super::scope::{unwrap_flags, Scope};
use super::types::{FnSig, Type};
use super::ModuleContext;
use crate::diagnostics::{CompileError, Explainer};
use crate::parser::ast::{AssignOp, BinaryOp, ExtensionDecl, Ident, IfChain, Stmt, StmtKind, TypeKind};

fn compound(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Set => None,
        AssignOp::Add => Some(BinaryOp::Add),
        AssignOp::Sub => Some(BinaryOp::Sub),
        AssignOp::Mul => Some(BinaryOp::Mul),
        AssignOp::Div => Some(BinaryOp::Div),
    }
}

impl<'p> Scope<'p> {
    /// Initialize a module root: the implicit std import, then the full pipeline with imports allowed.
    pub fn init_module(&mut self, body: &[Stmt], ctx: &mut ModuleContext<'_>) -> Result<(), CompileError> {
        if ctx.with_std {
            self.register_std(ctx)?;
        }
        self.register_explicit_exports(body, Some(&mut *ctx))?;
        self.register_imports(body, Some(ctx))?;
        self.init_declarations(body)
    }

    /// Run every pass over `body`. Only module roots may import, see [`Scope::init_module`].
    pub fn init(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        self.register_explicit_exports(body, None)?;
        self.register_imports(body, None)?;
        self.init_declarations(body)
    }

    fn init_declarations(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        self.register_types(body)?;
        self.register_functions(body)?;
        self.register_extensions(body)?;
        self.register_variables(body)?;
        self.check_body(body)
    }

    fn check_body(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        let last = body.len().checked_sub(1);
        for (index, stmt) in body.iter().enumerate() {
            let (flags, inner) = unwrap_flags(stmt);
            if flags.scoped_return && Some(index) == last {
                let hint = self.value_hint.clone();
                let ty = self.resolve_type(inner, hint.as_ref())?;
                tracing::trace!(scope = %self.name, ty = %ty, "scoped return");
                self.scoped_return = Some(ty);
                continue;
            }
            match &inner.node {
                StmtKind::Function(decl) => {
                    let Some(sig) = self.functions.get(&decl.name.node).cloned() else { continue };
                    if !sig.flags.builtin && !sig.is_generic() {
                        self.function_scope(&sig, &Bindings::new())?.init(&sig.decl.body)?;
                    }
                }
                StmtKind::Extension(decl) => self.check_extension(decl)?,
                _ => {
                    self.resolve_type(inner, None)?;
                }
            }
        }
        Ok(())
    }

    /// Child scope for a function body: parameters declared, generics bound to `bindings`.
    pub fn function_scope(&self, sig: &FnSig, bindings: &Bindings) -> Result<Scope<'_>, CompileError> {
        let mut child = self.child(format!("{}_fn{}", self.name, sig.name));
        for (name, ty) in bindings {
            child.types.insert(name.clone(), ty.clone());
        }
        for (param, ty) in sig.decl.params.iter().zip(&sig.params) {
            child.variables.insert(param.name.node.clone(), dissolve(ty, bindings, param.span())?);
        }
        child.required_return = Some(dissolve(&sig.ret, bindings, &sig.decl.ret.span)?);
        Ok(child)
    }

    /// The table an `extension`/`implement` declaration registered.
    pub fn extension_table_for(&self, decl: &ExtensionDecl) -> Option<std::rc::Rc<super::types::ExtensionTable>> {
        let TypeKind::Named { name, .. } = &decl.target.node else { return None };
        if decl.global {
            self.registry.borrow().implementation(&name.node).cloned()
        } else {
            self.extensions.get(&name.node).cloned()
        }
    }

    fn check_extension(&self, decl: &ExtensionDecl) -> Result<(), CompileError> {
        let Some(table) = self.extension_table_for(decl) else { return Ok(()) };
        for (_, function) in &table.functions {
            let sig = &function.sig;
            if sig.flags.builtin || sig.is_generic() {
                continue;
            }
            self.function_scope(sig, &Bindings::new())?.init(&sig.decl.body)?;
        }
        Ok(())
    }

    pub(crate) fn check_assignment(&self, op: AssignOp, lhs: &Stmt, rhs: &Stmt) -> Result<(), CompileError> {
        if !matches!(lhs.node, StmtKind::Ident(_) | StmtKind::Dot { .. }) {
            return Err(CompileError::type_err("invalid left-hand side of assignment", lhs.span.clone()));
        }
        let target = self.resolve_type(lhs, None)?;
        let value = self.resolve_type(rhs, Some(&target))?;
        let stored = match compound(op) {
            Some(binary) => arithmetic(binary, &target, &value, &rhs.span)?,
            None => value,
        };
        if !stored.equals(&target) {
            return Err(CompileError::mismatch("incorrect type in assignment", &target, &stored, rhs.span.clone())
                .with_code(Explainer::IncorrectRightHandTypeInAssignment));
        }
        Ok(())
    }

    pub(crate) fn check_return(&self, value: &Stmt) -> Result<(), CompileError> {
        let Some(required) = self.required_return_type().cloned() else {
            return Err(CompileError::type_err(
                "Unexpected return. Return is not valid in this context",
                value.span.clone(),
            ));
        };
        let actual = self.resolve_type(value, Some(&required))?;
        if !actual.equals(&required) {
            return Err(CompileError::mismatch("incorrect return type", &required, &actual, value.span.clone()));
        }
        Ok(())
    }

    fn expect_bool(&self, cond: &Stmt, context: &str) -> Result<(), CompileError> {
        let ty = self.resolve_type(cond, Some(&Type::BOOL))?;
        if !ty.equals(&Type::BOOL) {
            return Err(CompileError::mismatch(&format!("{context} condition must be a `bool`"), Type::BOOL, &ty, cond.span.clone()));
        }
        Ok(())
    }

    pub fn if_scope_name(&self) -> String {
        format!("{}_if", self.name)
    }

    pub fn loop_scope_name(&self) -> String {
        format!("{}_loop", self.name)
    }

    pub(crate) fn check_if(&self, chain: &IfChain) -> Result<(), CompileError> {
        for arm in &chain.arms {
            self.expect_bool(&arm.cond, "`if`")?;
            self.child(self.if_scope_name()).init(&arm.body)?;
        }
        if let Some(body) = &chain.else_body {
            self.child(self.if_scope_name()).init(body)?;
        }
        Ok(())
    }

    pub(crate) fn check_while(&self, cond: &Stmt, body: &[Stmt]) -> Result<(), CompileError> {
        self.expect_bool(cond, "`while`")?;
        self.child(self.loop_scope_name()).init(body)
    }

    /// The body scope of a `for` loop, with the loop variable declared.
    pub fn for_scope(&self, var: &Ident, iter: &Stmt) -> Result<Scope<'_>, CompileError> {
        let not_range = || CompileError::type_err("`for` can only iterate over an int range", iter.span.clone());
        let StmtKind::Range { lhs, rhs, .. } = &iter.node else { return Err(not_range()) };
        for bound in [lhs, rhs] {
            let ty = self.resolve_type(bound, Some(&Type::INT))?;
            if !ty.equals(&Type::INT) {
                return Err(CompileError::mismatch("range bounds must be `int`", Type::INT, &ty, bound.span.clone()));
            }
        }
        let mut child = self.child(self.loop_scope_name());
        child.variables.insert(var.node.clone(), Type::INT);
        Ok(child)
    }

    pub(crate) fn check_for(&self, var: &Ident, iter: &Stmt, body: &[Stmt]) -> Result<(), CompileError> {
        self.for_scope(var, iter)?.init(body)
    }
}
