//! JavaScript emission. Scopes are rebuilt while walking the tree, the same way
//! the type checker builds them, so every lookup here sees exactly what the
//! checker saw.

pub mod lower;

use crate::config::CompilationSettings;
use crate::diagnostics::CompileError;
use crate::parser::ast::{IfChain, Stmt, StmtKind};
use crate::typeck::resolve::Bindings;
use crate::typeck::types::{FnSig, Type};
use crate::typeck::{scoped_return_name, unwrap_flags, Scope};

/// Lowers checked statements to JavaScript.
pub struct Codegen<'a> {
    settings: &'a CompilationSettings,
}

/// An expression plus the statements that must run before it.
#[derive(Debug, Default)]
pub struct Value {
    pub prelude: String,
    pub expr: String,
}

impl<'a> Codegen<'a> {
    pub fn new(settings: &'a CompilationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompilationSettings {
        self.settings
    }

    /// Every statement of an initialized scope, joined with `;`.
    pub fn statements(&self, body: &[Stmt], scope: &Scope<'_>) -> Result<String, CompileError> {
        self.emit_body(body, scope, None)
    }

    /// Like [`Codegen::statements`]; a trailing `compiler.scopedReturn` statement assigns into `sink`.
    pub fn emit_body(&self, body: &[Stmt], scope: &Scope<'_>, sink: Option<&str>) -> Result<String, CompileError> {
        let mut out = Vec::with_capacity(body.len());
        let last = body.len().checked_sub(1);
        for (index, stmt) in body.iter().enumerate() {
            let (flags, inner) = unwrap_flags(stmt);
            let code = match sink {
                Some(sink) if flags.scoped_return && Some(index) == last => {
                    let value = self.value(inner, scope, scope.value_hint.as_ref())?;
                    Some(format!("{}{sink} = {}", value.prelude, value.expr))
                }
                _ => self.statement(inner, scope, None)?,
            };
            out.extend(code.filter(|c| !c.is_empty()));
        }
        Ok(out.join(";"))
    }

    /// Lower one statement; declarations that produce no code yield `None`.
    pub fn statement(&self, stmt: &Stmt, scope: &Scope<'_>, hint: Option<&Type>) -> Result<Option<String>, CompileError> {
        let code = match &stmt.node {
            StmtKind::Flag { body, .. } => return self.statement(body, scope, hint),
            StmtKind::Function(decl) => {
                let Some(sig) = scope.functions.get(&decl.name.node).cloned() else {
                    return Err(CompileError::internal(format!("function `{}` was never registered", decl.name.node)));
                };
                if sig.flags.builtin || sig.is_generic() {
                    return Ok(None);
                }
                self.function(scope, &sig, &Bindings::new(), &sig.name)?
            }
            StmtKind::Extension(decl) => {
                let Some(table) = scope.extension_table_for(decl) else { return Ok(None) };
                let mut functions = String::new();
                for (_, function) in &table.functions {
                    if function.sig.flags.builtin || function.sig.is_generic() {
                        continue;
                    }
                    functions += &self.function(scope, &function.sig, &Bindings::new(), function.emitted_name())?;
                }
                if functions.is_empty() {
                    return Ok(None);
                }
                functions
            }
            StmtKind::Struct(_) | StmtKind::Enum(_) | StmtKind::Import(_) | StmtKind::ExportModule { .. } => {
                return Ok(None);
            }
            StmtKind::Let { name, ty, value } => {
                let declared = match ty {
                    Some(ty) => Some(scope.resolve_type_expr(ty, &[])?),
                    None => None,
                };
                let value = self.value(value, scope, declared.as_ref())?;
                format!("{}let {} = {}", value.prelude, name.node, value.expr)
            }
            StmtKind::Return(value) => {
                let required = scope.required_return_type().cloned();
                let value = self.value(value, scope, required.as_ref())?;
                format!("{}return {}", value.prelude, value.expr)
            }
            StmtKind::Assign { op, lhs, rhs } => {
                let target = scope.resolve_type(lhs, None)?;
                let value = self.value(rhs, scope, Some(&target))?;
                format!("{}{} {} {}", value.prelude, self.expr(lhs, scope, None)?, op.symbol(), value.expr)
            }
            StmtKind::If(chain) => self.if_chain(chain, scope)?,
            StmtKind::While { cond, body } => {
                let mut child = scope.child(scope.loop_scope_name());
                child.init(body)?;
                format!("while({}){{{}}}", self.expr(cond, scope, None)?, self.statements(body, &child)?)
            }
            StmtKind::For { var, iter, body } => {
                let StmtKind::Range { lhs, rhs, inclusive } = &iter.node else {
                    return Err(CompileError::type_err("`for` can only iterate over an int range", iter.span.clone()));
                };
                let mut child = scope.for_scope(var, iter)?;
                child.init(body)?;
                let cmp = if *inclusive { "<=" } else { "<" };
                format!(
                    "for(let {v} = {};{v}{cmp}{};++{v}){{{}}}",
                    self.expr(lhs, scope, None)?,
                    self.expr(rhs, scope, None)?,
                    self.statements(body, &child)?,
                    v = var.node,
                )
            }
            StmtKind::Scope(body) => {
                let mut child = scope.child(scope.block_scope_name(&stmt.span));
                child.init(body)?;
                format!("{{{}}}", self.statements(body, &child)?)
            }
            StmtKind::Match { value, arms } => self.match_block(value, arms, &stmt.span, scope, hint, None)?,
            _ => self.expr(stmt, scope, hint)?,
        };
        Ok(Some(code))
    }

    /// `function name(a,b) {body}` with the body compiled in a fresh function scope.
    pub fn function(&self, scope: &Scope<'_>, sig: &FnSig, bindings: &Bindings, name: &str) -> Result<String, CompileError> {
        let mut child = scope.function_scope(sig, bindings)?;
        child.init(&sig.decl.body)?;
        let params: Vec<&str> = sig.decl.params.iter().map(|p| p.name.node.as_str()).collect();
        Ok(format!("function {name}({}) {{{}}}", params.join(","), self.statements(&sig.decl.body, &child)?))
    }

    fn if_chain(&self, chain: &IfChain, scope: &Scope<'_>) -> Result<String, CompileError> {
        let mut arms = Vec::with_capacity(chain.arms.len());
        for arm in &chain.arms {
            let mut child = scope.child(scope.if_scope_name());
            child.init(&arm.body)?;
            arms.push(format!("if({}){{{}}}", self.expr(&arm.cond, scope, None)?, self.statements(&arm.body, &child)?));
        }
        let mut out = arms.join("else ");
        if let Some(body) = &chain.else_body {
            let mut child = scope.child(scope.if_scope_name());
            child.init(body)?;
            out += &format!("else{{{}}}", self.statements(body, &child)?);
        }
        Ok(out)
    }

    /// Lower a value position. Block scopes and matches assign into a hidden variable declared in the prelude.
    pub fn value(&self, stmt: &Stmt, scope: &Scope<'_>, hint: Option<&Type>) -> Result<Value, CompileError> {
        match &stmt.node {
            StmtKind::Scope(body) => {
                let mut child = scope.child(scope.block_scope_name(&stmt.span));
                child.value_hint = hint.cloned();
                child.init(body)?;
                let hidden = scoped_return_name(&child.name);
                let body = self.emit_body(body, &child, Some(&hidden))?;
                Ok(Value { prelude: format!("let {hidden};{{{body}}}"), expr: hidden })
            }
            StmtKind::Match { value, arms } => {
                let hidden = scoped_return_name(&scope.match_scope_name(&stmt.span));
                let block = self.match_block(value, arms, &stmt.span, scope, hint, Some(&hidden))?;
                Ok(Value { prelude: format!("let {hidden};{block}"), expr: hidden })
            }
            StmtKind::Group(inner) if matches!(inner.node, StmtKind::Scope(_) | StmtKind::Match { .. }) => {
                self.value(inner, scope, hint)
            }
            _ => Ok(Value { prelude: String::new(), expr: self.expr(stmt, scope, hint)? }),
        }
    }

    /// Lower an expression.
    pub fn expr(&self, stmt: &Stmt, scope: &Scope<'_>, hint: Option<&Type>) -> Result<String, CompileError> {
        match &stmt.node {
            StmtKind::Int(text) | StmtKind::Float(text) | StmtKind::Str(text) => Ok(text.clone()),
            StmtKind::Ident(name) => match scope.lookup_name(name) {
                Some(Type::Fn(function)) => Ok(function.emitted_name().to_string()),
                _ => Ok(name.clone()),
            },
            StmtKind::Binary { op, lhs, rhs } => {
                let operands = scope.arithmetic_operands(lhs, rhs)?;
                let l = self.expr(lhs, scope, operands.lhs_hint.as_ref())?;
                let r = self.expr(rhs, scope, operands.rhs_hint.as_ref())?;
                Ok(format!("({l} {} {r})", op.symbol()))
            }
            StmtKind::Compare { op, lhs, rhs } => {
                let operands = scope.comparison_operands(lhs, rhs)?;
                let l = self.expr(lhs, scope, operands.lhs_hint.as_ref())?;
                let r = self.expr(rhs, scope, operands.rhs_hint.as_ref())?;
                Ok(format!("{l}{}{r}", op.symbol()))
            }
            StmtKind::Group(inner) => Ok(format!("({})", self.expr(inner, scope, hint)?)),
            StmtKind::Call { callee, args } => self.call(callee, args, &stmt.span, scope, hint),
            StmtKind::Dot { lhs, member } => self.member(lhs, member, scope, hint),
            StmtKind::StructLiteral { ty, fields } => self.struct_literal(ty, fields, scope),
            StmtKind::Flag { body, .. } => self.expr(body, scope, hint),
            StmtKind::Range { .. } => Err(CompileError::type_err(
                "ranges can only be used as the header of a `for` loop",
                stmt.span.clone(),
            )),
            // Only `value` can give these a hidden variable.
            StmtKind::Scope(_) | StmtKind::Match { .. } => Err(CompileError::type_err(
                "a block or `match` used as a value must be the whole value of a `let`, `return` or assignment",
                stmt.span.clone(),
            )
            .with_hint("bind it to a variable first")),
            _ => match self.statement(stmt, scope, hint)? {
                Some(code) => Ok(code),
                None => Ok(String::new()),
            },
        }
    }
}
