//! Calls, member access, struct literals, enum values and `match`.

use super::Codegen;
use crate::diagnostics::CompileError;
use crate::parser::ast::{ArmBody, Ident, MatchArm, Stmt, StmtKind, TypeExpr};
use crate::span::Span;
use crate::typeck::resolve::bindings_for;
use crate::typeck::types::{EnumType, Type};
use crate::typeck::{ArmPattern, CallTarget, Member, Scope};

/// The variable a lowered `match` binds its scrutinee to.
pub const MATCH_VALUE: &str = "_internal_match_expr";

/// An empty case: its tag, or `null` for the empty case of a null-optimized enum.
pub fn case_tag(ty: &EnumType, discriminator: i64) -> String {
    if ty.null_discriminator == Some(discriminator) {
        "null".to_string()
    } else {
        discriminator.to_string()
    }
}

/// A case with data: `[tag,..fields]`, or for null-optimized enums the bare payload.
pub fn construct_case(ty: &EnumType, case: &str, args: Vec<String>) -> Result<String, CompileError> {
    let variant = ty
        .variant(case)
        .ok_or_else(|| CompileError::internal(format!("`{}` has no case `{case}`", ty.name)))?;
    Ok(match (ty.is_null_optimized(), args.as_slice()) {
        (true, [single]) => single.clone(),
        (true, _) => format!("[{}]", args.join(",")),
        (false, _) => {
            let fields: Vec<String> = std::iter::once(variant.discriminator.to_string()).chain(args.iter().cloned()).collect();
            format!("[{}]", fields.join(","))
        }
    })
}

/// Condition and payload bindings for one arm.
pub fn arm_condition(pattern: &ArmPattern) -> (String, Vec<String>) {
    let v = MATCH_VALUE;
    match pattern {
        ArmPattern::Tuple { ty, bindings, int_guard, .. } if ty.is_null_optimized() => {
            let mut cond = format!("{v}!=null");
            if *int_guard {
                cond += &format!("&&isFinite({v})");
            }
            let binds = match bindings.as_slice() {
                [(name, _)] => vec![format!("let {name} = {v}")],
                _ => bindings.iter().enumerate().map(|(i, (name, _))| format!("let {name} = {v}[{i}]")).collect(),
            };
            (cond, binds)
        }
        ArmPattern::Tuple { discriminator, bindings, .. } => {
            let cond = format!("{v} instanceof Array&&{v}[0]=={discriminator}");
            let binds = bindings.iter().enumerate().map(|(i, (name, _))| format!("let {name} = {v}[{}]", i + 1)).collect();
            (cond, binds)
        }
        ArmPattern::Empty { ty, int_guard, .. } if ty.is_null_optimized() => {
            let mut cond = format!("{v}==null");
            if *int_guard {
                cond += &format!("||!isFinite({v})");
            }
            (cond, Vec::new())
        }
        ArmPattern::Empty { discriminator, .. } => (format!("{v}=={discriminator}"), Vec::new()),
        ArmPattern::CatchAll { name } => ("true".to_string(), vec![format!("let {name} = {v}")]),
    }
}

impl<'a> Codegen<'a> {
    pub(super) fn call(&self, callee: &Stmt, args: &[Stmt], span: &Span, scope: &Scope<'_>, hint: Option<&Type>) -> Result<String, CompileError> {
        if let StmtKind::Ident(name) = &callee.node {
            if let Some(function) = scope.lookup_function(name).filter(|f| f.sig.flags.builtin) {
                match function.sig.name.as_str() {
                    "builtin_type" => {
                        let arg = args.first().ok_or_else(|| {
                            CompileError::type_err("`builtin_type` expects one argument", span.clone())
                        })?;
                        return Ok(format!("\"{}\"", scope.resolve_type(arg, None)?));
                    }
                    "builtin_panic_handler" => return Ok(self.settings.panic_handler_js.clone()),
                    _ => {}
                }
            }
        }

        let call = scope.resolve_call(callee, args, hint, span)?;
        let mut lowered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            lowered.push(self.expr(arg, scope, call.params.get(i))?);
        }

        match call.target {
            CallTarget::EnumCase { ty, case } => construct_case(&ty, &case, lowered),
            CallTarget::Function { function, method, instance } => {
                let name = instance.as_deref().unwrap_or(function.emitted_name());
                match (&callee.node, method) {
                    (StmtKind::Dot { lhs, member }, true) if function.associative => {
                        Ok(format!("{}.{}({})", self.expr(lhs, scope, None)?, member.node, lowered.join(",")))
                    }
                    (StmtKind::Dot { lhs, .. }, true) => {
                        let receiver = self.expr(lhs, scope, None)?;
                        let all: Vec<String> = std::iter::once(receiver).chain(lowered).collect();
                        Ok(format!("{name}({})", all.join(",")))
                    }
                    _ => Ok(format!("{name}({})", lowered.join(","))),
                }
            }
        }
    }

    pub(super) fn member(&self, lhs: &Stmt, member: &Ident, scope: &Scope<'_>, hint: Option<&Type>) -> Result<String, CompileError> {
        if let Type::Enum(e) = scope.resolve_type(lhs, None)? {
            let variant = e.variant(&member.node).ok_or_else(|| {
                CompileError::type_err(format!("`{}` has no case `{}`", e.name, member.node), member.span.clone())
            })?;
            return Ok(case_tag(&e, variant.discriminator));
        }
        let resolved = scope.resolve_member(lhs, member, hint)?;
        match (resolved.member, resolved.ty) {
            (Member::ModuleItem, Type::Fn(function)) | (Member::Method(function), _) => {
                Ok(function.emitted_name().to_string())
            }
            (Member::ModuleItem, _) => Ok(member.node.clone()),
            (Member::EnumCase { ty, case }, _) => {
                let discriminator = ty.variant(&case).map(|v| v.discriminator).unwrap_or_default();
                Ok(case_tag(&ty, discriminator))
            }
            (Member::Property, _) => Ok(format!("{}.{}", self.expr(lhs, scope, None)?, member.node)),
        }
    }

    pub(super) fn struct_literal(&self, ty: &TypeExpr, fields: &[(Ident, Stmt)], scope: &Scope<'_>) -> Result<String, CompileError> {
        let target = scope.resolve_type_expr(ty, &[])?;
        let property = |name: &str| match &target {
            Type::Struct(s) if s.generics.is_empty() => s.property(name).cloned(),
            Type::Applied { base, args } => match base.as_ref() {
                Type::Struct(s) => s.property(name).map(|p| p.substitute(&bindings_for(&s.generics, args))),
                _ => None,
            },
            _ => None,
        };
        let mut out = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let hint = property(&name.node);
            out.push(format!("{}:{}", name.node, self.expr(value, scope, hint.as_ref())?));
        }
        Ok(format!("{{{}}}", out.join(",")))
    }

    /// `{let _internal_match_expr = v;if(..){..}else if(..){..}}`. With a `sink`, arm values assign into it.
    pub(super) fn match_block(
        &self,
        value: &Stmt,
        arms: &[MatchArm],
        span: &Span,
        scope: &Scope<'_>,
        hint: Option<&Type>,
        sink: Option<&str>,
    ) -> Result<String, CompileError> {
        let matched = scope.resolve_type(value, None)?;
        let mut lowered = Vec::with_capacity(arms.len());
        for (index, arm) in arms.iter().enumerate() {
            let (mut child, pattern) = scope.arm_scope(&matched, arm, index, span)?;
            let body = match &arm.body {
                ArmBody::Inline(stmt) => match sink {
                    Some(sink) => {
                        let value = self.value(stmt, &child, hint)?;
                        format!("{}{sink} = {}", value.prelude, value.expr)
                    }
                    None => self.statement(stmt, &child, hint)?.unwrap_or_default(),
                },
                ArmBody::Scoped(body) => {
                    child.value_hint = hint.cloned();
                    child.init(body)?;
                    self.emit_body(body, &child, sink)?
                }
            };
            let (cond, bindings) = arm_condition(&pattern);
            let inner: Vec<String> = bindings.into_iter().chain(Some(body).filter(|b| !b.is_empty())).collect();
            lowered.push(match pattern {
                ArmPattern::CatchAll { .. } => format!("if (true) {{{}}}", inner.join(";")),
                _ => format!("if({cond}){{{}}}", inner.join(";")),
            });
        }
        Ok(format!("{{let {MATCH_VALUE} = {};{}}}", self.expr(value, scope, None)?, lowered.join("else ")))
    }
}
