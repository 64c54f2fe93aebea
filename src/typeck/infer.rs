//! Expression typing: `resolve_type` and the lookups the code generator shares with it.

use super::resolve::{bindings_for, bound_args, dissolve, unify, Bindings};
use super::scope::Scope;
use super::types::{Builtin, EnumType, FnRef, StructType, Type};
use crate::diagnostics::CompileError;
use crate::parser::ast::{ArmBody, BinaryOp, Ident, MatchArm, Stmt, StmtKind, TypeExpr, TypeKind};
use crate::span::Span;
use std::rc::Rc;

/// What a call expression invokes.
#[derive(Debug, Clone)]
pub enum CallTarget {
    Function {
        function: FnRef,
        /// Called as `receiver.f(args)`.
        method: bool,
        /// Specialization name for generic callees.
        instance: Option<String>,
    },
    EnumCase { ty: Rc<EnumType>, case: String },
}

#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub target: CallTarget,
    /// Expected argument types, generics applied. Empty for `unsafe.js.anyArgs` callees.
    pub params: Vec<Type>,
    pub ret: Type,
}

/// What `lhs.member` refers to.
#[derive(Debug, Clone)]
pub enum Member {
    EnumCase { ty: Rc<EnumType>, case: String },
    ModuleItem,
    Property,
    Method(FnRef),
}

#[derive(Debug, Clone)]
pub struct ResolvedMember {
    pub member: Member,
    pub ty: Type,
}

/// A match arm pattern, checked against the matched value's type.
#[derive(Debug, Clone)]
pub enum ArmPattern {
    /// `Case(a, b)`: binds the payload.
    Tuple {
        ty: Rc<EnumType>,
        discriminator: i64,
        bindings: Vec<(String, Type)>,
        /// Null-optimized with a lone `int` payload.
        int_guard: bool,
    },
    /// A case without data.
    Empty { ty: Rc<EnumType>, discriminator: i64, int_guard: bool },
    /// A bare identifier that is not a case name binds the whole value.
    CatchAll { name: String },
}

fn value_type(ty: Type) -> Type {
    match ty {
        Type::Enum(e) => Type::EnumValue { ty: e, member: None },
        other => other,
    }
}

fn generic_arity(ty: &Type) -> usize {
    match ty {
        Type::Struct(s) => s.generics.len(),
        Type::Enum(e) | Type::EnumValue { ty: e, .. } => e.generics.len(),
        _ => 0,
    }
}

/// Operand types of a binary operator, with the hint each side was resolved against.
#[derive(Debug, Clone)]
pub struct Operands {
    pub lhs: Type,
    pub rhs: Type,
    pub lhs_hint: Option<Type>,
    pub rhs_hint: Option<Type>,
}

/// `int / int` is `float`, matching JavaScript division; every other `int` pair stays `int`.
pub(crate) fn arithmetic(op: BinaryOp, lhs: &Type, rhs: &Type, span: &Span) -> Result<Type, CompileError> {
    use Builtin::{Float, Int};
    match (lhs.builtin(), rhs.builtin()) {
        (Some(Int), Some(Int)) if op == BinaryOp::Div => Ok(Type::FLOAT),
        (Some(Int), Some(Int)) => Ok(Type::INT),
        (Some(Int | Float), Some(Int | Float)) => Ok(Type::FLOAT),
        _ => Err(CompileError::type_err(
            format!("cannot apply `{}` to `{lhs}` and `{rhs}`", op.symbol()),
            span.clone(),
        )),
    }
}

/// The null-optimized payload is a lone `int` once the enum's generics are applied.
fn has_int_guard(ty: &EnumType, generics: &Bindings) -> bool {
    ty.is_null_optimized()
        && matches!(ty.data_payload(), Some([payload]) if payload.substitute(generics).equals(&Type::INT))
}

fn case_name(stmt: &Stmt) -> Option<&str> {
    match &stmt.node {
        StmtKind::Ident(name) => Some(name),
        StmtKind::Dot { member, .. } => Some(&member.node),
        _ => None,
    }
}

impl<'p> Scope<'p> {
    fn named_type(&self, name: &Ident, generics: &[String]) -> Result<Type, CompileError> {
        if generics.contains(&name.node) {
            return Ok(Type::Generic(name.node.clone()));
        }
        if let Some(builtin) = Builtin::from_name(&name.node) {
            return Ok(Type::Builtin(builtin));
        }
        match self.lookup_type(&name.node) {
            Some(Type::Fn(_)) => Err(CompileError::type_err(format!("`{}` is a function, not a type", name.node), name.span.clone())),
            Some(ty) => Ok(value_type(ty)),
            None => Err(CompileError::type_err(format!("cannot find type `{}` in this scope", name.node), name.span.clone())),
        }
    }

    /// Resolve a written type. Names in `generics` become generic parameters.
    pub fn resolve_type_expr(&self, ty: &TypeExpr, generics: &[String]) -> Result<Type, CompileError> {
        match &ty.node {
            TypeKind::Named { name, args } => {
                let base = self.named_type(name, generics)?;
                if args.is_empty() {
                    return Ok(base);
                }
                let arity = generic_arity(&base);
                if arity != args.len() {
                    return Err(CompileError::type_err(
                        format!("`{}` expects {arity} generic argument(s), found {}", name.node, args.len()),
                        ty.span.clone(),
                    ));
                }
                let args = args.iter().map(|a| self.resolve_type_expr(a, generics)).collect::<Result<Vec<_>, _>>()?;
                Ok(Type::Applied { base: Box::new(base), args })
            }
            TypeKind::Dot { lhs, member } => match self.resolve_type_expr(lhs, generics)? {
                Type::Module(items) => items.get(&member.node).cloned().map(value_type).ok_or_else(|| {
                    CompileError::type_err(format!("module has no exported type `{}`", member.node), member.span.clone())
                }),
                other => Err(CompileError::type_err(format!("`{other}` is not a module"), lhs.span.clone())),
            },
            TypeKind::Tuple(_) => Err(CompileError::type_err("tuple types are not supported", ty.span.clone())),
        }
    }

    /// Type of `stmt`. `hint` is the type the context expects; it only steers generic inference.
    pub fn resolve_type(&self, stmt: &Stmt, hint: Option<&Type>) -> Result<Type, CompileError> {
        match &stmt.node {
            StmtKind::Int(_) => Ok(Type::INT),
            StmtKind::Float(_) => Ok(Type::FLOAT),
            StmtKind::Str(_) => Ok(Type::STRING),
            StmtKind::Ident(name) => match self.lookup_name(name) {
                Some(ty) => Ok(ty),
                None if name == "true" || name == "false" => Ok(Type::BOOL),
                None => Err(CompileError::type_err(format!("cannot find `{name}` in this scope"), stmt.span.clone())),
            },
            StmtKind::Binary { op, lhs, rhs } => {
                let operands = self.arithmetic_operands(lhs, rhs)?;
                arithmetic(*op, &operands.lhs, &operands.rhs, &stmt.span)
            }
            StmtKind::Compare { op, lhs, rhs } => self.resolve_comparison(op.symbol(), lhs, rhs, &stmt.span),
            StmtKind::Assign { op, lhs, rhs } => {
                self.check_assignment(*op, lhs, rhs)?;
                Ok(Type::VOID)
            }
            StmtKind::Group(inner) => self.resolve_type(inner, hint),
            StmtKind::Call { callee, args } => Ok(self.resolve_call(callee, args, hint, &stmt.span)?.ret),
            StmtKind::Dot { lhs, member } => Ok(self.resolve_member(lhs, member, hint)?.ty),
            StmtKind::Range { .. } => Err(CompileError::type_err(
                "ranges can only be used as the header of a `for` loop",
                stmt.span.clone(),
            )),
            StmtKind::StructLiteral { ty, fields } => self.resolve_struct_literal(ty, fields, &stmt.span),
            StmtKind::Match { value, arms } => self.resolve_match(value, arms, hint, &stmt.span),
            StmtKind::Scope(body) => {
                let mut child = self.child(self.block_scope_name(&stmt.span));
                child.value_hint = hint.cloned();
                child.init(body)?;
                Ok(child.scoped_return.take().unwrap_or(Type::VOID))
            }
            StmtKind::Return(value) => {
                self.check_return(value)?;
                Ok(Type::VOID)
            }
            StmtKind::If(chain) => {
                self.check_if(chain)?;
                Ok(Type::VOID)
            }
            StmtKind::While { cond, body } => {
                self.check_while(cond, body)?;
                Ok(Type::VOID)
            }
            StmtKind::For { var, iter, body } => {
                self.check_for(var, iter, body)?;
                Ok(Type::VOID)
            }
            StmtKind::Flag { body, .. } => self.resolve_type(body, hint),
            StmtKind::Let { .. }
            | StmtKind::Function(_)
            | StmtKind::Struct(_)
            | StmtKind::Enum(_)
            | StmtKind::Extension(_)
            | StmtKind::Import(_)
            | StmtKind::ExportModule { .. } => Ok(Type::VOID),
        }
    }

    pub fn block_scope_name(&self, span: &Span) -> String {
        format!("{}_s{}", self.name, span.start)
    }

    /// Comparison operands. The right side is resolved against the left; a left side that
    /// cannot be resolved alone is resolved against the right instead.
    pub fn comparison_operands(&self, lhs: &Stmt, rhs: &Stmt) -> Result<Operands, CompileError> {
        match self.resolve_type(lhs, None) {
            Ok(l) => {
                let r = self.resolve_type(rhs, Some(&l))?;
                Ok(Operands { rhs_hint: Some(l.clone()), lhs: l, rhs: r, lhs_hint: None })
            }
            Err(err) => {
                tracing::trace!(error = %err, "left operand needs a hint, resolving the right first");
                self.hinted_left(lhs, rhs)
            }
        }
    }

    /// Arithmetic operands resolve on their own. One that needs a hint takes its sibling's type.
    pub fn arithmetic_operands(&self, lhs: &Stmt, rhs: &Stmt) -> Result<Operands, CompileError> {
        let l = match self.resolve_type(lhs, None) {
            Ok(l) => l,
            Err(err) => {
                tracing::trace!(error = %err, "left operand needs a hint, resolving the right first");
                return self.hinted_left(lhs, rhs);
            }
        };
        match self.resolve_type(rhs, None) {
            Ok(r) => Ok(Operands { lhs: l, rhs: r, lhs_hint: None, rhs_hint: None }),
            Err(err) => {
                tracing::trace!(error = %err, "right operand needs a hint");
                let r = self.resolve_type(rhs, Some(&l))?;
                Ok(Operands { rhs_hint: Some(l.clone()), lhs: l, rhs: r, lhs_hint: None })
            }
        }
    }

    fn hinted_left(&self, lhs: &Stmt, rhs: &Stmt) -> Result<Operands, CompileError> {
        let r = self.resolve_type(rhs, None)?;
        let l = self.resolve_type(lhs, Some(&r))?;
        Ok(Operands { lhs: l, lhs_hint: Some(r.clone()), rhs: r, rhs_hint: None })
    }

    fn resolve_comparison(&self, symbol: &str, lhs: &Stmt, rhs: &Stmt, span: &Span) -> Result<Type, CompileError> {
        let Operands { lhs: l, rhs: r, .. } = self.comparison_operands(lhs, rhs)?;
        match (l.builtin(), r.builtin()) {
            (Some(Builtin::Void), Some(Builtin::Void)) => {
                Err(CompileError::type_err(format!("cannot compare `void` values with `{symbol}`"), span.clone()))
            }
            (Some(lb), Some(rb)) if lb == rb => Ok(Type::BOOL),
            (Some(_), Some(_)) => Err(CompileError::mismatch("cannot compare values of different types", &l, &r, rhs.span.clone())),
            _ => Err(CompileError::type_err(
                format!("cannot compare non-primitive types `{l}` and `{r}`"),
                span.clone(),
            )),
        }
    }

    /// Method `member` on values of type `ty`: local extensions first, then `implement` blocks.
    pub fn method(&self, ty: &Type, member: &Ident) -> Result<FnRef, CompileError> {
        if let Some(f) = self.extension_member(ty, &member.node) {
            return Ok(f);
        }
        let found = self.registry.borrow().implementation_member(ty, &member.node);
        found.ok_or_else(|| {
            CompileError::type_err(format!("no method `{}` found for `{ty}`", member.node), member.span.clone())
        })
    }

    pub fn resolve_member(&self, lhs: &Stmt, member: &Ident, hint: Option<&Type>) -> Result<ResolvedMember, CompileError> {
        let owner = self.resolve_type(lhs, None)?;
        match &owner {
            Type::Enum(e) => return self.enum_case_value(e, member, hint),
            Type::Module(items) => {
                let ty = items.get(&member.node).cloned().ok_or_else(|| {
                    CompileError::type_err(format!("module has no exported member `{}`", member.node), member.span.clone())
                })?;
                return Ok(ResolvedMember { member: Member::ModuleItem, ty });
            }
            Type::Struct(s) => {
                if let Some(ty) = s.property(&member.node) {
                    return Ok(ResolvedMember { member: Member::Property, ty: ty.clone() });
                }
            }
            Type::Applied { base, args } => {
                if let Type::Struct(s) = base.as_ref() {
                    if let Some(ty) = s.property(&member.node) {
                        let ty = ty.substitute(&bindings_for(&s.generics, args));
                        return Ok(ResolvedMember { member: Member::Property, ty });
                    }
                }
            }
            _ => {}
        }
        match self.method(&owner, member) {
            Ok(f) => Ok(ResolvedMember { ty: Type::Fn(f.clone()), member: Member::Method(f) }),
            Err(_) => Err(CompileError::type_err(
                format!("no member `{}` on `{owner}`", member.node),
                member.span.clone(),
            )),
        }
    }

    fn enum_case_value(&self, e: &Rc<EnumType>, member: &Ident, hint: Option<&Type>) -> Result<ResolvedMember, CompileError> {
        let variant = e.variant(&member.node).ok_or_else(|| {
            CompileError::type_err(format!("`{}` has no case `{}`", e.name, member.node), member.span.clone())
        })?;
        if variant.payload.is_some() {
            return Err(CompileError::type_err(
                format!("case `{}` carries data and must be called", member.node),
                member.span.clone(),
            ));
        }
        let value = Type::EnumValue { ty: e.clone(), member: Some(member.node.clone()) };
        let target = ResolvedMember::enum_case(e, &member.node);
        if e.generics.is_empty() {
            return Ok(ResolvedMember { ty: value, ..target });
        }
        match hint.filter(|h| h.base().equals(&Type::Enum(e.clone())) && !h.generic_args().is_empty()) {
            Some(h) => Ok(ResolvedMember {
                ty: Type::Applied { base: Box::new(value), args: h.generic_args().to_vec() },
                ..target
            }),
            None => Err(CompileError::type_err("cannot interpret the generic value to use", member.span.clone())
                .with_hint(format!("annotate the expected type, e.g. `let x: {}<int> = ..`", e.name))),
        }
    }

    pub fn resolve_call(&self, callee: &Stmt, args: &[Stmt], hint: Option<&Type>, span: &Span) -> Result<ResolvedCall, CompileError> {
        if let StmtKind::Dot { lhs, member } = &callee.node {
            let receiver = self.resolve_type(lhs, None)?;
            match &receiver {
                Type::Enum(e) => return self.construct_case(e, member, args, hint, span),
                Type::Module(_) => {}
                _ => {
                    let function = self.method(&receiver, member)?;
                    return self.call_function(function, Some(&receiver), args, hint, span);
                }
            }
        }
        match self.resolve_type(callee, None)? {
            Type::Fn(function) => self.call_function(function, None, args, hint, span),
            other => Err(CompileError::type_err(format!("`{other}` is not a function"), callee.span.clone())),
        }
    }

    fn call_function(
        &self,
        function: FnRef,
        receiver: Option<&Type>,
        args: &[Stmt],
        hint: Option<&Type>,
        span: &Span,
    ) -> Result<ResolvedCall, CompileError> {
        let sig = function.sig.clone();
        let method = receiver.is_some();
        if sig.flags.any_args {
            for arg in args {
                self.resolve_type(arg, None)?;
            }
            let ret = sig.ret.clone();
            let target = CallTarget::Function { function, method, instance: None };
            return Ok(ResolvedCall { target, params: Vec::new(), ret });
        }

        let params = sig.params.get(usize::from(method)..).unwrap_or_default();
        if params.len() != args.len() {
            return Err(CompileError::type_err(
                format!("`{}` expects {} argument(s), found {}", sig.name, params.len(), args.len()),
                span.clone(),
            ));
        }

        if !sig.is_generic() {
            for (arg, param) in args.iter().zip(params) {
                let actual = self.resolve_type(arg, Some(param))?;
                if !actual.equals(param) {
                    return Err(CompileError::mismatch("incorrect argument type", param, &actual, arg.span.clone()));
                }
            }
            let ret = sig.ret.clone();
            let params = params.to_vec();
            return Ok(ResolvedCall { target: CallTarget::Function { function, method, instance: None }, params, ret });
        }

        let mut bindings = Bindings::new();
        if let Some(hint) = hint {
            unify(&sig.ret, hint, &mut bindings);
        }
        if let (Some(receiver), Some(first)) = (receiver, sig.params.first()) {
            unify(first, receiver, &mut bindings);
        }
        let mut actuals = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(params) {
            let actual = self.resolve_type(arg, Some(&param.substitute(&bindings)))?;
            unify(param, &actual, &mut bindings);
            actuals.push(actual);
        }
        let type_args = bound_args(&sig.generics, &bindings, span)?;
        let mut expected_params = Vec::with_capacity(params.len());
        for ((arg, param), actual) in args.iter().zip(params).zip(&actuals) {
            let expected = dissolve(param, &bindings, &arg.span)?;
            if !actual.equals(&expected) {
                return Err(CompileError::mismatch("incorrect argument type", &expected, actual, arg.span.clone()));
            }
            expected_params.push(expected);
        }
        let ret = dissolve(&sig.ret, &bindings, span)?;
        let instance = if sig.flags.builtin {
            None
        } else {
            Some(self.registry.borrow_mut().add_generic_function(sig.id, type_args)?)
        };
        let target = CallTarget::Function { function, method, instance };
        Ok(ResolvedCall { target, params: expected_params, ret })
    }

    fn construct_case(
        &self,
        e: &Rc<EnumType>,
        member: &Ident,
        args: &[Stmt],
        hint: Option<&Type>,
        span: &Span,
    ) -> Result<ResolvedCall, CompileError> {
        let variant = e.variant(&member.node).ok_or_else(|| {
            CompileError::type_err(format!("`{}` has no case `{}`", e.name, member.node), member.span.clone())
        })?;
        let Some(payload) = &variant.payload else {
            return Err(CompileError::type_err(
                "Trying to add data to a case that doesn't is not allowed",
                span.clone(),
            ));
        };
        if payload.len() != args.len() {
            return Err(CompileError::type_err(
                format!("`{}.{}` expects {} value(s), found {}", e.name, member.node, payload.len(), args.len()),
                span.clone(),
            ));
        }

        let mut bindings = match hint.filter(|h| h.base().equals(&Type::Enum(e.clone()))) {
            Some(h) => bindings_for(&e.generics, h.generic_args()),
            None => Bindings::new(),
        };
        let mut actuals = Vec::with_capacity(args.len());
        for (arg, ty) in args.iter().zip(payload) {
            let actual = self.resolve_type(arg, Some(&ty.substitute(&bindings)))?;
            unify(ty, &actual, &mut bindings);
            actuals.push(actual);
        }
        let mut params = Vec::with_capacity(payload.len());
        for ((arg, ty), actual) in args.iter().zip(payload).zip(&actuals) {
            let expected = dissolve(ty, &bindings, &arg.span)?;
            if !actual.equals(&expected) {
                return Err(CompileError::mismatch("incorrect payload type", &expected, actual, arg.span.clone()));
            }
            params.push(expected);
        }

        let value = Type::EnumValue { ty: e.clone(), member: Some(member.node.clone()) };
        let ret = if e.generics.is_empty() {
            value
        } else {
            Type::Applied { base: Box::new(value), args: bound_args(&e.generics, &bindings, span)? }
        };
        let target = CallTarget::EnumCase { ty: e.clone(), case: member.node.clone() };
        Ok(ResolvedCall { target, params, ret })
    }

    fn resolve_struct_literal(&self, ty: &TypeExpr, fields: &[(Ident, Stmt)], span: &Span) -> Result<Type, CompileError> {
        let target = self.resolve_type_expr(ty, &[])?;
        let (def, mut bindings, applied): (Rc<StructType>, Bindings, bool) = match &target {
            Type::Struct(s) => (s.clone(), Bindings::new(), false),
            Type::Applied { base, args } => match base.as_ref() {
                Type::Struct(s) => (s.clone(), bindings_for(&s.generics, args), true),
                _ => return Err(CompileError::type_err(format!("`{target}` is not a struct"), ty.span.clone())),
            },
            _ => return Err(CompileError::type_err(format!("`{target}` is not a struct"), ty.span.clone())),
        };

        for (name, _) in fields {
            if def.property(&name.node).is_none() {
                return Err(CompileError::type_err(
                    format!("`{}` has no property `{}`", def.name, name.node),
                    name.span.clone(),
                ));
            }
        }
        if let Some((missing, _)) = def.properties.iter().find(|(p, _)| !fields.iter().any(|(n, _)| n.node == *p)) {
            return Err(CompileError::type_err(format!("missing property `{missing}` in `{}`", def.name), span.clone()));
        }

        let mut actuals = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let declared = def.property(&name.node).cloned().unwrap_or(Type::VOID);
            let actual = self.resolve_type(value, Some(&declared.substitute(&bindings)))?;
            unify(&declared, &actual, &mut bindings);
            actuals.push((declared, actual));
        }
        for ((name, value), (declared, actual)) in fields.iter().zip(&actuals) {
            let expected = dissolve(declared, &bindings, &value.span)?;
            if !actual.equals(&expected) {
                return Err(CompileError::mismatch(
                    &format!("incorrect type for property `{}`", name.node),
                    &expected,
                    actual,
                    value.span.clone(),
                ));
            }
        }

        if def.generics.is_empty() || applied {
            return Ok(target);
        }
        let args = bound_args(&def.generics, &bindings, span)?;
        Ok(Type::Applied { base: Box::new(Type::Struct(def)), args })
    }

    /// Name of the hidden variable a match in value position assigns into.
    pub fn match_scope_name(&self, span: &Span) -> String {
        format!("{}_m{}", self.name, span.start)
    }

    /// Check `pattern` against `matched`.
    pub fn analyze_arm(&self, pattern: &Stmt, matched: &Type) -> Result<ArmPattern, CompileError> {
        let not_enum = || {
            CompileError::type_err(format!("cannot match `{matched}` against an enum case"), pattern.span.clone())
        };
        let generics = match matched.as_enum() {
            Some(e) => bindings_for(&e.generics, matched.generic_args()),
            None => Bindings::new(),
        };
        match &pattern.node {
            StmtKind::Call { callee, args } => {
                let case = case_name(callee).ok_or_else(|| CompileError::type_err("invalid match pattern", callee.span.clone()))?;
                let e = matched.as_enum().ok_or_else(not_enum)?;
                let variant = e.variant(case).ok_or_else(|| {
                    CompileError::type_err(format!("`{}` has no case `{case}`", e.name), callee.span.clone())
                })?;
                let Some(payload) = &variant.payload else {
                    return Err(CompileError::type_err(format!("case `{case}` carries no data"), pattern.span.clone()));
                };
                if payload.len() != args.len() {
                    return Err(CompileError::type_err(
                        format!("case `{case}` carries {} value(s), found {} binding(s)", payload.len(), args.len()),
                        pattern.span.clone(),
                    ));
                }
                let bindings = args
                    .iter()
                    .zip(payload)
                    .map(|(arg, ty)| match &arg.node {
                        StmtKind::Ident(name) => Ok((name.clone(), ty.substitute(&generics))),
                        _ => Err(CompileError::type_err("only names can be bound in a match arm", arg.span.clone())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ArmPattern::Tuple {
                    ty: e.clone(),
                    discriminator: variant.discriminator,
                    bindings,
                    int_guard: has_int_guard(e, &generics),
                })
            }
            StmtKind::Dot { member, .. } => {
                let e = matched.as_enum().ok_or_else(not_enum)?;
                self.empty_case(e, &member.node, &generics, &member.span)
            }
            StmtKind::Ident(name) => match matched.as_enum().filter(|e| e.variant(name).is_some()) {
                Some(e) => self.empty_case(e, name, &generics, &pattern.span),
                None => Ok(ArmPattern::CatchAll { name: name.clone() }),
            },
            _ => Err(CompileError::type_err("invalid match pattern", pattern.span.clone())),
        }
    }

    fn empty_case(&self, e: &Rc<EnumType>, case: &str, generics: &Bindings, span: &Span) -> Result<ArmPattern, CompileError> {
        let variant = e
            .variant(case)
            .ok_or_else(|| CompileError::type_err(format!("`{}` has no case `{case}`", e.name), span.clone()))?;
        if variant.payload.is_some() {
            return Err(CompileError::type_err(
                format!("case `{case}` carries data; bind it with `{case}(..)`"),
                span.clone(),
            ));
        }
        Ok(ArmPattern::Empty { ty: e.clone(), discriminator: variant.discriminator, int_guard: has_int_guard(e, generics) })
    }

    /// The child scope an arm body runs in, with the pattern's bindings declared.
    pub fn arm_scope(&self, matched: &Type, arm: &MatchArm, index: usize, match_span: &Span) -> Result<(Scope<'_>, ArmPattern), CompileError> {
        let pattern = self.analyze_arm(&arm.pattern, matched)?;
        let mut child = self.child(format!("{}_{index}", self.match_scope_name(match_span)));
        match &pattern {
            ArmPattern::Tuple { bindings, .. } => {
                for (name, ty) in bindings {
                    child.variables.insert(name.clone(), ty.clone());
                }
            }
            ArmPattern::CatchAll { name } => {
                child.variables.insert(name.clone(), matched.clone());
            }
            ArmPattern::Empty { .. } => {}
        }
        Ok((child, pattern))
    }

    fn resolve_match(&self, value: &Stmt, arms: &[MatchArm], hint: Option<&Type>, span: &Span) -> Result<Type, CompileError> {
        let matched = self.resolve_type(value, None)?;
        let mut result: Option<Type> = None;
        for (index, arm) in arms.iter().enumerate() {
            let (mut child, _) = self.arm_scope(&matched, arm, index, span)?;
            let ty = match &arm.body {
                ArmBody::Inline(stmt) => child.resolve_type(stmt, hint)?,
                ArmBody::Scoped(body) => {
                    child.value_hint = hint.cloned();
                    child.init(body)?;
                    child.scoped_return.take().unwrap_or(Type::VOID)
                }
            };
            match &result {
                None => result = Some(ty),
                Some(first) if !first.equals(&ty) => {
                    return Err(CompileError::mismatch("match arms have incompatible types", first, &ty, arm.span.clone()));
                }
                Some(_) => {}
            }
        }
        Ok(result.unwrap_or(Type::VOID))
    }
}

impl ResolvedMember {
    fn enum_case(ty: &Rc<EnumType>, case: &str) -> Self {
        ResolvedMember {
            member: Member::EnumCase { ty: ty.clone(), case: case.to_string() },
            ty: Type::VOID,
        }
    }
}
