//! The statement and type grammars, in match order.

use super::ast::{
    AssignOp, BinaryOp, CompareOp, EnumDecl, ExtensionDecl, FunctionDecl, Ident, IfArm, IfChain, ImportDecl,
    ImportScope, Stmt, StmtKind, StructDecl, TypeKind,
};
use super::items;
use super::parse_block;
use super::pattern::{Captures, Pattern, Slot};
use super::rebalance::{attach, Operator};
use crate::diagnostics::CompileError;
use crate::lexer::token::is_reserved;
use crate::lexer::{bracket_body, Token};
use crate::span::{Span, Spanned};
use std::rc::Rc;
use std::sync::OnceLock;

type C = Captures<StmtKind>;
type Built = Result<Option<StmtKind>, CompileError>;

/// Words a type name can never be; keeps `return { .. }` from reading as a struct literal.
const STATEMENT_KEYWORDS: &[&str] = &[
    "let", "new", "enum", "function", "return", "if", "else", "while", "for", "loop", "match", "struct",
    "extension", "implement", "import", "export", "in",
];

pub fn statement_grammar() -> Result<&'static [Pattern<StmtKind>], CompileError> {
    static GRAMMAR: OnceLock<Result<Vec<Pattern<StmtKind>>, String>> = OnceLock::new();
    GRAMMAR
        .get_or_init(build_statement_grammar)
        .as_deref()
        .map_err(|e| CompileError::internal(e.clone()))
}

pub fn type_grammar() -> Result<&'static [Pattern<TypeKind>], CompileError> {
    static GRAMMAR: OnceLock<Result<Vec<Pattern<TypeKind>>, String>> = OnceLock::new();
    GRAMMAR
        .get_or_init(|| {
            Ok(vec![
                Pattern::new("Generic Type", "#ident-name #optional-generics-args", build_named_type)?,
                Pattern::new("Type Accessor using a dot", "#lh-expr-lhs . #ident-member", build_dotted_type)?,
                Pattern::new("Tuple Type", "#parenthesis-inner", build_tuple_type)?,
            ])
        })
        .as_deref()
        .map_err(|e| CompileError::internal(e.clone()))
}

fn build_statement_grammar() -> Result<Vec<Pattern<StmtKind>>, String> {
    Ok(vec![
        Pattern::new("Loop", "loop #block-body", build_loop)?,
        Pattern::new("Structured Data", "#type-ty #block-fields", build_struct_literal)?,
        Pattern::new("For a in b loop", "for #parenthesis-header #block-body", build_for)?,
        Pattern::new("While loop", "while #parenthesis-cond #block-body", build_while)?,
        Pattern::new("struct", "struct #ident-name #optional-generics-generics #block-fields", build_struct)?,
        Pattern::new("Line Terminator", "#lh-expr-inner ;", build_line_terminator)?,
        Pattern::new("Let Declaration with Inferred Type", "let #ident-name = #stm-value", build_let)?,
        Pattern::new("Let Declaration with Type", "let #ident-name : #type-ty = #stm-value", build_typed_let)?,
        Pattern::new("Export from module", "export * from #string-source", build_export_module)?,
        Pattern::new("Export from module as module", "export * as #ident-alias from #string-source", build_export_module)?,
        Pattern::new("Import all declaration", "import * from #string-source", build_import_all)?,
        Pattern::new("Import all as declaration", "import * as #ident-alias from #string-source", build_import_all)?,
        Pattern::new("Import selection declaration", "import #block-body from #string-source", build_import_items)?,
        Pattern::new("Documentation flag", "#doc-comment-doc #stm-body", build_doc_flag)?,
        Pattern::new("Macro and Flag call", "/ / ! #stm-flag #stm-body", build_flag)?,
        Pattern::new("If statement", "if #parenthesis-cond #block-body", build_if)?,
        Pattern::new("else if chain", "#lh-expr-lhs else if #parenthesis-cond #block-body", build_else_if)?,
        Pattern::new("else chain", "#lh-expr-lhs else #block-body", build_else)?,
        Pattern::new("Extension declaration", "extension #type-target #block-body", build_extension)?,
        Pattern::new("implement declaration", "implement #type-target #block-body", build_implementation)?,
        Pattern::new(
            "Function Declaration",
            "function #ident-name #optional-generics-generics #parenthesis-args : #type-ret #block-body",
            build_function,
        )?,
        Pattern::new("export flag syntax sugar", "export #stm-body", build_export_sugar)?,
        Pattern::new("return statement", "return #stm-value", build_return)?,
        Pattern::new("Enum Declaration", "enum #ident-name #optional-generics-generics #block-cases", build_enum)?,
        Pattern::new("Function Call", "#lh-expr-callee #parenthesis-args", build_call)?,
        Pattern::new("Accessor using a dot", "#lh-expr-lhs . #ident-member", build_dot)?,
        Pattern::new("Match Statement", "match #parenthesis-value #block-arms", build_match)?,
        Pattern::new("range expression starting with int", "#int-lhs .. #stm-rhs", build_int_range)?,
        Pattern::new("range expression", "#lh-expr-lhs .. #stm-rhs", build_range)?,
        Pattern::new("inclusive range expression", "#lh-expr-lhs ..= #stm-rhs", build_inclusive_range)?,
        Pattern::new("add assign", "#lh-expr-lhs += #stm-rhs", |c, _| assign(c, AssignOp::Add))?,
        Pattern::new("subtract assign", "#lh-expr-lhs -= #stm-rhs", |c, _| assign(c, AssignOp::Sub))?,
        Pattern::new("multiply assign", "#lh-expr-lhs *= #stm-rhs", |c, _| assign(c, AssignOp::Mul))?,
        Pattern::new("divide assign", "#lh-expr-lhs /= #stm-rhs", |c, _| assign(c, AssignOp::Div))?,
        Pattern::new("Addition", "#lh-expr-lhs + #stm-rhs", |c, _| binary(c, BinaryOp::Add))?,
        Pattern::new("Subtraction", "#lh-expr-lhs - #stm-rhs", |c, _| binary(c, BinaryOp::Sub))?,
        Pattern::new("Multiplication", "#lh-expr-lhs * #stm-rhs", |c, _| binary(c, BinaryOp::Mul))?,
        Pattern::new("Division", "#lh-expr-lhs / #stm-rhs", |c, _| binary(c, BinaryOp::Div))?,
        Pattern::new("Assign", "#lh-expr-lhs = #stm-rhs", |c, _| assign(c, AssignOp::Set))?,
        Pattern::new("String Literal", "#string-value", |c, _| Ok(Some(StmtKind::Str(text(c)?))))?,
        Pattern::new("int Literal", "#int-value", |c, _| Ok(Some(StmtKind::Int(text(c)?))))?,
        Pattern::new("float Literal", "#float-value", |c, _| Ok(Some(StmtKind::Float(text(c)?))))?,
        Pattern::new("Identifier", "#ident-name", build_identifier)?,
        Pattern::new("Scope", "#block-body", build_scope)?,
        Pattern::new("Group", "#parenthesis-inner", build_group)?,
        Pattern::new("comparison less than", "#lh-expr-lhs < #stm-rhs", |c, _| compare(c, CompareOp::Lt))?,
        Pattern::new("comparison less than equal", "#lh-expr-lhs <= #stm-rhs", |c, _| compare(c, CompareOp::LtEq))?,
        Pattern::new("comparison greater than", "#lh-expr-lhs > #stm-rhs", |c, _| compare(c, CompareOp::Gt))?,
        Pattern::new("comparison greater than equal", "#lh-expr-lhs >= #stm-rhs", |c, _| compare(c, CompareOp::GtEq))?,
        Pattern::new("comparison", "#lh-expr-lhs == #stm-rhs", |c, _| compare(c, CompareOp::Eq))?,
        Pattern::new("comparison not", "#lh-expr-lhs != #stm-rhs", |c, _| compare(c, CompareOp::NotEq))?,
    ])
}

fn text(c: &mut C) -> Result<String, CompileError> {
    Ok(c.token(Slot::Value)?.text().to_string())
}

fn boxed(c: &mut C, slot: Slot) -> Result<Box<Stmt>, CompileError> {
    Ok(Box::new(c.node(slot)?))
}

fn block(c: &mut C, slot: Slot) -> Result<Vec<Stmt>, CompileError> {
    parse_block(&c.token(slot)?)
}

fn synthetic_ident(name: &str) -> Stmt {
    Spanned::new(StmtKind::Ident(name.to_string()), Span::synthetic(name))
}

/// `a.b.c` built from synthetic spans.
pub fn synthetic_path(path: &str) -> Stmt {
    let mut parts = path.split('.');
    let first = parts.next().unwrap_or_default();
    parts.fold(synthetic_ident(first), |lhs, member| {
        let span = Span::synthetic(path);
        Spanned::new(
            StmtKind::Dot { lhs: Box::new(lhs), member: Spanned::new(member.to_string(), Span::synthetic(member)) },
            span,
        )
    })
}

fn unquote(token: &Token) -> Ident {
    let len = token.span.len();
    let inner = token.span.slice(1, len.saturating_sub(1));
    Spanned::new(inner.text().to_string(), inner)
}

fn build_loop(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::While { cond: Box::new(synthetic_ident("true")), body: block(c, Slot::Body)? }))
}

fn build_struct_literal(c: &mut C, _: &Span) -> Built {
    let ty = c.ty(Slot::Ty)?;
    let fields = items::struct_literal_fields(&c.token(Slot::Fields)?)?;
    Ok(Some(StmtKind::StructLiteral { ty, fields }))
}

fn build_for(c: &mut C, _: &Span) -> Built {
    let (var, iter) = items::for_header(&c.token(Slot::Header)?)?;
    Ok(Some(StmtKind::For { var, iter: Box::new(iter), body: block(c, Slot::Body)? }))
}

fn build_while(c: &mut C, _: &Span) -> Built {
    let cond = items::single_expression(&c.token(Slot::Cond)?)?;
    Ok(Some(StmtKind::While { cond: Box::new(cond), body: block(c, Slot::Body)? }))
}

fn build_struct(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Struct(StructDecl {
        name: c.ident(Slot::Name)?,
        generics: items::generic_names(c.generics(Slot::Generics)?)?,
        fields: items::struct_fields(&c.token(Slot::Fields)?)?,
    })))
}

fn build_line_terminator(c: &mut C, _: &Span) -> Built {
    Ok(Some(c.node(Slot::Inner)?.node))
}

fn build_let(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Let { name: c.ident(Slot::Name)?, ty: None, value: boxed(c, Slot::Value)? }))
}

fn build_typed_let(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Let { name: c.ident(Slot::Name)?, ty: Some(c.ty(Slot::Ty)?), value: boxed(c, Slot::Value)? }))
}

fn build_export_module(c: &mut C, _: &Span) -> Built {
    let source = unquote(&c.token(Slot::Source)?);
    let alias = c.ident(Slot::Alias).ok();
    Ok(Some(StmtKind::ExportModule { source, alias }))
}

fn build_import_all(c: &mut C, _: &Span) -> Built {
    let source = unquote(&c.token(Slot::Source)?);
    let alias = c.ident(Slot::Alias).ok();
    Ok(Some(StmtKind::Import(ImportDecl { source, scope: ImportScope::All { alias } })))
}

fn build_import_items(c: &mut C, _: &Span) -> Built {
    let items = items::import_items(&c.token(Slot::Body)?)?;
    let source = unquote(&c.token(Slot::Source)?);
    Ok(Some(StmtKind::Import(ImportDecl { source, scope: ImportScope::Items(items) })))
}

fn build_doc_flag(c: &mut C, _: &Span) -> Built {
    let doc = c.token(Slot::Doc)?;
    let content = doc.text().get(3..).unwrap_or_default().trim();
    let literal = format!("\"{}\"", content.replace('\\', "\\\\").replace('"', "\\\""));
    let flag = Spanned::new(
        StmtKind::Call {
            callee: Box::new(synthetic_ident("documentation")),
            args: vec![Spanned::new(StmtKind::Str(literal.clone()), Span::synthetic(&literal))],
        },
        doc.span,
    );
    Ok(Some(StmtKind::Flag { flag: Box::new(flag), body: boxed(c, Slot::Body)? }))
}

fn build_flag(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Flag { flag: boxed(c, Slot::Flag)?, body: boxed(c, Slot::Body)? }))
}

fn build_if(c: &mut C, _: &Span) -> Built {
    let cond = items::single_expression(&c.token(Slot::Cond)?)?;
    let body = block(c, Slot::Body)?;
    Ok(Some(StmtKind::If(IfChain { arms: vec![IfArm { cond, body }], else_body: None })))
}

fn open_chain(c: &mut C, what: &str) -> Result<IfChain, CompileError> {
    let lhs = c.node(Slot::Lhs)?;
    match lhs.node {
        StmtKind::If(chain) if chain.else_body.is_some() => Err(CompileError::parse(
            format!("cannot be followed by an `{what}` as the if chain already ended"),
            lhs.span,
        )),
        StmtKind::If(chain) => Ok(chain),
        _ => Err(CompileError::parse(format!("invalid `{what}` statement after this"), lhs.span)),
    }
}

fn build_else_if(c: &mut C, _: &Span) -> Built {
    let mut chain = open_chain(c, "else if")?;
    let cond = items::single_expression(&c.token(Slot::Cond)?)?;
    chain.arms.push(IfArm { cond, body: block(c, Slot::Body)? });
    Ok(Some(StmtKind::If(chain)))
}

fn build_else(c: &mut C, _: &Span) -> Built {
    let mut chain = open_chain(c, "else")?;
    chain.else_body = Some(block(c, Slot::Body)?);
    Ok(Some(StmtKind::If(chain)))
}

fn build_extension(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Extension(ExtensionDecl { target: c.ty(Slot::Target)?, global: false, body: block(c, Slot::Body)? })))
}

fn build_implementation(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Extension(ExtensionDecl { target: c.ty(Slot::Target)?, global: true, body: block(c, Slot::Body)? })))
}

fn build_function(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Function(Rc::new(FunctionDecl {
        name: c.ident(Slot::Name)?,
        generics: items::generic_names(c.generics(Slot::Generics)?)?,
        params: items::params(&c.token(Slot::Args)?)?,
        ret: c.ty(Slot::Ret)?,
        body: block(c, Slot::Body)?,
    }))))
}

fn build_export_sugar(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Flag { flag: Box::new(synthetic_path("compiler.export")), body: boxed(c, Slot::Body)? }))
}

fn build_return(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Return(boxed(c, Slot::Value)?)))
}

fn build_enum(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Enum(EnumDecl {
        name: c.ident(Slot::Name)?,
        generics: items::generic_names(c.generics(Slot::Generics)?)?,
        cases: items::enum_cases(&c.token(Slot::Cases)?)?,
    })))
}

fn build_call(c: &mut C, _: &Span) -> Built {
    let args = items::call_args(&c.token(Slot::Args)?)?;
    Ok(Some(StmtKind::Call { callee: boxed(c, Slot::Callee)?, args }))
}

fn build_dot(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Dot { lhs: boxed(c, Slot::Lhs)?, member: c.ident(Slot::Member)? }))
}

fn build_match(c: &mut C, _: &Span) -> Built {
    let paren = c.token(Slot::Value)?;
    let mut values = items::call_args(&paren)?;
    if values.len() > 1 {
        return Err(CompileError::parse("matching multiple values this way is disallowed", values[1].span.clone()));
    }
    if values.is_empty() {
        return Err(CompileError::parse("expected a value to match", paren.span));
    }
    let value = values.remove(0);
    let arms = items::match_arms(&c.token(Slot::Arms)?)?;
    Ok(Some(StmtKind::Match { value: Box::new(value), arms }))
}

fn build_int_range(c: &mut C, _: &Span) -> Built {
    let lhs = c.token(Slot::Lhs)?;
    let lhs = Spanned::new(StmtKind::Int(lhs.text().to_string()), lhs.span);
    Ok(Some(StmtKind::Range { lhs: Box::new(lhs), rhs: boxed(c, Slot::Rhs)?, inclusive: false }))
}

fn build_range(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Range { lhs: boxed(c, Slot::Lhs)?, rhs: boxed(c, Slot::Rhs)?, inclusive: false }))
}

fn build_inclusive_range(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Range { lhs: boxed(c, Slot::Lhs)?, rhs: boxed(c, Slot::Rhs)?, inclusive: true }))
}

fn assign(c: &mut C, op: AssignOp) -> Built {
    Ok(Some(StmtKind::Assign { op, lhs: boxed(c, Slot::Lhs)?, rhs: boxed(c, Slot::Rhs)? }))
}

fn binary(c: &mut C, op: BinaryOp) -> Built {
    Ok(Some(attach(Operator::Binary(op), c.node(Slot::Lhs)?, c.node(Slot::Rhs)?)))
}

fn compare(c: &mut C, op: CompareOp) -> Built {
    Ok(Some(attach(Operator::Compare(op), c.node(Slot::Lhs)?, c.node(Slot::Rhs)?)))
}

fn build_identifier(c: &mut C, _: &Span) -> Built {
    let ident = c.token(Slot::Name)?;
    let id = ident.text();
    if is_reserved(id) {
        return Err(CompileError::parse(
            format!("Expected an <identifier> not a keyword, `{id}` is a keyword"),
            ident.span.clone(),
        )
        .with_hint("Rename this"));
    }
    Ok(Some(StmtKind::Ident(id.to_string())))
}

fn build_scope(c: &mut C, _: &Span) -> Built {
    Ok(Some(StmtKind::Scope(block(c, Slot::Body)?)))
}

fn build_group(c: &mut C, _: &Span) -> Built {
    let inner = items::single_expression(&c.token(Slot::Inner)?)?;
    Ok(Some(StmtKind::Group(Box::new(inner))))
}

fn build_named_type(c: &mut Captures<TypeKind>, _: &Span) -> Result<Option<TypeKind>, CompileError> {
    let name = c.ident(Slot::Name)?;
    if STATEMENT_KEYWORDS.contains(&name.node.as_str()) {
        return Ok(None);
    }
    Ok(Some(TypeKind::Named { name, args: c.generics(Slot::Args)? }))
}

fn build_dotted_type(c: &mut Captures<TypeKind>, _: &Span) -> Result<Option<TypeKind>, CompileError> {
    Ok(Some(TypeKind::Dot { lhs: Box::new(c.node(Slot::Lhs)?), member: c.ident(Slot::Member)? }))
}

fn build_tuple_type(c: &mut Captures<TypeKind>, _: &Span) -> Result<Option<TypeKind>, CompileError> {
    let paren = c.token(Slot::Inner)?;
    let mut p = super::Parser::new(bracket_body(&paren)?, type_grammar()?);
    let types = p.type_list()?;
    p.expect_end()?;
    Ok(Some(TypeKind::Tuple(types)))
}
