//! Grammar templates.
//!
//! A template is a whitespace separated string. Words spelled `#kind-label`
//! are placeholders; every other word is lexed with the language lexer and
//! must match token for token. The label is resolved to a [`Slot`] when the
//! template is compiled, so builders never look captures up by string.

use crate::diagnostics::CompileError;
use crate::lexer::{self, Token, TokenKind};
use crate::parser::ast::TypeExpr;
use crate::span::{Span, Spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The node produced by the previous match. Only legal first.
    LhExpr,
    OptionalGenerics,
    DocComment,
    Parenthesis,
    Block,
    Ident,
    Int,
    Float,
    Str,
    Stm,
    Type,
    /// Raw tokens up to the next template token.
    Expr,
}

impl Placeholder {
    fn from_kind(kind: &str) -> Option<Self> {
        Some(match kind {
            "lh-expr" => Placeholder::LhExpr,
            "optional-generics" => Placeholder::OptionalGenerics,
            "doc-comment" => Placeholder::DocComment,
            "parenthesis" => Placeholder::Parenthesis,
            "block" => Placeholder::Block,
            "ident" => Placeholder::Ident,
            "int" => Placeholder::Int,
            "float" => Placeholder::Float,
            "string" => Placeholder::Str,
            "stm" => Placeholder::Stm,
            "type" => Placeholder::Type,
            "expr" => Placeholder::Expr,
            _ => return None,
        })
    }

    /// Whether a single token satisfies this placeholder.
    pub fn accepts(self, token: &Token) -> bool {
        match self {
            Placeholder::Ident => token.kind == TokenKind::Ident,
            Placeholder::Int => token.kind == TokenKind::Int,
            Placeholder::Float => token.kind == TokenKind::Float,
            Placeholder::Str => token.kind == TokenKind::Str,
            Placeholder::DocComment => token.is_doc_comment(),
            Placeholder::Parenthesis => token.kind == TokenKind::Bracket(lexer::Delimiter::Paren),
            Placeholder::Block => token.kind == TokenKind::Bracket(lexer::Delimiter::Brace),
            _ => false,
        }
    }
}

/// Capture slots. Every placeholder label used by a grammar is listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Name,
    Alias,
    Lhs,
    Rhs,
    Value,
    Cond,
    Body,
    Args,
    Generics,
    Ty,
    Ret,
    Target,
    Source,
    Header,
    Cases,
    Arms,
    Fields,
    Doc,
    Flag,
    Inner,
    Member,
    Payload,
    Until,
    Callee,
}

impl Slot {
    fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "name" => Slot::Name,
            "alias" => Slot::Alias,
            "lhs" => Slot::Lhs,
            "rhs" => Slot::Rhs,
            "value" => Slot::Value,
            "cond" => Slot::Cond,
            "body" => Slot::Body,
            "args" => Slot::Args,
            "generics" => Slot::Generics,
            "ty" => Slot::Ty,
            "ret" => Slot::Ret,
            "target" => Slot::Target,
            "source" => Slot::Source,
            "header" => Slot::Header,
            "cases" => Slot::Cases,
            "arms" => Slot::Arms,
            "fields" => Slot::Fields,
            "doc" => Slot::Doc,
            "flag" => Slot::Flag,
            "inner" => Slot::Inner,
            "member" => Slot::Member,
            "payload" => Slot::Payload,
            "until" => Slot::Until,
            "callee" => Slot::Callee,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateToken {
    Literal { kind: TokenKind, text: String },
    Hole { kind: Placeholder, slot: Slot },
}

impl TemplateToken {
    pub fn matches_literal(&self, token: &Token) -> bool {
        match self {
            TemplateToken::Literal { kind, text } => token.kind == *kind && token.text() == text,
            TemplateToken::Hole { kind, .. } => kind.accepts(token),
        }
    }
}

pub fn compile_template(template: &str) -> Result<Vec<TemplateToken>, String> {
    let mut out = Vec::new();
    for word in template.split_whitespace() {
        if let Some(hole) = word.strip_prefix('#').filter(|w| !w.is_empty()) {
            if !hole.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(format!("invalid placeholder `{word}` in `{template}`"));
            }
            let (kind, label) = hole
                .rsplit_once('-')
                .ok_or_else(|| format!("placeholder `{word}` has no label in `{template}`"))?;
            let kind = Placeholder::from_kind(kind)
                .ok_or_else(|| format!("unknown placeholder kind `{kind}` in `{template}`"))?;
            let slot = Slot::from_label(label)
                .ok_or_else(|| format!("unknown capture label `{label}` in `{template}`"))?;
            out.push(TemplateToken::Hole { kind, slot });
            continue;
        }
        let tokens = lexer::lex_synthetic(word).map_err(|e| format!("template `{template}`: {e}"))?;
        out.extend(tokens.into_iter().map(|t| TemplateToken::Literal { kind: t.kind, text: t.text().to_string() }));
    }

    for (i, token) in out.iter().enumerate() {
        match token {
            TemplateToken::Hole { kind: Placeholder::LhExpr, .. } if i != 0 => {
                return Err(format!("`#lh-expr` must come first in `{template}`"));
            }
            TemplateToken::Hole { kind: Placeholder::Expr, .. } => match out.get(i + 1) {
                Some(TemplateToken::Literal { .. }) => {}
                _ => return Err(format!("`#expr` needs a literal sentinel after it in `{template}`")),
            },
            _ => {}
        }
    }
    if out.is_empty() {
        return Err("empty template".to_string());
    }
    Ok(out)
}

/// A builder may decline a structural match by returning `Ok(None)`.
pub type Build<T> = fn(&mut Captures<T>, &Span) -> Result<Option<T>, CompileError>;

pub struct Pattern<T> {
    pub name: &'static str,
    pub template: Vec<TemplateToken>,
    pub build: Build<T>,
}

impl<T> Pattern<T> {
    pub fn new(name: &'static str, template: &str, build: Build<T>) -> Result<Self, String> {
        let template = compile_template(template).map_err(|e| format!("pattern `{name}`: {e}"))?;
        Ok(Self { name, template, build })
    }

    pub fn carries(&self) -> bool {
        matches!(self.template.first(), Some(TemplateToken::Hole { kind: Placeholder::LhExpr, .. }))
    }
}

#[derive(Debug, Clone)]
pub enum Capture<T> {
    Token(Token),
    Node(Spanned<T>),
    Type(TypeExpr),
    Generics(Vec<TypeExpr>),
    Raw(Vec<Token>),
}

#[derive(Debug)]
pub struct Captures<T> {
    pattern: &'static str,
    items: Vec<(Slot, Capture<T>)>,
}

impl<T> Captures<T> {
    pub fn new(pattern: &'static str) -> Self {
        Self { pattern, items: Vec::new() }
    }

    pub fn push(&mut self, slot: Slot, capture: Capture<T>) {
        self.items.push((slot, capture));
    }

    fn take(&mut self, slot: Slot) -> Result<Capture<T>, CompileError> {
        let idx = self
            .items
            .iter()
            .position(|(s, _)| *s == slot)
            .ok_or_else(|| CompileError::internal(format!("pattern `{}` has no {slot:?} capture", self.pattern)))?;
        Ok(self.items.remove(idx).1)
    }

    fn wrong(&self, slot: Slot, want: &str) -> CompileError {
        CompileError::internal(format!("pattern `{}`: {slot:?} is not a {want} capture", self.pattern))
    }

    pub fn token(&mut self, slot: Slot) -> Result<Token, CompileError> {
        match self.take(slot)? {
            Capture::Token(t) => Ok(t),
            _ => Err(self.wrong(slot, "token")),
        }
    }

    pub fn node(&mut self, slot: Slot) -> Result<Spanned<T>, CompileError> {
        match self.take(slot)? {
            Capture::Node(n) => Ok(n),
            _ => Err(self.wrong(slot, "node")),
        }
    }

    pub fn ty(&mut self, slot: Slot) -> Result<TypeExpr, CompileError> {
        match self.take(slot)? {
            Capture::Type(t) => Ok(t),
            _ => Err(self.wrong(slot, "type")),
        }
    }

    pub fn generics(&mut self, slot: Slot) -> Result<Vec<TypeExpr>, CompileError> {
        match self.take(slot)? {
            Capture::Generics(g) => Ok(g),
            _ => Err(self.wrong(slot, "generics")),
        }
    }

    pub fn raw(&mut self, slot: Slot) -> Result<Vec<Token>, CompileError> {
        match self.take(slot)? {
            Capture::Raw(tokens) => Ok(tokens),
            _ => Err(self.wrong(slot, "raw")),
        }
    }

    /// Identifier capture as a spanned name.
    pub fn ident(&mut self, slot: Slot) -> Result<Spanned<String>, CompileError> {
        let token = self.token(slot)?;
        Ok(Spanned::new(token.text().to_string(), token.span))
    }
}
