pub mod ast;
pub mod items;
pub mod pattern;
pub mod rebalance;
pub mod rules;

use crate::diagnostics::CompileError;
use crate::lexer::{self, Token, TokenKind};
use crate::span::{FileId, Span, Spanned};
use ast::{Stmt, TypeExpr};
use pattern::{Capture, Captures, Pattern, Placeholder, TemplateToken};
use std::rc::Rc;
use std::sync::Arc;

/// Ordered-pattern matcher over a token stream.
///
/// `statement` tries every pattern in grammar order; the first structural
/// match wins. The produced node is then offered back to the grammar as the
/// left-hand carry until no carrying pattern matches any more.
pub struct Parser<'g, T> {
    tokens: Rc<[Token]>,
    pos: usize,
    grammar: &'g [Pattern<T>],
}

impl<'g, T: Clone> Parser<'g, T> {
    /// Plain comments are dropped; doc comments stay, the grammar consumes them.
    pub fn new(tokens: Vec<Token>, grammar: &'g [Pattern<T>]) -> Self {
        let tokens: Rc<[Token]> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment || t.is_doc_comment())
            .collect();
        Self { tokens, pos: 0, grammar }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consume `p` if it is the next token.
    pub fn eat_punct(&mut self, p: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(p)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn statement(&mut self) -> Result<Option<Spanned<T>>, CompileError> {
        let Some(mut node) = self.match_patterns(None)? else {
            return Ok(None);
        };
        while let Some(extended) = self.match_patterns(Some(&node))? {
            node = extended;
        }
        Ok(Some(node))
    }

    /// Parse statements until the stream is exhausted; leftovers are an error.
    pub fn statements(&mut self) -> Result<Vec<Spanned<T>>, CompileError> {
        let mut body = Vec::new();
        while let Some(stmt) = self.statement()? {
            body.push(stmt);
        }
        self.expect_end()?;
        Ok(body)
    }

    pub fn expect_end(&self) -> Result<(), CompileError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(CompileError::parse(format!("unexpected token `{}`", t.text()), t.span.clone())),
        }
    }

    /// Comma separated statements. A trailing comma is allowed.
    pub fn argument_list(&mut self) -> Result<Vec<Spanned<T>>, CompileError> {
        let mut args = Vec::new();
        loop {
            if let Some(stmt) = self.statement()? {
                args.push(stmt);
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        Ok(args)
    }

    pub fn type_statement(&mut self) -> Result<Option<TypeExpr>, CompileError> {
        let mut sub = Parser { tokens: self.tokens.clone(), pos: self.pos, grammar: rules::type_grammar()? };
        let ty = sub.statement()?;
        self.pos = sub.pos;
        Ok(ty)
    }

    /// Comma separated types.
    pub fn type_list(&mut self) -> Result<Vec<TypeExpr>, CompileError> {
        let mut list = Vec::new();
        loop {
            match self.type_statement()? {
                Some(ty) => list.push(ty),
                None => break,
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        Ok(list)
    }

    /// `< type, .. >`, or nothing. Never an error: a failed attempt rewinds.
    pub fn optional_generics(&mut self) -> Result<Vec<TypeExpr>, CompileError> {
        let start = self.pos;
        if !self.eat_punct("<") {
            return Ok(Vec::new());
        }
        let list = self.type_list()?;
        if !list.is_empty() && self.eat_punct(">") {
            return Ok(list);
        }
        self.pos = start;
        Ok(Vec::new())
    }

    fn match_patterns(&mut self, carry: Option<&Spanned<T>>) -> Result<Option<Spanned<T>>, CompileError> {
        let grammar = self.grammar;
        for pattern in grammar {
            if pattern.carries() != carry.is_some() {
                continue;
            }
            let start = self.pos;
            match self.try_pattern(pattern, carry)? {
                Some(node) => return Ok(Some(node)),
                None => self.pos = start,
            }
        }
        Ok(None)
    }

    fn try_pattern(
        &mut self,
        pattern: &Pattern<T>,
        carry: Option<&Spanned<T>>,
    ) -> Result<Option<Spanned<T>>, CompileError> {
        let start = self.pos;
        let template = &pattern.template;
        let mut caps = Captures::new(pattern.name);
        let mut i = 0;

        while i < template.len() {
            let TemplateToken::Hole { kind, slot } = &template[i] else {
                if !self.peek().is_some_and(|t| template[i].matches_literal(t)) {
                    return Ok(None);
                }
                self.pos += 1;
                i += 1;
                continue;
            };
            let capture = match kind {
                // bound once the rest of the template has matched
                Placeholder::LhExpr => {
                    i += 1;
                    continue;
                }
                Placeholder::Stm => match self.statement()? {
                    Some(node) => Capture::Node(node),
                    None => return Ok(None),
                },
                Placeholder::Type => match self.type_statement()? {
                    Some(ty) => Capture::Type(ty),
                    None => return Ok(None),
                },
                Placeholder::OptionalGenerics => Capture::Generics(self.optional_generics()?),
                Placeholder::Expr => {
                    let sentinel = template.get(i + 1).ok_or_else(|| {
                        CompileError::internal(format!("pattern `{}`: raw expression without sentinel", pattern.name))
                    })?;
                    let raw = self.raw_until(sentinel)?;
                    // skip the sentinel as well
                    self.pos += 1;
                    i += 1;
                    Capture::Raw(raw)
                }
                simple => match self.peek() {
                    Some(t) if simple.accepts(t) => {
                        let t = t.clone();
                        self.pos += 1;
                        Capture::Token(t)
                    }
                    _ => return Ok(None),
                },
            };
            caps.push(*slot, capture);
            i += 1;
        }

        let consumed = self.consumed_span(start);
        let span = match (carry, consumed) {
            (Some(c), Some(s)) => c.span.join(&s),
            (Some(c), None) => c.span.clone(),
            (None, Some(s)) => s,
            (None, None) => return Ok(None),
        };
        if let (Some(c), Some(TemplateToken::Hole { slot, .. })) = (carry, template.first()) {
            caps.push(*slot, Capture::Node(c.clone()));
        }

        match (pattern.build)(&mut caps, &span)? {
            Some(node) => {
                tracing::trace!(pattern = pattern.name, start = span.start, end = span.end, "matched");
                Ok(Some(Spanned::new(node, span)))
            }
            None => Ok(None),
        }
    }

    fn raw_until(&mut self, sentinel: &TemplateToken) -> Result<Vec<Token>, CompileError> {
        let mut raw = Vec::new();
        loop {
            match self.peek() {
                Some(t) if sentinel.matches_literal(t) => return Ok(raw),
                Some(t) => {
                    raw.push(t.clone());
                    self.pos += 1;
                }
                None => {
                    let expected = match sentinel {
                        TemplateToken::Literal { text, .. } => text.as_str(),
                        TemplateToken::Hole { .. } => "<placeholder>",
                    };
                    let span = raw
                        .last()
                        .or_else(|| self.tokens.last())
                        .map(|t| t.span.clone())
                        .unwrap_or_else(|| Span::synthetic(""));
                    return Err(CompileError::parse(format!("expected `{expected}` before the end of input"), span));
                }
            }
        }
    }

    fn consumed_span(&self, start: usize) -> Option<Span> {
        if self.pos <= start {
            return None;
        }
        let first = self.tokens.get(start)?;
        let last = self.tokens.get(self.pos - 1)?;
        Some(first.span.join(&last.span))
    }
}

/// Parse a whole token stream as a statement list.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Vec<Stmt>, CompileError> {
    Parser::new(tokens, rules::statement_grammar()?).statements()
}

/// Parse the interior of a bracket token as a statement list.
pub fn parse_block(token: &Token) -> Result<Vec<Stmt>, CompileError> {
    parse_tokens(lexer::bracket_body(token)?)
}

/// Lex and parse a source buffer.
pub fn parse_source(file: FileId, source: impl Into<Arc<str>>) -> Result<Vec<Stmt>, CompileError> {
    let tokens = lexer::lex(file, source.into())?;
    tracing::debug!(file = file.0, tokens = tokens.len(), "parsing");
    parse_tokens(tokens)
}
