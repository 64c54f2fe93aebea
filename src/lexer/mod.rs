pub mod token;

use crate::diagnostics::CompileError;
use crate::span::{FileId, Span};
use logos::Logos;
use serde::Serialize;
use std::sync::Arc;
use token::Atom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Delimiter {
    Paren,
    Brace,
    Square,
}

impl Delimiter {
    pub fn open(self) -> char {
        match self {
            Delimiter::Paren => '(',
            Delimiter::Brace => '{',
            Delimiter::Square => '[',
        }
    }

    pub fn close(self) -> char {
        match self {
            Delimiter::Paren => ')',
            Delimiter::Brace => '}',
            Delimiter::Square => ']',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Int,
    Float,
    Str,
    Ident,
    /// Always a single character; `==` is two tokens.
    Punct,
    Comment,
    /// A delimiter-matched group. The interior is lexed on demand by [`bracket_body`].
    Bracket(Delimiter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text(&self) -> &str {
        self.span.text()
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text() == p
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text() == word
    }

    pub fn is_doc_comment(&self) -> bool {
        self.kind == TokenKind::Comment && self.text().starts_with("///")
    }

    pub fn delimiter(&self) -> Option<Delimiter> {
        match self.kind {
            TokenKind::Bracket(d) => Some(d),
            _ => None,
        }
    }
}

/// Lex a whole source buffer. Top-level brackets become single `Bracket` tokens.
pub fn lex(file: FileId, source: Arc<str>) -> Result<Vec<Token>, CompileError> {
    let end = source.len();
    lex_range(file, &source, 0, end)
}

/// Lex text that is not part of any user file (grammar templates, directives).
pub fn lex_synthetic(text: &str) -> Result<Vec<Token>, CompileError> {
    lex(FileId::SYNTHETIC, Arc::from(text))
}

/// Tokens strictly inside a bracket token, with offsets into the original buffer.
pub fn bracket_body(token: &Token) -> Result<Vec<Token>, CompileError> {
    if token.delimiter().is_none() || token.span.len() < 2 {
        return Err(CompileError::parse("expected a bracketed group", token.span.clone()));
    }
    lex_range(token.span.file, token.span.source(), token.span.start + 1, token.span.end - 1)
}

fn lex_range(file: FileId, source: &Arc<str>, start: usize, end: usize) -> Result<Vec<Token>, CompileError> {
    let text = source
        .get(start..end)
        .ok_or_else(|| CompileError::internal(format!("lex range {start}..{end} is not on a char boundary")))?;
    let mut lexer = Atom::lexer(text);
    let mut tokens = Vec::new();
    let mut open: Vec<(Delimiter, Span)> = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(file, source.clone(), start + range.start, start + range.end);
        let atom = match result {
            Ok(atom) => atom,
            Err(()) if span.text().starts_with('"') => {
                return Err(CompileError::parse("unterminated string literal", span)
                    .with_hint("Insert a closing `\"`"));
            }
            Err(()) => {
                return Err(CompileError::parse(format!("unexpected character `{}`", span.text()), span));
            }
        };

        if let Some(d) = opening(atom) {
            open.push((d, span));
            continue;
        }
        if let Some(d) = closing(atom) {
            let Some((expected, opened_at)) = open.pop() else {
                return Err(CompileError::parse(format!("unexpected token `{}`", d.close()), span)
                    .with_hint(format!("Remove the `{}` or insert a opening `{}` before it", d.close(), d.open())));
            };
            if expected != d {
                return Err(CompileError::parse(format!("unexpected token `{}`", d.close()), span)
                    .with_hint(format!(
                        "Insert a closing `{}` bracket before using any other brackets",
                        expected.close()
                    ))
                    .with_secondary(opened_at, "Opening bracket here"));
            }
            if open.is_empty() {
                tokens.push(Token { kind: TokenKind::Bracket(d), span: opened_at.join(&span) });
            }
            continue;
        }
        // interior of a group is lexed later, on demand
        if !open.is_empty() {
            continue;
        }

        match atom {
            Atom::FlagMarker => {
                for i in 0..3 {
                    tokens.push(Token { kind: TokenKind::Punct, span: span.slice(i, i + 1) });
                }
            }
            Atom::Float => tokens.push(Token { kind: TokenKind::Float, span }),
            Atom::Int => tokens.push(Token { kind: TokenKind::Int, span }),
            Atom::Str => tokens.push(Token { kind: TokenKind::Str, span }),
            Atom::Ident => tokens.push(Token { kind: TokenKind::Ident, span }),
            Atom::Comment => tokens.push(Token { kind: TokenKind::Comment, span }),
            _ => tokens.push(Token { kind: TokenKind::Punct, span }),
        }
    }

    if let Some((d, opened_at)) = open.pop() {
        return Err(CompileError::parse(format!("unclosed `{}`", d.open()), opened_at)
            .with_hint(format!("Remove the `{}` or insert a closing `{}` after it", d.open(), d.close())));
    }

    Ok(tokens)
}

fn opening(atom: Atom) -> Option<Delimiter> {
    match atom {
        Atom::LParen => Some(Delimiter::Paren),
        Atom::LBrace => Some(Delimiter::Brace),
        Atom::LBracket => Some(Delimiter::Square),
        _ => None,
    }
}

fn closing(atom: Atom) -> Option<Delimiter> {
    match atom {
        Atom::RParen => Some(Delimiter::Paren),
        Atom::RBrace => Some(Delimiter::Brace),
        Atom::RBracket => Some(Delimiter::Square),
        _ => None,
    }
}
