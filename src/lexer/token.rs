use logos::Logos;

/// Character-level atoms. Brackets are grouped into `TokenKind::Bracket` by
/// the caller; everything else maps one to one onto a public token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Atom {
    // `1..2` must stay `1 . . 2`, so a float needs digits on both sides of the dot
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r"[0-9]+")]
    Int,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // `//!` is flag syntax and is lexed as punctuation instead
    #[regex(r"//([^!\n][^\n]*)?")]
    Comment,
    #[token("//!")]
    FlagMarker,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[regex(r#"[^\sA-Za-z0-9_"(){}\[\]]"#)]
    Punct,
}

/// Words that can never be used as a plain identifier expression.
pub const RESERVED: &[&str] = &["let", "new", "enum", "function", "return"];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}
