use std::fmt;

use crate::symbol::Symbol;
use source::diagnostics::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Whether this token ends the block currently being parsed
    pub fn follows_block(&self) -> bool {
        matches!(self.kind, TokenKind::EOF | TokenKind::RCurlyBrace)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Fn,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Fn => write!(f, "fn"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LitKind {
    Str,
    Int,
    Float,
    Bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lit {
    pub kind: LitKind,
    pub symbol: Symbol,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// A run of literal template text
    Text(Symbol),
    /// A line break followed by horizontal whitespace
    Format(Symbol),
    /// `{`
    LCurlyBrace,
    /// `}`
    RCurlyBrace,
    /// `` {`...`} ``, carrying the text between the delimiters
    Raw(Symbol),
    /// `{~code}`, carrying the code
    Escape(Symbol),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// A lone `:`, only meaningful in `(:)`
    Colon,
    /// `:key` inside a map literal
    MapKey(Symbol),
    /// `|`
    Pipe,
    /// `ns::name`, `ns::.`, `name` or `a.b.c`
    Ident {
        namespace: Option<Symbol>,
        name: Option<Symbol>,
    },
    /// An operator callable, already mapped to the helper it names
    Operator(Symbol),
    Lit(Lit),
    Reserved(Keyword),
    EOF,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            Text(_) => write!(f, "text"),
            Format(_) => write!(f, "whitespace"),
            LCurlyBrace => write!(f, "`{{`"),
            RCurlyBrace => write!(f, "`}}`"),
            Raw(_) => write!(f, "raw block"),
            Escape(code) => write!(f, "`{{~{}}}`", code),
            LParen => write!(f, "`(`"),
            RParen => write!(f, "`)`"),
            Colon => write!(f, "`:`"),
            MapKey(key) => write!(f, "map key `:{}`", key),
            Pipe => write!(f, "`|`"),
            Ident { namespace, name } => match (namespace, name) {
                (Some(namespace), Some(name)) => write!(f, "identifier `{}::{}`", namespace, name),
                (Some(namespace), None) => write!(f, "identifier `{}::.`", namespace),
                (None, Some(name)) => write!(f, "identifier `{}`", name),
                (None, None) => write!(f, "identifier"),
            },
            Operator(op) => write!(f, "operator `{}`", op),
            Lit(lit) => match lit.kind {
                LitKind::Str => write!(f, "string \"{}\"", lit.symbol),
                LitKind::Int | LitKind::Float => write!(f, "number `{}`", lit.symbol),
                LitKind::Bool => write!(f, "boolean `{}`", lit.symbol),
            },
            Reserved(keyword) => write!(f, "keyword `{}`", keyword),
            EOF => write!(f, "end of input"),
        }
    }
}

pub fn token(kind: TokenKind, span: Span) -> Token {
    Token { kind, span }
}
