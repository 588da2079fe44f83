use crate::symbol::Symbol;

use serde::{Serialize, Serializer};
use source::diagnostics::Span;

// Spans are skipped when serializing so AST snapshots only
// describe the shape of the tree.

#[derive(Serialize, Debug, Clone)]
pub struct Template {
    pub body: Block,
}

#[derive(Serialize, Debug, Clone)]
pub struct Block {
    pub nodes: Vec<Node>,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Serialize, Debug, Clone)]
pub enum Node {
    Text(Text),
    Tag(Expr),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Newline-led whitespace, dropped unless whitespace is kept
    Format,
    /// Literal text, always emitted
    Buffer,
}

#[derive(Serialize, Debug, Clone)]
pub struct Text {
    pub kind: TextKind,
    pub value: Symbol,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Ident {
    pub symbol: Symbol,
    pub span: Span,
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.symbol.serialize(serializer)
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(skip)]
    pub span: Span,
}

pub fn expr(kind: ExprKind, span: Span) -> Expr {
    Expr { kind, span }
}

#[derive(Serialize, Debug, Clone)]
pub enum ExprKind {
    Call(Call),
    FnDef(FnDef),
    Pipe(Pipe),
    Identifier(Identifier),
    Literal(Literal),
    Map(Vec<MapEntry>),
    Array(Vec<Expr>),
    Escape(Ident),
    Raw(Symbol),
    Empty,
}

#[derive(Serialize, Debug, Clone)]
pub struct Call {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Serialize, Debug, Clone)]
pub struct FnDef {
    pub params: Vec<Ident>,
    pub body: Block,
}

#[derive(Serialize, Debug, Clone)]
pub struct Pipe {
    pub source: Box<Expr>,
    pub stages: Vec<Expr>,
}

/// `namespace::name`. A missing name (`data::.`) refers to the whole
/// namespace object; a missing namespace is resolved by the compiler.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Identifier {
    pub namespace: Option<Symbol>,
    pub name: Option<Symbol>,
}

impl Identifier {
    /// The bare name, if this identifier has no namespace and no dotted path
    pub fn simple_name(&self) -> Option<&str> {
        match (&self.namespace, &self.name) {
            (None, Some(name)) if !name.as_str().contains('.') => Some(name.as_str()),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Serialize, Debug, Clone)]
pub struct MapEntry {
    pub key: Ident,
    pub value: Expr,
}
