use serde::{Serialize, Serializer};

use std::fmt;
use std::sync::Arc;

/// A compiled template. Rendering walks this tree; nothing is generated
/// as text.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub name: String,
    pub body: Arc<Body>,
    /// Builtin helpers referenced anywhere in the template, in first-use order
    pub helpers: Vec<Builtin>,
}

/// The body of the template or of an inline `fn`.
///
/// A frame for a body has `params + defs.len()` local slots: parameters
/// first, then `def` targets. `lookups` get their own slots, filled once on
/// entry by walking the render-time namespaces.
#[derive(Debug, Serialize)]
pub struct Body {
    pub params: usize,
    pub defs: Vec<Expr>,
    pub lookups: Vec<String>,
    pub ops: Vec<Op>,
}

impl Body {
    pub fn local_slots(&self) -> usize {
        self.params + self.defs.len()
    }
}

#[derive(Debug, Serialize)]
pub enum Op {
    /// Literal text, already coalesced
    Text(String),
    Write(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Data,
    ViewModel,
    Helper,
    Strings,
    Ctx,
}

impl Namespace {
    pub fn from_name(name: &str) -> Option<Namespace> {
        match name {
            "data" => Some(Namespace::Data),
            "viewmodel" => Some(Namespace::ViewModel),
            "helper" => Some(Namespace::Helper),
            "strings" => Some(Namespace::Strings),
            "ctx" => Some(Namespace::Ctx),
            _ => None,
        }
    }

    /// Priority order for names that are not lexically bound
    pub const LOOKUP_ORDER: [Namespace; 5] = [
        Namespace::ViewModel,
        Namespace::Data,
        Namespace::Helper,
        Namespace::Strings,
        Namespace::Ctx,
    ];
}

#[derive(Debug, Serialize)]
pub enum Expr {
    Null,
    Literal(Literal),
    Array(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    /// A parameter or `def`, `depth` bodies out from the current one
    Local {
        depth: usize,
        index: usize,
        path: Vec<String>,
    },
    /// A name resolved at render time, cached in the current body's lookup slots
    Lookup {
        index: usize,
        path: Vec<String>,
    },
    Namespace {
        namespace: Namespace,
        path: Vec<String>,
    },
    Builtin(Builtin),
    Function(Arc<Body>),
    /// With no arguments the callee is invoked only if it is a function
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Escape {
        escaper: Box<Expr>,
        value: Box<Expr>,
    },
    Include {
        name: Box<Expr>,
        data: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Each,
    If,
    IsEmpty,
    IsNotEmpty,
    Not,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    CmpAnd,
    CmpOr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Get,
    EscapeHtml,
    EscapeJs,
    EscapeJson,
}

impl Builtin {
    pub const ALL: [Builtin; 22] = [
        Builtin::Each,
        Builtin::If,
        Builtin::IsEmpty,
        Builtin::IsNotEmpty,
        Builtin::Not,
        Builtin::Eq,
        Builtin::Neq,
        Builtin::Lt,
        Builtin::Gt,
        Builtin::Lte,
        Builtin::Gte,
        Builtin::CmpAnd,
        Builtin::CmpOr,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Mod,
        Builtin::Get,
        Builtin::EscapeHtml,
        Builtin::EscapeJs,
        Builtin::EscapeJson,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Each => "each",
            Builtin::If => "if",
            Builtin::IsEmpty => "isEmpty",
            Builtin::IsNotEmpty => "isNotEmpty",
            Builtin::Not => "not",
            Builtin::Eq => "eq",
            Builtin::Neq => "neq",
            Builtin::Lt => "lt",
            Builtin::Gt => "gt",
            Builtin::Lte => "lte",
            Builtin::Gte => "gte",
            Builtin::CmpAnd => "cmpand",
            Builtin::CmpOr => "cmpor",
            Builtin::Add => "add",
            Builtin::Sub => "sub",
            Builtin::Mul => "mul",
            Builtin::Div => "div",
            Builtin::Mod => "mod",
            Builtin::Get => "get",
            Builtin::EscapeHtml => "escapeHtml",
            Builtin::EscapeJs => "escapeJs",
            Builtin::EscapeJson => "escapeJson",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|builtin| builtin.name() == name)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Builtin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
