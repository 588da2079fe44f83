#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod compiler;
pub mod ir;
pub mod options;

pub use compiler::{compile, Compiler};
pub use ir::{Body, Builtin, Expr, Literal, Namespace, Op, Program};
pub use options::{CompileOptions, DefaultEscape};
