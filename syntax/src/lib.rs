#![warn(clippy::all)]

pub mod ast;
pub mod symbol;
pub mod token;
