#![warn(clippy::all)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
extern crate quickcheck_macros;

pub mod scope_map;
pub mod similar;

pub use similar::find_similar;
