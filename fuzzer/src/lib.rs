#![warn(clippy::all)]
#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod template_fuzz;

pub use template_fuzz::TemplateFuzzer;
