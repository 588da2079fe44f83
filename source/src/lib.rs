#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod diagnostics;
pub mod location;

pub use location::Location;
