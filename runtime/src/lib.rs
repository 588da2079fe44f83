#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

mod chunk;
mod error;
pub mod escape;
mod exec;
pub mod helpers;
mod template;
mod value;

pub use chunk::{resolve_output, Chunk};
pub use error::RenderError;
pub use exec::{Executor, Frame, Globals, Host};
pub use template::{Output, Template, ViewModelFactory};
pub use value::{Deferred, Function, Map, RenderResult, Value};
