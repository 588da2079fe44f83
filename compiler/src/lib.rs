#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod cache;
mod engine;
mod error;
pub mod loader;

pub use cache::ProgramCache;
pub use engine::{Engine, EngineOptions, Result};
pub use error::{Error, LoadError};
pub use loader::{
    Callback, Completion, FileLoader, InMemoryLoader, InMemoryStrings, InMemoryViewModels, SourceLoader,
    StringsLoader, ViewModelLoader,
};

pub use codegen::{CompileOptions, DefaultEscape, Program};
pub use diagnostics::SyntaxError;
pub use runtime::{Deferred, Function, Map, Output, RenderError, RenderResult, Template, Value, ViewModelFactory};
