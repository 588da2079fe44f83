use diagnostics::SyntaxError;
use runtime::RenderError;
use thiserror::Error;

/// Failures reported by loaders.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("Template `{0}` was not found")]
    NotFound(String),
    #[error("Failed to read `{path}`: {message}")]
    Io { path: String, message: String },
    /// Reported by a host loader
    #[error("{0}")]
    Host(String),
}

#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Must specify a valid template name to load")]
    InvalidTemplateName,
    #[error("Must define a sourceLoader")]
    MissingSourceLoader,
}
