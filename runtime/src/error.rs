use thiserror::Error;

/// Failures while rendering. Deferred values share their results between
/// every writer that awaits them, so errors have to be cloneable.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("Cannot call a value of type {kind}")]
    NotCallable { kind: &'static str },
    #[error("Helper `{helper}` failed: {message}")]
    Helper { helper: String, message: String },
    #[error("Failed to include `{template}`: {message}")]
    Include { template: String, message: String },
    #[error("A deferred value was dropped before it resolved")]
    Dropped,
}

impl RenderError {
    pub fn helper(helper: impl Into<String>, message: impl Into<String>) -> RenderError {
        RenderError::Helper {
            helper: helper.into(),
            message: message.into(),
        }
    }
}
