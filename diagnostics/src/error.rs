use serde::Serialize;
use source::diagnostics::Diagnostic;
use source::Location;
use thiserror::Error;

use std::io;

/// A failed compilation, located in its template.
///
/// Parse errors and compile-semantic errors both end up here. The
/// `Display` output appends the template name and position so hosts can
/// log it as is.
#[derive(Clone, Debug, Error, Serialize)]
#[error("{message} [{template}:{location}]")]
pub struct SyntaxError {
    pub message: String,
    pub expected: Option<String>,
    pub found: Option<String>,
    pub location: Location,
    pub template: String,
    #[serde(skip)]
    diagnostic: Diagnostic,
}

impl SyntaxError {
    pub fn from_diagnostic(template: &str, source: &str, diagnostic: Diagnostic) -> SyntaxError {
        // Diagnostics without a primary label have no position to report
        let location = diagnostic
            .primary_range()
            .map(|range| Location::from_offset(source, range.start))
            .unwrap_or_default();
        SyntaxError {
            message: diagnostic.message.clone(),
            expected: diagnostic.expected.clone(),
            found: diagnostic.found.clone(),
            location,
            template: template.to_string(),
            diagnostic,
        }
    }

    pub fn emit_to_terminal(&self, source: &str) -> io::Result<()> {
        self.diagnostic.emit_to_terminal(&self.template, source)
    }
}
