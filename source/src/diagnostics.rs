pub use codespan::{ByteIndex, Span};
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
use codespan_reporting::files::SimpleFile;
pub use codespan_reporting::term::*;
use std::io;
use std::ops::Range;

// These diagnostic interfaces implement the same API as the codespan_reporting crate, except
// Label, which does not require a FileId when instantiated. A diagnostic always belongs to
// a single template, so the file is supplied when it is emitted.

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub labels: Vec<Label>,
    /// Description of what the parser or compiler wanted to see
    pub expected: Option<String>,
    /// Description of what it found instead
    pub found: Option<String>,
    severity: Severity,
}

impl Diagnostic {
    pub fn error() -> Diagnostic {
        Diagnostic {
            message: String::new(),
            labels: vec![],
            expected: None,
            found: None,
            severity: Severity::Error,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_labels(mut self, labels: impl Into<Vec<Label>>) -> Self {
        self.labels = labels.into();
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    /// The range of the first primary label, if there is one.
    pub fn primary_range(&self) -> Option<Range<usize>> {
        self.labels
            .iter()
            .find(|label| label.style == LabelStyle::Primary)
            .map(|label| label.range.clone())
    }

    pub fn emit_to_terminal(&self, name: &str, source: &str) -> io::Result<()> {
        use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = Config::default();
        let file = SimpleFile::new(name, source);
        // Convert to a codespan-reporting diagnostic
        let diagnostic = CodespanDiagnostic::new(self.severity)
            .with_message(self.message.clone())
            .with_labels(
                self.labels
                    .iter()
                    .map(|label| {
                        CodespanLabel::new(label.style, (), label.range.clone())
                            .with_message(label.message.clone())
                    })
                    .collect(),
            );
        let result = emit(&mut writer.lock(), &config, &file, &diagnostic)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()));
        result
    }
}

#[derive(Clone, Debug)]
pub struct Label {
    pub style: LabelStyle,
    pub range: Range<usize>,
    pub message: String,
}

impl Label {
    pub fn primary(range: impl Into<Range<usize>>) -> Label {
        Label {
            style: LabelStyle::Primary,
            range: range.into(),
            message: String::new(),
        }
    }

    pub fn secondary(range: impl Into<Range<usize>>) -> Label {
        Label {
            style: LabelStyle::Secondary,
            range: range.into(),
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
