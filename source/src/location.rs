use serde::Serialize;

use std::fmt;

/// A 1-based line/column position in a template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Scans `source` up to the byte `offset`, counting line terminators.
    /// `\r\n` counts once; a lone `\r`, U+2028 and U+2029 each end a line.
    pub fn from_offset(source: &str, offset: usize) -> Location {
        let mut line = 1;
        let mut column = 1;
        let mut seen_cr = false;
        for (index, ch) in source.char_indices() {
            if index >= offset {
                break;
            }
            match ch {
                '\n' => {
                    if !seen_cr {
                        line += 1;
                    }
                    column = 1;
                    seen_cr = false;
                }
                '\r' | '\u{2028}' | '\u{2029}' => {
                    line += 1;
                    column = 1;
                    seen_cr = true;
                }
                _ => {
                    column += 1;
                    seen_cr = false;
                }
            }
        }
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
