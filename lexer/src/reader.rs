use source::diagnostics::{ByteIndex, Span};

/// A cursor over template source. Positions are byte offsets so the
/// lexer can rewind to a token start when the parser switches modes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    source: &'a str,
    current_pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        Reader {
            source,
            current_pos: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.current_pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Look `n` characters past the next one
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, pattern: &str) -> bool {
        self.rest().starts_with(pattern)
    }

    /// Byte offset of `pattern` relative to the current position
    pub fn find(&self, pattern: &str) -> Option<usize> {
        self.rest().find(pattern)
    }

    pub fn advance(&mut self, bytes: usize) {
        self.current_pos = (self.current_pos + bytes).min(self.source.len());
    }

    pub fn offset(&self) -> usize {
        self.current_pos
    }

    pub fn reset(&mut self, pos: usize) {
        self.current_pos = pos;
    }

    pub fn slice(&self, lo: usize, hi: usize) -> &'a str {
        &self.source[lo..hi]
    }

    pub fn end(&self, lo: usize) -> Span {
        span(lo, self.current_pos)
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        let ch = self.peek()?;
        self.current_pos += ch.len_utf8();
        Some(ch)
    }
}

#[allow(clippy::cast_possible_truncation)]
pub fn span(lo: usize, hi: usize) -> Span {
    Span::new(ByteIndex(lo as u32), ByteIndex(hi as u32))
}
