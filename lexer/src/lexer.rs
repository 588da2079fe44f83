use crate::reader::{span, Reader};

use diagnostics::ParseResult as Result;

use source::diagnostics::{Diagnostic, Label, Span};

use syntax::symbol::Symbol;
use syntax::token::{token, Keyword, Lit, LitKind, Token, TokenKind};

use log::trace;

trait TemplateChar {
    fn is_eol(&self) -> bool;
    fn is_ws(&self) -> bool;
    fn is_key_start(&self) -> bool;
    fn is_key_continue(&self) -> bool;
}

impl TemplateChar for char {
    fn is_eol(&self) -> bool {
        matches!(*self, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_ws(&self) -> bool {
        self.is_eol()
            || matches!(
                *self,
                ' ' | '\t' | '\u{0B}' | '\u{0C}' | '\u{A0}' | '\u{FEFF}'
            )
    }

    fn is_key_start(&self) -> bool {
        self.is_ascii_alphabetic() || *self == '$' || *self == '_'
    }

    fn is_key_continue(&self) -> bool {
        self.is_ascii_alphanumeric() || *self == '$' || *self == '_'
    }
}

/// Namespaces are plain words: no `$`, no leading underscore
fn is_namespace(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

/// Text mode is used between tags, tag mode inside `{ ... }`
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum LexMode {
    Text,
    Tag,
}

struct Lookahead {
    token: Token,
    /// Where lexing of the peeked token started, including any skipped filler
    rewind: usize,
}

pub struct Lexer<'a> {
    pub reader: Reader<'a>,
    pub source: &'a str,
    pub mode: LexMode,
    lookahead: Option<Lookahead>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let reader = Reader::new(source);
        Lexer {
            reader,
            source,
            mode: LexMode::Text,
            lookahead: None,
        }
    }

    /// Switching modes discards a token peeked under the old mode, since the
    /// same characters may lex differently under the new one.
    pub fn set_mode(&mut self, mode: LexMode) {
        if self.mode == mode {
            return;
        }
        trace!("set_mode: {:?} -> {:?}", self.mode, mode);
        if let Some(lookahead) = self.lookahead.take() {
            self.reader.reset(lookahead.rewind);
        }
        self.mode = mode;
    }

    pub fn next_token(&mut self) -> Result<Token> {
        match self.lookahead.take() {
            Some(lookahead) => Ok(lookahead.token),
            None => self.lex(),
        }
    }

    pub fn peek_token(&mut self) -> Result<&Token> {
        if self.lookahead.is_none() {
            let rewind = self.reader.offset();
            let token = self.lex()?;
            self.lookahead = Some(Lookahead { token, rewind });
        }
        match &self.lookahead {
            Some(lookahead) => Ok(&lookahead.token),
            None => unreachable!("lookahead was just filled"),
        }
    }

    fn lex(&mut self) -> Result<Token> {
        match self.mode {
            LexMode::Text => self.lex_text(),
            LexMode::Tag => self.lex_tag(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.reader.peek()
    }

    fn eat(&mut self, ch: char) {
        let next_ch = self.reader.next();
        debug_assert_eq!(Some(ch), next_ch);
    }

    fn skip_while<F>(&mut self, pred: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                return;
            }
            self.eat(ch);
        }
    }

    fn symbol(&self, lo: usize, hi: usize) -> Symbol {
        Symbol::intern(self.reader.slice(lo, hi))
    }

    fn error(&self, message: &str, expected: &str, found: &str, span: Span) -> Diagnostic {
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![Label::primary(span).with_message(format!("Expected {}", expected))])
            .with_expected(expected)
            .with_found(found)
    }

    // Read a token containing a single character
    fn punc(&mut self, kind: TokenKind, token_char: char) -> Token {
        let lo = self.reader.offset();
        self.eat(token_char);
        token(kind, self.reader.end(lo))
    }

    fn lex_text(&mut self) -> Result<Token> {
        loop {
            let lo = self.reader.offset();
            let ch = match self.peek_char() {
                Some(ch) => ch,
                None => return Ok(token(TokenKind::EOF, self.reader.end(lo))),
            };
            return match ch {
                '{' => match self.open_curly()? {
                    Some(token) => Ok(token),
                    // A comment, keep going
                    None => continue,
                },
                '}' => Ok(self.punc(TokenKind::RCurlyBrace, '}')),
                ch if ch.is_eol() => Ok(self.format()),
                _ => Ok(self.buffer()),
            };
        }
    }

    fn lex_tag(&mut self) -> Result<Token> {
        loop {
            self.skip_while(|ch| ch.is_ws());
            let lo = self.reader.offset();
            let ch = match self.peek_char() {
                Some(ch) => ch,
                None => return Ok(token(TokenKind::EOF, self.reader.end(lo))),
            };
            return match ch {
                '{' => match self.open_curly()? {
                    Some(token) => Ok(token),
                    None => continue,
                },
                '}' => Ok(self.punc(TokenKind::RCurlyBrace, '}')),
                '(' => Ok(self.punc(TokenKind::LParen, '(')),
                ')' => Ok(self.punc(TokenKind::RParen, ')')),
                '|' => Ok(self.punc(TokenKind::Pipe, '|')),
                ':' => Ok(self.map_key()),
                '"' => self.string(),
                '0'..='9' => self.number(),
                '-' if matches!(self.reader.peek_nth(1), Some('0'..='9')) => self.number(),
                '+' => Ok(self.operator("+", "add")),
                '-' => Ok(self.operator("-", "sub")),
                '*' => Ok(self.operator("*", "mul")),
                '/' => Ok(self.operator("/", "div")),
                '%' => Ok(self.operator("%", "mod")),
                '=' if self.reader.starts_with("==") => Ok(self.operator("==", "eq")),
                '!' if self.reader.starts_with("!=") => Ok(self.operator("!=", "neq")),
                '<' if self.reader.starts_with("<=") => Ok(self.operator("<=", "lte")),
                '>' if self.reader.starts_with(">=") => Ok(self.operator(">=", "gte")),
                '<' => Ok(self.operator("<", "lt")),
                '>' => Ok(self.operator(">", "gt")),
                ch if ch.is_key_start() => self.ident(),
                ch => {
                    self.eat(ch);
                    let span = self.reader.end(lo);
                    Err(self.error(
                        "Unexpected character",
                        "an expression or `}`",
                        &format!("`{}`", ch),
                        span,
                    ))
                }
            };
        }
    }

    /// Handles everything that starts with `{`. Comments are consumed and
    /// yield `None`; raw blocks and escapes are single tokens.
    fn open_curly(&mut self) -> Result<Option<Token>> {
        let lo = self.reader.offset();
        if self.reader.starts_with("{*") {
            // An unterminated comment is just a tag starting with `*`
            if let Some(end) = self.reader.find("*}") {
                if end >= 2 {
                    trace!("comment at {}", lo);
                    self.reader.advance(end + 2);
                    return Ok(None);
                }
            }
        }
        if self.reader.starts_with("{`") {
            if let Some(end) = self.reader.find("`}") {
                if end >= 2 {
                    let value = self.symbol(lo + 2, lo + end);
                    self.reader.advance(end + 2);
                    return Ok(Some(token(TokenKind::Raw(value), self.reader.end(lo))));
                }
            }
        }
        if self.reader.starts_with("{~") {
            let mut len = 0;
            while let Some(ch) = self.reader.peek_nth(2 + len) {
                if !ch.is_ascii_alphabetic() {
                    break;
                }
                len += 1;
            }
            if len > 0 && self.reader.peek_nth(2 + len) == Some('}') {
                // Escape codes are ASCII so characters and bytes line up
                let code = self.symbol(lo + 2, lo + 2 + len);
                self.reader.advance(len + 3);
                return Ok(Some(token(TokenKind::Escape(code), self.reader.end(lo))));
            }
        }
        Ok(Some(self.punc(TokenKind::LCurlyBrace, '{')))
    }

    fn format(&mut self) -> Token {
        let lo = self.reader.offset();
        self.skip_while(|ch| ch.is_ws());
        let value = self.symbol(lo, self.reader.offset());
        token(TokenKind::Format(value), self.reader.end(lo))
    }

    fn buffer(&mut self) -> Token {
        let lo = self.reader.offset();
        self.skip_while(|ch| ch != '{' && ch != '}' && !ch.is_eol());
        let value = self.symbol(lo, self.reader.offset());
        token(TokenKind::Text(value), self.reader.end(lo))
    }

    fn operator(&mut self, op: &str, helper: &str) -> Token {
        let lo = self.reader.offset();
        self.reader.advance(op.len());
        token(
            TokenKind::Operator(Symbol::intern(helper)),
            self.reader.end(lo),
        )
    }

    fn map_key(&mut self) -> Token {
        let lo = self.reader.offset();
        self.eat(':');
        match self.peek_char() {
            Some(ch) if ch.is_key_start() => {
                let key_lo = self.reader.offset();
                self.key();
                let key = self.symbol(key_lo, self.reader.offset());
                token(TokenKind::MapKey(key), self.reader.end(lo))
            }
            _ => token(TokenKind::Colon, self.reader.end(lo)),
        }
    }

    fn string(&mut self) -> Result<Token> {
        let lo = self.reader.offset();
        self.eat('"');
        self.skip_while(|ch| ch != '"' && !ch.is_eol());
        if self.peek_char() != Some('"') {
            let span = self.reader.end(lo);
            let found = if self.peek_char().is_some() {
                "a line break"
            } else {
                "end of input"
            };
            return Err(self.error("Unterminated string literal", "`\"`", found, span));
        }
        let value = self.symbol(lo + 1, self.reader.offset());
        self.eat('"');
        Ok(token(
            TokenKind::Lit(Lit {
                kind: LitKind::Str,
                symbol: value,
            }),
            self.reader.end(lo),
        ))
    }

    fn number(&mut self) -> Result<Token> {
        let lo = self.reader.offset();
        if self.peek_char() == Some('-') {
            self.eat('-');
        }
        self.skip_while(|ch| ch.is_ascii_digit());
        let mut kind = LitKind::Int;
        if self.peek_char() == Some('.')
            && matches!(self.reader.peek_nth(1), Some(ch) if ch.is_ascii_digit())
        {
            self.eat('.');
            self.skip_while(|ch| ch.is_ascii_digit());
            kind = LitKind::Float;
        }
        let symbol = self.symbol(lo, self.reader.offset());
        Ok(token(TokenKind::Lit(Lit { kind, symbol }), self.reader.end(lo)))
    }

    /// keypart: `[a-zA-Z$_][a-zA-Z0-9$_]*`
    fn keypart(&mut self) {
        self.skip_while(|ch| ch.is_key_continue());
    }

    /// key: keypart (`.` keypart)*
    fn key(&mut self) {
        self.keypart();
        while self.peek_char() == Some('.')
            && matches!(self.reader.peek_nth(1), Some(ch) if ch.is_key_start())
        {
            self.eat('.');
            self.keypart();
        }
    }

    fn ident(&mut self) -> Result<Token> {
        let lo = self.reader.offset();
        self.keypart();
        let first = self.reader.slice(lo, self.reader.offset());

        if self.reader.starts_with("::") {
            if !is_namespace(first) {
                let span = self.reader.end(lo);
                return Err(self.error(
                    "Invalid namespace",
                    "a namespace made of letters, digits and `_`",
                    &format!("`{}`", first),
                    span,
                ));
            }
            let namespace = Symbol::intern(first);
            self.reader.advance(2);
            let name = match self.peek_char() {
                Some(ch) if ch.is_key_start() => {
                    let name_lo = self.reader.offset();
                    self.key();
                    Some(self.symbol(name_lo, self.reader.offset()))
                }
                Some('.') => {
                    self.eat('.');
                    None
                }
                found => {
                    let span = self.reader.end(lo);
                    let found = found.map_or_else(|| "end of input".to_string(), |ch| format!("`{}`", ch));
                    return Err(self.error(
                        "Incomplete identifier",
                        "a name or `.` after `::`",
                        &found,
                        span,
                    ));
                }
            };
            return Ok(token(
                TokenKind::Ident {
                    namespace: Some(namespace),
                    name,
                },
                self.reader.end(lo),
            ));
        }

        // Continue a dotted path
        while self.peek_char() == Some('.')
            && matches!(self.reader.peek_nth(1), Some(ch) if ch.is_key_start())
        {
            self.eat('.');
            self.keypart();
        }
        let name = self.reader.slice(lo, self.reader.offset());
        let span = self.reader.end(lo);
        let kind = match name {
            "fn" => TokenKind::Reserved(Keyword::Fn),
            "true" | "false" => TokenKind::Lit(Lit {
                kind: LitKind::Bool,
                symbol: Symbol::intern(name),
            }),
            _ => TokenKind::Ident {
                namespace: None,
                name: Some(Symbol::intern(name)),
            },
        };
        Ok(token(kind, span))
    }
}

impl<'a> Lexer<'a> {
    /// Skip whitespace and comments without lexing a token. Used where the
    /// grammar allows filler before switching back to text mode.
    pub fn skip_filler(&mut self) {
        if let Some(lookahead) = self.lookahead.take() {
            self.reader.reset(lookahead.rewind);
        }
        loop {
            self.skip_while(|ch| ch.is_ws());
            match self.reader.find("*}") {
                Some(end) if self.reader.starts_with("{*") && end >= 2 => {
                    self.reader.advance(end + 2);
                }
                _ => return,
            }
        }
    }

    /// Whether the next unread character is `ch`, ignoring any lookahead
    pub fn at_char(&self, ch: char) -> bool {
        self.lookahead.is_none() && self.peek_char() == Some(ch)
    }

    /// An empty span at the next unread character
    pub fn current_span(&self) -> Span {
        let lo = match &self.lookahead {
            Some(lookahead) => lookahead.token.span.start().to_usize(),
            None => self.reader.offset(),
        };
        span(lo, lo)
    }
}
