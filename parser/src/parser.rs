// renaming this Tokenizer for now because I'm tired of the word Lexer...
use lexer::LexMode;
use lexer::Lexer as Tokenizer;
use syntax::ast::{self, expr, ExprKind};
use syntax::symbol::Symbol;
use syntax::token::{Keyword, Lit, LitKind, Token, TokenKind};

use diagnostics::ParseResult as Result;

use source::diagnostics::{Diagnostic, Label, Span};

use log::debug;

pub struct Parser<'s> {
    /// The tokenizer/lexer for this Parser instance
    tokenizer: Tokenizer<'s>,
    /// The span of the current token
    span: Span,
    /// Tags and collections currently open
    depth: usize,
}

/// Deeper nesting is rejected, so later passes can recurse freely.
pub const MAX_NESTING: usize = 128;

trait DiagnosticReporting {
    fn fatal(&self, message: &str, expected: &str, found: &Token) -> Diagnostic;
}

impl DiagnosticReporting for Parser<'_> {
    fn fatal(&self, message: &str, expected: &str, found: &Token) -> Diagnostic {
        let label = Label::primary(found.span).with_message(format!("Expected {}", expected));
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![label])
            .with_expected(expected)
            .with_found(found.kind.to_string())
    }
}

/// Parse a whole template.
pub fn parse(source: &str) -> Result<ast::Template> {
    Parser::new(source).parse_template()
}

impl Parser<'_> {
    pub fn new(source: &str) -> Parser<'_> {
        debug!("Parser::new");
        let tokenizer = Tokenizer::new(source);
        // Start with a dummy span
        let span = Span::new(0_u32, 0_u32);
        Parser {
            tokenizer,
            span,
            depth: 0,
        }
    }

    /// Returns the next token from the tokenizer.
    fn next_token(&mut self) -> Result<Token> {
        let token = self.tokenizer.next_token()?;
        debug!("next_token: {:?}", token.kind);
        self.span = token.span;
        Ok(token)
    }

    fn peek(&mut self) -> Result<&Token> {
        self.tokenizer.peek_token()
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if &self.peek()?.kind == kind {
            self.skip()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn skip(&mut self) -> Result<()> {
        self.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        debug!("expect {:?}", kind);
        let prev_span = self.span;
        let token = self.next_token()?;
        if &token.kind == kind {
            Ok(token)
        } else {
            let diagnostic = Diagnostic::error()
                .with_message(format!("Expected {} but found {}", kind, token.kind))
                .with_labels(vec![
                    Label::primary(token.span).with_message("Unexpected token"),
                    Label::secondary(prev_span)
                        .with_message(format!("Expected {} after this token", kind)),
                ])
                .with_expected(kind.to_string())
                .with_found(token.kind.to_string());
            Err(diagnostic)
        }
    }

    fn nested<T>(&mut self, open: Span, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            let label = Label::primary(open).with_message("Nested too deeply");
            return Err(Diagnostic::error()
                .with_message(format!("Nesting exceeds {} levels", MAX_NESTING))
                .with_labels(vec![label])
                .with_expected(format!("at most {} nested tags or collections", MAX_NESTING))
                .with_found(format!("{} levels", self.depth + 1)));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn set_mode(&mut self, mode: LexMode) {
        self.tokenizer.set_mode(mode);
    }

    /// Root call for the parser. The whole input must be consumed; a stray
    /// `}` at the top level is an error rather than the end of the template.
    pub fn parse_template(&mut self) -> Result<ast::Template> {
        let body = self.block()?;
        let token = self.next_token()?;
        match token.kind {
            TokenKind::EOF => Ok(ast::Template { body }),
            _ => Err(self.fatal("Unexpected token", "end of input", &token)),
        }
    }

    /// A sequence of text runs and tags, read in text mode. Stops in front
    /// of a `}` or the end of input without consuming it.
    fn block(&mut self) -> Result<ast::Block> {
        self.set_mode(LexMode::Text);
        let lo = self.tokenizer.current_span();
        let mut nodes = vec![];
        loop {
            self.set_mode(LexMode::Text);
            if self.peek()?.follows_block() {
                break;
            }
            let token = self.next_token()?;
            let node = match token.kind {
                TokenKind::Text(value) => ast::Node::Text(ast::Text {
                    kind: ast::TextKind::Buffer,
                    value,
                    span: token.span,
                }),
                TokenKind::Format(value) => ast::Node::Text(ast::Text {
                    kind: ast::TextKind::Format,
                    value,
                    span: token.span,
                }),
                TokenKind::LCurlyBrace => {
                    let open = token.span;
                    ast::Node::Tag(self.nested(open, |parser| parser.tag(open))?)
                }
                TokenKind::Raw(value) => ast::Node::Tag(expr(ExprKind::Raw(value), token.span)),
                TokenKind::Escape(code) => ast::Node::Tag(expr(
                    ExprKind::Escape(ast::Ident {
                        symbol: code,
                        span: token.span,
                    }),
                    token.span,
                )),
                _ => return Err(self.fatal("Unexpected token", "text or a tag", &token)),
            };
            nodes.push(node);
        }
        let span = if nodes.is_empty() {
            lo
        } else {
            lo.merge(self.span)
        };
        Ok(ast::Block { nodes, span })
    }

    /// Everything after the opening `{` of a tag, up to and including the
    /// closing `}`.
    fn tag(&mut self, open: Span) -> Result<ast::Expr> {
        self.set_mode(LexMode::Tag);
        match self.peek()?.kind.clone() {
            TokenKind::RCurlyBrace => {
                self.skip()?;
                return Ok(expr(ExprKind::Empty, open.merge(self.span)));
            }
            TokenKind::Reserved(Keyword::Fn) => {
                self.skip()?;
                return self.fn_def(open);
            }
            _ => {}
        }

        let callee = self.callable()?;
        if self.peek()?.kind == TokenKind::Pipe {
            let mut stages = vec![];
            while self.eat(&TokenKind::Pipe)? {
                stages.push(self.expression()?);
            }
            self.expect(&TokenKind::RCurlyBrace)?;
            debug!("pipe with {} stages", stages.len());
            return Ok(expr(
                ExprKind::Pipe(ast::Pipe {
                    source: Box::new(callee),
                    stages,
                }),
                open.merge(self.span),
            ));
        }

        let mut args = vec![];
        while !self.peek()?.follows_block() {
            args.push(self.expression()?);
        }
        self.expect(&TokenKind::RCurlyBrace)?;
        Ok(expr(
            ExprKind::Call(ast::Call {
                callee: Box::new(callee),
                args,
            }),
            open.merge(self.span),
        ))
    }

    /// `{fn (params) body}`, with `fn` already consumed
    fn fn_def(&mut self, open: Span) -> Result<ast::Expr> {
        let mut params: Vec<ast::Ident> = vec![];
        self.tokenizer.skip_filler();
        if self.tokenizer.at_char('(') {
            self.expect(&TokenKind::LParen)?;
            loop {
                let token = self.next_token()?;
                match token.kind {
                    TokenKind::RParen => break,
                    TokenKind::Ident {
                        namespace: None,
                        name: Some(ref name),
                    } if !name.as_str().contains('.') => {
                        if params.iter().any(|param| param.symbol == *name) {
                            return Err(self.fatal(
                                "Duplicate parameter name",
                                "a unique parameter name",
                                &token,
                            ));
                        }
                        params.push(ast::Ident {
                            symbol: name.clone(),
                            span: token.span,
                        });
                    }
                    _ => {
                        return Err(self.fatal(
                            "Invalid parameter list",
                            "a parameter name or `)`",
                            &token,
                        ))
                    }
                }
            }
            self.tokenizer.skip_filler();
        }
        let body = self.block()?;
        self.set_mode(LexMode::Tag);
        let close = self.next_token()?;
        if close.kind != TokenKind::RCurlyBrace {
            return Err(self.fatal(
                "Unterminated function body",
                "`}` to close the function",
                &close,
            ));
        }
        debug!("fn_def with {} params", params.len());
        Ok(expr(
            ExprKind::FnDef(ast::FnDef { params, body }),
            open.merge(self.span),
        ))
    }

    /// The first element of a call, where operators are allowed and
    /// name the helper they stand for.
    fn callable(&mut self) -> Result<ast::Expr> {
        let token = self.peek()?.clone();
        let helper = match &token.kind {
            TokenKind::Operator(helper) => helper.clone(),
            TokenKind::Ident {
                namespace: None,
                name: Some(name),
            } if name.as_str() == "and" => Symbol::intern("cmpand"),
            TokenKind::Ident {
                namespace: None,
                name: Some(name),
            } if name.as_str() == "or" => Symbol::intern("cmpor"),
            _ => return self.expression(),
        };
        self.skip()?;
        Ok(expr(
            ExprKind::Identifier(ast::Identifier {
                namespace: None,
                name: Some(helper),
            }),
            token.span,
        ))
    }

    fn expression(&mut self) -> Result<ast::Expr> {
        self.set_mode(LexMode::Tag);
        let token = self.next_token()?;
        let span = token.span;
        match token.kind {
            TokenKind::LCurlyBrace => self.nested(span, |parser| parser.tag(span)),
            TokenKind::Raw(value) => Ok(expr(ExprKind::Raw(value), span)),
            TokenKind::Escape(code) => Ok(expr(
                ExprKind::Escape(ast::Ident { symbol: code, span }),
                span,
            )),
            TokenKind::Lit(lit) => self.literal(lit, span),
            TokenKind::LParen => self.nested(span, |parser| parser.collection(span)),
            TokenKind::Ident { namespace, name } => Ok(expr(
                ExprKind::Identifier(ast::Identifier { namespace, name }),
                span,
            )),
            _ => Err(self.fatal("Unexpected token", "an expression", &token)),
        }
    }

    fn literal(&mut self, lit: Lit, span: Span) -> Result<ast::Expr> {
        let source = lit.symbol.as_str();
        let value = match lit.kind {
            LitKind::Str => ast::Literal::Str(source.to_string()),
            LitKind::Bool => ast::Literal::Bool(source == "true"),
            LitKind::Int => match source.parse::<i64>() {
                Ok(value) => ast::Literal::Int(value),
                Err(_) => {
                    let label = Label::primary(span).with_message("Does not fit in 64 bits");
                    return Err(Diagnostic::error()
                        .with_message("Integer literal out of range")
                        .with_labels(vec![label])
                        .with_expected("an integer between -2^63 and 2^63-1")
                        .with_found(source.to_string()));
                }
            },
            LitKind::Float => match source.parse::<f64>() {
                Ok(value) => ast::Literal::Float(value),
                Err(_) => {
                    let label = Label::primary(span).with_message("Not a valid number");
                    return Err(Diagnostic::error()
                        .with_message("Invalid float literal")
                        .with_labels(vec![label])
                        .with_expected("a decimal number")
                        .with_found(source.to_string()));
                }
            },
        };
        Ok(expr(ExprKind::Literal(value), span))
    }

    /// `(a b c)`, `(:key value ...)` or `(:)`, with `(` already consumed
    fn collection(&mut self, open: Span) -> Result<ast::Expr> {
        match self.peek()?.kind.clone() {
            TokenKind::Colon => {
                self.skip()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr(ExprKind::Map(vec![]), open.merge(self.span)))
            }
            TokenKind::MapKey(_) => self.map(open),
            _ => {
                let mut items = vec![];
                while !self.eat(&TokenKind::RParen)? {
                    if self.peek()?.kind == TokenKind::EOF {
                        let token = self.next_token()?;
                        return Err(self.fatal("Unterminated array", "`)`", &token));
                    }
                    items.push(self.expression()?);
                }
                Ok(expr(ExprKind::Array(items), open.merge(self.span)))
            }
        }
    }

    fn map(&mut self, open: Span) -> Result<ast::Expr> {
        let mut entries: Vec<ast::MapEntry> = vec![];
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::MapKey(ref key) => {
                    if entries.iter().any(|entry| entry.key.symbol == *key) {
                        return Err(self.fatal("Duplicate map key", "a unique key", &token));
                    }
                    let key = ast::Ident {
                        symbol: key.clone(),
                        span: token.span,
                    };
                    let value = self.expression()?;
                    entries.push(ast::MapEntry { key, value });
                }
                _ => return Err(self.fatal("Invalid map literal", "a `:key` or `)`", &token)),
            }
        }
        Ok(expr(ExprKind::Map(entries), open.merge(self.span)))
    }
}
