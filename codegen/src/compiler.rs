use crate::ir::{Body, Builtin, Expr, Literal, Namespace, Op, Program};
use crate::options::{CompileOptions, DefaultEscape};

use data_structures::scope_map::ScopeMap;
use diagnostics::{ParseResult as Result, SyntaxError};
use source::diagnostics::{Diagnostic, Label, Span};
use syntax::ast::{self, ExprKind};
use syntax::symbol::Symbol;

use log::debug;

use std::sync::Arc;

const INTRINSICS: [&str; 4] = ["def", "safe", "pragma", "include"];

/// Parse and compile a template. Compilation is all-or-nothing: any
/// error means no program.
pub fn compile(name: &str, source: &str, options: &CompileOptions) -> std::result::Result<Program, SyntaxError> {
    debug!("compile: {}", name);
    parser::parse(source)
        .and_then(|template| Compiler::new(name, options.clone()).compile_template(&template))
        .map_err(|diagnostic| SyntaxError::from_diagnostic(name, source, diagnostic))
}

fn error(message: impl Into<String>, expected: &str, found: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error()
        .with_message(message)
        .with_labels(vec![Label::primary(span).with_message(format!("Expected {}", expected))])
        .with_expected(expected)
        .with_found(found)
}

fn describe(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Call(_) => "a call",
        ExprKind::FnDef(_) => "an inline function",
        ExprKind::Pipe(_) => "a pipe",
        ExprKind::Identifier(_) => "an identifier",
        ExprKind::Literal(_) => "a literal",
        ExprKind::Map(_) => "a map",
        ExprKind::Array(_) => "an array",
        ExprKind::Escape(_) => "an escape",
        ExprKind::Raw(_) => "a raw block",
        ExprKind::Empty => "an empty tag",
    }
}

fn split_path(name: &str) -> Vec<String> {
    name.split('.').map(String::from).collect()
}

/// Lowers one template's AST into a `Program`. A compiler is used for a
/// single template; pragmas change its options as it goes.
pub struct Compiler {
    name: String,
    options: CompileOptions,
    scopes: ScopeMap<Symbol, Expr>,
    /// Non-zero while compiling the argument of `safe`
    unescaped_depth: usize,
    helpers: Vec<Builtin>,
}

impl Compiler {
    pub fn new(name: &str, options: CompileOptions) -> Compiler {
        Compiler {
            name: name.to_string(),
            options,
            scopes: ScopeMap::default(),
            unescaped_depth: 0,
            helpers: vec![],
        }
    }

    pub fn compile_template(mut self, template: &ast::Template) -> Result<Program> {
        let body = self.function_body(vec![], &template.body)?;
        debug!(
            "compiled {}: {} ops, helpers {:?}",
            self.name,
            body.ops.len(),
            self.helpers
        );
        Ok(Program {
            name: self.name,
            body: Arc::new(body),
            helpers: self.helpers,
        })
    }

    fn function_body(&mut self, params: Vec<Symbol>, block: &ast::Block) -> Result<Body> {
        let param_count = params.len();
        self.scopes.push_scope(params);
        let ops = self.block(block);
        let scope = self.scopes.pop_scope().ok_or_else(|| {
            error("Scope stack underflow", "an open scope", "none", block.span)
        })?;
        let ops = ops?;
        let (defs, lookups) = scope.into_parts();
        Ok(Body {
            params: param_count,
            defs: defs.into_iter().map(|(_, value)| value).collect(),
            lookups: lookups.iter().map(|name| name.as_str().to_string()).collect(),
            ops,
        })
    }

    fn block(&mut self, block: &ast::Block) -> Result<Vec<Op>> {
        let mut ops = vec![];
        for node in &block.nodes {
            match node {
                ast::Node::Text(text) => {
                    if text.kind == ast::TextKind::Buffer || self.options.keep_whitespace {
                        push_text(&mut ops, text.value.as_str());
                    }
                }
                ast::Node::Tag(expr) => match self.expression(expr)? {
                    None | Some(Expr::Null) => {}
                    Some(Expr::Literal(Literal::Str(text))) => push_text(&mut ops, &text),
                    Some(expr) => ops.push(Op::Write(expr)),
                },
            }
        }
        Ok(ops)
    }

    /// Compile an expression whose value is needed. Intrinsics that write
    /// nothing become null.
    fn value(&mut self, expr: &ast::Expr) -> Result<Expr> {
        Ok(self.expression(expr)?.unwrap_or(Expr::Null))
    }

    fn expression(&mut self, expr: &ast::Expr) -> Result<Option<Expr>> {
        let compiled = match &expr.kind {
            ExprKind::Call(call) => return self.call(call, expr.span),
            ExprKind::FnDef(def) => self.fn_def(def)?,
            ExprKind::Pipe(pipe) => self.pipe(pipe, expr.span)?,
            ExprKind::Identifier(ident) => self.identifier(ident, expr.span)?.0,
            ExprKind::Literal(literal) => Expr::Literal(match literal {
                ast::Literal::Str(value) => Literal::Str(value.clone()),
                ast::Literal::Int(value) => Literal::Int(*value),
                ast::Literal::Float(value) => Literal::Float(*value),
                ast::Literal::Bool(value) => Literal::Bool(*value),
            }),
            ExprKind::Map(entries) => {
                let mut compiled = Vec::with_capacity(entries.len());
                for entry in entries {
                    compiled.push((entry.key.symbol.as_str().to_string(), self.value(&entry.value)?));
                }
                Expr::Map(compiled)
            }
            ExprKind::Array(items) => Expr::Array(
                items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            ExprKind::Escape(code) => {
                let text = match code.symbol.as_str() {
                    "s" => " ",
                    "n" => "\n",
                    "r" => "\r",
                    "lb" => "{",
                    "rb" => "}",
                    other => {
                        return Err(error(
                            format!("Unknown escape code `{}`", other),
                            "one of s, n, r, lb, rb",
                            format!("`{}`", other),
                            code.span,
                        ))
                    }
                };
                Expr::Literal(Literal::Str(text.to_string()))
            }
            ExprKind::Raw(value) => Expr::Literal(Literal::Str(value.as_str().to_string())),
            ExprKind::Empty => Expr::Null,
        };
        Ok(Some(compiled))
    }

    fn call(&mut self, call: &ast::Call, span: Span) -> Result<Option<Expr>> {
        if let ExprKind::Identifier(ident) = &call.callee.kind {
            match ident.simple_name() {
                Some("def") => return self.def(call, span).map(|_| None),
                Some("pragma") => return self.pragma(call, span).map(|_| None),
                Some("safe") => return self.safe(call, span).map(Some),
                Some("include") => return self.include(call, span).map(Some),
                _ => {}
            }
        }
        let (callee, protect) = self.callable(&call.callee)?;
        let args = call
            .args
            .iter()
            .map(|arg| self.value(arg))
            .collect::<Result<Vec<_>>>()?;
        let compiled = Expr::Call {
            callee: Box::new(callee),
            args,
        };
        self.protect(compiled, protect, span).map(Some)
    }

    /// Resolve something in call position. The flag says whether its result
    /// needs the default escaper.
    fn callable(&mut self, expr: &ast::Expr) -> Result<(Expr, bool)> {
        match &expr.kind {
            ExprKind::FnDef(def) => Ok((self.fn_def(def)?, false)),
            ExprKind::Identifier(ident) => {
                if let Some(name) = ident.simple_name() {
                    if INTRINSICS.contains(&name) {
                        return Err(error(
                            format!("`{}` can only be called directly", name),
                            "a function or identifier",
                            format!("`{}`", name),
                            expr.span,
                        ));
                    }
                }
                self.identifier(ident, expr.span)
            }
            other => Err(error(
                "Unknown callable",
                "an identifier or inline function",
                describe(other),
                expr.span,
            )),
        }
    }

    /// Lexically bound names and builtins compile to direct references;
    /// anything else is looked up when rendering.
    fn identifier(&mut self, ident: &ast::Identifier, span: Span) -> Result<(Expr, bool)> {
        match (&ident.namespace, &ident.name) {
            (Some(namespace), name) => {
                let resolved = Namespace::from_name(namespace.as_str()).ok_or_else(|| {
                    error(
                        format!("Unknown namespace `{}`", namespace),
                        "one of data, viewmodel, helper, strings, ctx",
                        format!("`{}`", namespace),
                        span,
                    )
                })?;
                let path = name.as_ref().map_or_else(Vec::new, |name| split_path(name.as_str()));
                Ok((
                    Expr::Namespace {
                        namespace: resolved,
                        path,
                    },
                    true,
                ))
            }
            (None, Some(name)) => {
                let mut path = split_path(name.as_str());
                let root = Symbol::intern(&path.remove(0));
                if let Some(address) = self.scopes.find_address(&root) {
                    return Ok((
                        Expr::Local {
                            depth: address.depth,
                            index: address.index,
                            path,
                        },
                        false,
                    ));
                }
                if path.is_empty() {
                    if let Some(builtin) = Builtin::from_name(root.as_str()) {
                        if !self.helpers.contains(&builtin) {
                            self.helpers.push(builtin);
                        }
                        return Ok((Expr::Builtin(builtin), false));
                    }
                }
                let index = self.scopes.record_lookup(root).ok_or_else(|| {
                    error("Lookup outside of any scope", "an open scope", "none", span)
                })?;
                Ok((Expr::Lookup { index, path }, true))
            }
            (None, None) => Err(error("Empty identifier", "a name", "nothing", span)),
        }
    }

    fn protect(&mut self, expr: Expr, protect: bool, span: Span) -> Result<Expr> {
        if !protect || self.unescaped_depth > 0 {
            return Ok(expr);
        }
        let escaper = match &self.options.default_escape {
            DefaultEscape::Disabled => return Ok(expr),
            DefaultEscape::Named(name) => name.clone(),
        };
        let ident = match escaper.split_once("::") {
            Some((namespace, name)) => ast::Identifier {
                namespace: Some(Symbol::intern(namespace)),
                name: Some(Symbol::intern(name)),
            },
            None => ast::Identifier {
                namespace: None,
                name: Some(Symbol::intern(&escaper)),
            },
        };
        let (escaper, _) = self.identifier(&ident, span)?;
        Ok(Expr::Escape {
            escaper: Box::new(escaper),
            value: Box::new(expr),
        })
    }

    fn fn_def(&mut self, def: &ast::FnDef) -> Result<Expr> {
        let params = def.params.iter().map(|param| param.symbol.clone()).collect();
        let body = self.function_body(params, &def.body)?;
        Ok(Expr::Function(Arc::new(body)))
    }

    fn pipe(&mut self, pipe: &ast::Pipe, span: Span) -> Result<Expr> {
        // Literal sources are used as is; anything else is invoked if it
        // turns out to be a function
        let mut acc = match &pipe.source.kind {
            ExprKind::Literal(_) | ExprKind::Map(_) | ExprKind::Array(_) => self.value(&pipe.source)?,
            _ => {
                let (callee, _) = self.callable(&pipe.source)?;
                Expr::Call {
                    callee: Box::new(callee),
                    args: vec![],
                }
            }
        };
        let mut protect = false;
        for stage in &pipe.stages {
            let (callee, needs_protection) = self.callable(stage)?;
            acc = Expr::Call {
                callee: Box::new(callee),
                args: vec![acc],
            };
            protect = needs_protection;
        }
        self.protect(acc, protect, span)
    }

    fn expect_args(&self, name: &str, call: &ast::Call, range: std::ops::RangeInclusive<usize>, span: Span) -> Result<()> {
        if range.contains(&call.args.len()) {
            return Ok(());
        }
        let expected = if range.start() == range.end() {
            format!("{} argument(s)", range.start())
        } else {
            format!("{} to {} arguments", range.start(), range.end())
        };
        Err(error(
            format!("`{}` takes {}", name, expected),
            &expected,
            format!("{} argument(s)", call.args.len()),
            span,
        ))
    }

    fn def(&mut self, call: &ast::Call, span: Span) -> Result<()> {
        self.expect_args("def", call, 2..=2, span)?;
        let target = &call.args[0];
        let name = match &target.kind {
            ExprKind::Identifier(ident) => ident.simple_name().map(Symbol::intern),
            _ => None,
        };
        let name = name.ok_or_else(|| {
            error(
                "The first argument to `def` must be a bare identifier",
                "a name without a namespace or path",
                describe(&target.kind),
                target.span,
            )
        })?;
        let value = self.value(&call.args[1])?;
        debug!("def {}", name);
        if self.scopes.add_def(name.clone(), value) {
            Ok(())
        } else {
            Err(error(
                format!("`{}` is already defined in this scope", name),
                "a name not yet bound in this scope",
                format!("`{}`", name),
                target.span,
            ))
        }
    }

    fn safe(&mut self, call: &ast::Call, span: Span) -> Result<Expr> {
        self.expect_args("safe", call, 1..=1, span)?;
        self.unescaped_depth += 1;
        let value = self.value(&call.args[0]);
        self.unescaped_depth -= 1;
        value
    }

    fn pragma(&mut self, call: &ast::Call, span: Span) -> Result<()> {
        self.expect_args("pragma", call, 2..=2, span)?;
        let (target, value) = (&call.args[0], &call.args[1]);
        let name = match &target.kind {
            ExprKind::Identifier(ident) => ident.simple_name(),
            _ => None,
        };
        let literal = match &value.kind {
            ExprKind::Literal(literal) => Some(literal),
            _ => None,
        };
        match (name, literal) {
            (Some("keepWhitespace"), Some(ast::Literal::Bool(keep))) => {
                self.options.keep_whitespace = *keep;
            }
            (Some("keepWhitespace"), _) => {
                return Err(error(
                    "`keepWhitespace` expects a boolean",
                    "true or false",
                    describe(&value.kind),
                    value.span,
                ))
            }
            (Some("defaultEscape"), Some(ast::Literal::Str(escaper))) => {
                self.options.default_escape = DefaultEscape::Named(escaper.clone());
            }
            (Some("defaultEscape"), Some(ast::Literal::Bool(false))) => {
                self.options.default_escape = DefaultEscape::Disabled;
            }
            (Some("defaultEscape"), _) => {
                return Err(error(
                    "`defaultEscape` expects an escaper name or false",
                    "a string or false",
                    describe(&value.kind),
                    value.span,
                ))
            }
            (Some(other), _) => {
                return Err(error(
                    format!("Unknown pragma `{}`", other),
                    "keepWhitespace or defaultEscape",
                    format!("`{}`", other),
                    target.span,
                ))
            }
            (None, _) => {
                return Err(error(
                    "The first argument to `pragma` must be a pragma name",
                    "keepWhitespace or defaultEscape",
                    describe(&target.kind),
                    target.span,
                ))
            }
        }
        debug!("pragma now {:?}", self.options);
        Ok(())
    }

    fn include(&mut self, call: &ast::Call, span: Span) -> Result<Expr> {
        self.expect_args("include", call, 1..=2, span)?;
        let name = self.value(&call.args[0])?;
        let data = match call.args.get(1) {
            Some(data) => Some(Box::new(self.value(data)?)),
            None => None,
        };
        Ok(Expr::Include {
            name: Box::new(name),
            data,
        })
    }
}

fn push_text(ops: &mut Vec<Op>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Op::Text(last)) = ops.last_mut() {
        last.push_str(text);
        return;
    }
    ops.push(Op::Text(text.to_string()));
}
