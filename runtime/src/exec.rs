use crate::chunk::Chunk;
use crate::error::RenderError;
use crate::helpers;
use crate::value::{Deferred, Function, Map, RenderResult, Value};

use codegen::{Body, Expr, Literal, Namespace, Op};
use data_structures::find_similar;
use log::debug;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// What a render needs from the engine that is driving it.
pub trait Host {
    /// Host-registered helpers, as a map of functions
    fn helpers(&self) -> Value;

    /// Render another template by name; the target of `include`.
    fn render_template(&self, name: &str, data: Value, ctx: Value) -> Deferred;
}

/// The namespaces visible to one render.
pub struct Globals {
    pub data: Value,
    pub view_model: Value,
    pub helpers: Value,
    pub strings: Value,
    pub ctx: Value,
    pub host: Rc<dyn Host>,
    frames: RefCell<Vec<Weak<Frame>>>,
}

impl Globals {
    pub fn new(host: Rc<dyn Host>, data: Value, view_model: Value, strings: Value, ctx: Value) -> Globals {
        Globals {
            helpers: host.helpers(),
            data,
            view_model,
            strings,
            ctx,
            host,
            frames: RefCell::default(),
        }
    }

    fn namespace(&self, namespace: Namespace) -> &Value {
        match namespace {
            Namespace::Data => &self.data,
            Namespace::ViewModel => &self.view_model,
            Namespace::Helper => &self.helpers,
            Namespace::Strings => &self.strings,
            Namespace::Ctx => &self.ctx,
        }
    }
}

/// The locals of one invocation of a body. Closures created while the
/// body runs keep the frame alive as their lexical parent.
#[derive(Default)]
pub struct Frame {
    locals: RefCell<Vec<Value>>,
    lookups: RefCell<Vec<Value>>,
    parent: RefCell<Option<Rc<Frame>>>,
}

impl Frame {
    fn ancestor(self: &Rc<Frame>, depth: usize) -> Option<Rc<Frame>> {
        let mut frame = self.clone();
        for _ in 0..depth {
            let parent = frame.parent.borrow().clone()?;
            frame = parent;
        }
        Some(frame)
    }

    fn local(&self, index: usize) -> Value {
        self.locals.borrow().get(index).cloned().unwrap_or(Value::Null)
    }

    fn lookup(&self, index: usize) -> Value {
        self.lookups.borrow().get(index).cloned().unwrap_or(Value::Null)
    }

    /// Drop everything the frame holds. Frames and the closures stored in
    /// their slots refer to each other, so this is what frees them.
    fn clear(&self) {
        self.locals.borrow_mut().clear();
        self.lookups.borrow_mut().clear();
        self.parent.borrow_mut().take();
    }
}

/// Walks a compiled program.
#[derive(Clone)]
pub struct Executor {
    globals: Rc<Globals>,
}

impl Executor {
    pub fn new(globals: Globals) -> Executor {
        Executor {
            globals: Rc::new(globals),
        }
    }

    pub fn run(&self, body: &Arc<Body>) -> RenderResult {
        self.invoke(body, None, &[])
    }

    /// Release every frame created by this render.
    pub fn teardown(&self) {
        let frames = std::mem::take(&mut *self.globals.frames.borrow_mut());
        debug!("releasing {} frames", frames.len());
        for frame in frames.iter().filter_map(Weak::upgrade) {
            frame.clear();
        }
    }

    /// Remember a frame for teardown. Frames that already died are
    /// dropped whenever the list would grow.
    fn track(&self, frame: &Rc<Frame>) {
        let mut frames = self.globals.frames.borrow_mut();
        if frames.len() == frames.capacity() {
            frames.retain(|frame| frame.strong_count() > 0);
        }
        frames.push(Rc::downgrade(frame));
    }

    fn invoke(&self, body: &Arc<Body>, parent: Option<Rc<Frame>>, args: &[Value]) -> RenderResult {
        let frame = Rc::new(Frame {
            locals: RefCell::new(Vec::with_capacity(body.local_slots())),
            lookups: RefCell::new(Vec::with_capacity(body.lookups.len())),
            parent: RefCell::new(parent),
        });
        self.track(&frame);

        frame.locals.borrow_mut().extend(
            (0..body.params).map(|index| args.get(index).cloned().unwrap_or(Value::Null)),
        );
        let lookups: Vec<Value> = body.lookups.iter().map(|name| self.dynamic_lookup(name)).collect();
        *frame.lookups.borrow_mut() = lookups;
        for def in &body.defs {
            let value = self.eval(def, &frame)?;
            frame.locals.borrow_mut().push(value);
        }

        let mut chunk = Chunk::new();
        for op in &body.ops {
            match op {
                Op::Text(text) => chunk.write_str(text),
                Op::Write(expr) => chunk.write(self.eval(expr, &frame)?)?,
            }
        }
        Ok(chunk.finalize())
    }

    /// The first truthy value for `name` across the namespaces.
    fn dynamic_lookup(&self, name: &str) -> Value {
        let found = Namespace::LOOKUP_ORDER
            .iter()
            .map(|namespace| self.globals.namespace(*namespace).get(name))
            .find(Value::is_truthy);
        found.unwrap_or_else(|| {
            debug!("`{}` was not found in any namespace", name);
            Value::Null
        })
    }

    fn namespace_value(&self, namespace: Namespace, path: &[String]) -> Value {
        let value = self.globals.namespace(namespace).get_path(path);
        if namespace == Namespace::Helper && value.is_null() {
            if let (Some(name), Value::Map(helpers)) = (path.first(), &self.globals.helpers) {
                match find_similar(name, helpers.keys().map(String::as_str)) {
                    Some(similar) => debug!("no helper named `{}`, did you mean `{}`?", name, similar),
                    None => debug!("no helper named `{}`", name),
                }
            }
        }
        value
    }

    fn closure(&self, body: &Arc<Body>, frame: &Rc<Frame>) -> Value {
        let executor = self.clone();
        let body = body.clone();
        let parent = frame.clone();
        Value::Function(Function::new(move |args| {
            executor.invoke(&body, Some(parent.clone()), args)
        }))
    }

    fn eval_all(&self, exprs: &[Expr], frame: &Rc<Frame>) -> Result<Vec<Value>, RenderError> {
        exprs.iter().map(|expr| self.eval(expr, frame)).collect()
    }

    fn eval(&self, expr: &Expr, frame: &Rc<Frame>) -> RenderResult {
        Ok(match expr {
            Expr::Null => Value::Null,
            Expr::Literal(literal) => match literal {
                Literal::Str(text) => Value::from(text.as_str()),
                Literal::Int(value) => Value::Int(*value),
                Literal::Float(value) => Value::Float(*value),
                Literal::Bool(value) => Value::Bool(*value),
            },
            Expr::Array(items) => Value::from(self.eval_all(items, frame)?),
            Expr::Map(entries) => {
                let mut map = Map::default();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value, frame)?);
                }
                Value::from(map)
            }
            Expr::Local { depth, index, path } => frame
                .ancestor(*depth)
                .map_or(Value::Null, |frame| frame.local(*index))
                .get_path(path),
            Expr::Lookup { index, path } => frame.lookup(*index).get_path(path),
            Expr::Namespace { namespace, path } => self.namespace_value(*namespace, path),
            Expr::Builtin(builtin) => Value::Function(helpers::function(*builtin)),
            Expr::Function(body) => self.closure(body, frame),
            Expr::Call { callee, args } => {
                let args = self.eval_all(args, frame)?;
                // Builtins are called directly
                if let Expr::Builtin(builtin) = callee.as_ref() {
                    return helpers::call(*builtin, &args);
                }
                match self.eval(callee, frame)? {
                    Value::Function(function) => function.call(&args)?,
                    value if args.is_empty() => value,
                    value => {
                        return Err(RenderError::NotCallable {
                            kind: value.type_name(),
                        })
                    }
                }
            }
            Expr::Escape { escaper, value } => {
                let value = self.eval(value, frame)?;
                match self.eval(escaper, frame)? {
                    Value::Function(escaper) => escaper.call(&[value])?,
                    other => {
                        return Err(RenderError::NotCallable {
                            kind: other.type_name(),
                        })
                    }
                }
            }
            Expr::Include { name, data } => {
                let name = self.eval(name, frame)?.to_string();
                let data = match data {
                    Some(data) => self.eval(data, frame)?,
                    None => Value::Null,
                };
                debug!("including `{}`", name);
                Value::Deferred(
                    self.globals
                        .host
                        .render_template(&name, data, self.globals.ctx.clone()),
                )
            }
        })
    }
}
