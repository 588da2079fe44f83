use crate::error::RenderError;

use futures::channel::oneshot;
use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use fxhash::FxHashMap;

use std::fmt;
use std::future::Future;
use std::rc::Rc;

pub type Map = FxHashMap<String, Value>;
pub type RenderResult = Result<Value, RenderError>;

/// Render-time values.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(Rc<Vec<Value>>),
    Map(Rc<Map>),
    Function(Function),
    /// A value that is not available yet
    Deferred(Deferred),
}

/// A callable value: template `fn`s, builtins, host helpers and
/// view-model methods all look the same to the interpreter.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> RenderResult>);

impl Function {
    pub fn new(f: impl Fn(&[Value]) -> RenderResult + 'static) -> Function {
        Function(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> RenderResult {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<function>")
    }
}

/// A shared handle to a value that resolves later. Every clone observes the
/// same result.
#[derive(Clone)]
pub struct Deferred(Shared<LocalBoxFuture<'static, RenderResult>>);

impl Deferred {
    pub fn new(future: impl Future<Output = RenderResult> + 'static) -> Deferred {
        Deferred(future.boxed_local().shared())
    }

    /// A deferred value that is filled through the returned sender. Dropping
    /// the sender rejects it.
    pub fn channel() -> (oneshot::Sender<RenderResult>, Deferred) {
        let (sender, receiver) = oneshot::channel();
        let deferred = Deferred::new(async move {
            match receiver.await {
                Ok(result) => result,
                Err(oneshot::Canceled) => Err(RenderError::Dropped),
            }
        });
        (sender, deferred)
    }

    pub async fn resolve(self) -> RenderResult {
        self.0.await
    }

    /// The result, if it has already been produced.
    pub fn peek(&self) -> Option<&RenderResult> {
        self.0.peek()
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(result) => f.debug_tuple("Deferred").field(result).finish(),
            None => f.write_str("Deferred(<pending>)"),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Deferred(_) => "deferred",
        }
    }

    /// Truthiness for `if`, `not`, `cmpand`, `cmpor` and dynamic lookups.
    /// Empty arrays and maps are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Map(_) | Value::Function(_) | Value::Deferred(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by arithmetic and ordering. Strings that do not
    /// parse become NaN.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    /// Property access: map keys, array indexes and `length`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Map(map) => map.get(key).cloned().unwrap_or(Value::Null),
            Value::Array(items) => match key {
                "length" => Value::Int(i64::try_from(items.len()).unwrap_or(i64::MAX)),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or(Value::Null),
            },
            Value::Str(s) if key == "length" => {
                Value::Int(i64::try_from(s.chars().count()).unwrap_or(i64::MAX))
            }
            _ => Value::Null,
        }
    }

    /// Follow a dotted path. A missing step yields null.
    pub fn get_path(&self, path: &[String]) -> Value {
        let mut current = self.clone();
        for key in path {
            if current.is_null() {
                break;
            }
            current = current.get(key);
        }
        current
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Exponent form, with the sign JS puts on positive exponents
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => write!(f, "{}e+{}", mantissa, exponent),
            _ => f.write_str(&text),
        }
    } else if n.fract() == 0.0 {
        write!(f, "{:.0}", n)
    } else {
        write!(f, "{}", n)
    }
}

/// The text a value contributes to the output.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write_number(f, *n),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object Object]"),
            Value::Function(_) => f.write_str("[function]"),
            Value::Deferred(_) => f.write_str("[deferred]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Function(function) => function.fmt(f),
            Value::Deferred(deferred) => deferred.fmt(f),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(Rc::new(map))
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Deferred(deferred)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::from(items.into_iter().map(Value::from).collect::<Vec<_>>())
            }
            serde_json::Value::Object(entries) => Value::from(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect::<Map>(),
            ),
        }
    }
}
