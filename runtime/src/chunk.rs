use crate::error::RenderError;
use crate::value::{Deferred, Value};

use futures::future::{try_join_all, LocalBoxFuture};
use futures::FutureExt;
use log::trace;

enum Segment {
    Text(String),
    /// Index into the pending outputs, reserved when the write happened
    Slot(usize),
}

/// The output buffer for one body. Writes are synchronous; a deferred
/// write reserves a slot at its position and is filled in whenever it
/// resolves. Output is always assembled in write order.
#[derive(Default)]
pub struct Chunk {
    current: String,
    segments: Vec<Segment>,
    pending: Vec<LocalBoxFuture<'static, Result<String, RenderError>>>,
}

impl Chunk {
    pub fn new() -> Chunk {
        Chunk::default()
    }

    /// Whether any deferred value has been written
    pub fn is_async(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn write_str(&mut self, text: &str) {
        self.current.push_str(text);
    }

    /// Write a value. Functions are invoked without arguments and their
    /// result is written in their place.
    pub fn write(&mut self, value: Value) -> Result<(), RenderError> {
        match value {
            Value::Null => {}
            Value::Function(function) => {
                let result = function.call(&[])?;
                self.write(result)?;
            }
            Value::Deferred(deferred) => self.reserve(deferred),
            other => {
                use std::fmt::Write;
                // Writing into a String cannot fail
                let _ = write!(self.current, "{}", other);
            }
        }
        Ok(())
    }

    fn reserve(&mut self, deferred: Deferred) {
        if !self.current.is_empty() {
            let text = std::mem::take(&mut self.current);
            self.segments.push(Segment::Text(text));
        }
        let slot = self.pending.len();
        trace!("reserving output slot {}", slot);
        self.segments.push(Segment::Slot(slot));
        self.pending.push(resolve_output(Value::Deferred(deferred)));
    }

    /// The finished output: a string, or a deferred string once any slot
    /// was reserved. The first slot to fail fails the whole output.
    pub fn finalize(mut self) -> Value {
        if self.pending.is_empty() {
            return Value::from(self.current);
        }
        if !self.current.is_empty() {
            let text = std::mem::take(&mut self.current);
            self.segments.push(Segment::Text(text));
        }
        let Chunk {
            segments, pending, ..
        } = self;
        Value::Deferred(Deferred::new(async move {
            let filled = try_join_all(pending).await?;
            let mut output = String::new();
            for segment in &segments {
                match segment {
                    Segment::Text(text) => output.push_str(text),
                    Segment::Slot(slot) => output.push_str(&filled[*slot]),
                }
            }
            Ok(Value::from(output))
        }))
    }
}

/// Resolve a value all the way down to the text it writes, awaiting
/// deferred values and invoking functions as a write would.
pub fn resolve_output(value: Value) -> LocalBoxFuture<'static, Result<String, RenderError>> {
    async move {
        match value {
            Value::Deferred(deferred) => {
                let resolved = deferred.resolve().await?;
                resolve_output(resolved).await
            }
            Value::Function(function) => {
                let result = function.call(&[])?;
                resolve_output(result).await
            }
            other => Ok(other.to_string()),
        }
    }
    .boxed_local()
}
