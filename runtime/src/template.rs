use crate::chunk::resolve_output;
use crate::error::RenderError;
use crate::exec::{Executor, Globals, Host};
use crate::value::{Deferred, RenderResult, Value};

use codegen::Program;
use log::debug;

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Builds the view-model for a render from its data.
pub type ViewModelFactory = Rc<dyn Fn(&Value) -> RenderResult>;

/// The result of a render: text, if nothing deferred was written.
#[derive(Debug)]
pub enum Output {
    Ready(String),
    Pending(Deferred),
}

impl Output {
    pub async fn into_string(self) -> Result<String, RenderError> {
        match self {
            Output::Ready(text) => Ok(text),
            Output::Pending(deferred) => resolve_output(Value::Deferred(deferred)).await,
        }
    }
}

/// A loaded template: a compiled program plus its optional view-model.
#[derive(Clone)]
pub struct Template {
    program: Arc<Program>,
    view_model: Option<ViewModelFactory>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.program.name)
            .field("view_model", &self.view_model.is_some())
            .finish()
    }
}

impl Template {
    pub fn new(program: Arc<Program>, view_model: Option<ViewModelFactory>) -> Template {
        Template {
            program,
            view_model,
        }
    }

    pub fn name(&self) -> &str {
        &self.program.name
    }

    /// Render synchronously as far as possible. Frames are released as
    /// soon as the output is complete.
    pub fn render(&self, host: Rc<dyn Host>, data: Value, strings: Value, ctx: Value) -> Result<Output, RenderError> {
        debug!("rendering {}", self.name());
        let view_model = match &self.view_model {
            Some(factory) => factory(&data)?,
            None => Value::Null,
        };
        let executor = Executor::new(Globals::new(host, data, view_model, strings, ctx));
        match executor.run(&self.program.body) {
            Err(error) => {
                executor.teardown();
                Err(error)
            }
            Ok(Value::Str(text)) => {
                executor.teardown();
                Ok(Output::Ready(text.to_string()))
            }
            Ok(value) => Ok(Output::Pending(Deferred::new(async move {
                let output = resolve_output(value).await;
                executor.teardown();
                output.map(Value::from)
            }))),
        }
    }
}
