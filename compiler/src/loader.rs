//! Where templates, view-models and strings come from. Every loader hands
//! back a future so synchronous, asynchronous and callback-driven hosts
//! all look the same to the engine.

use crate::error::LoadError;

use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use fxhash::FxHashMap;
use log::{debug, warn};
use runtime::{RenderResult, Value, ViewModelFactory};

use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

pub type LoadResult<T> = Result<T, LoadError>;

pub trait SourceLoader {
    fn load_source(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<String>>;
}

pub trait ViewModelLoader {
    /// `None` when the template has no view-model
    fn load_view_model(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<Option<ViewModelFactory>>>;
}

pub trait StringsLoader {
    fn load_strings(&self, name: &str, ctx: &Value) -> LocalBoxFuture<'static, LoadResult<Value>>;
}

/// Template sources held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLoader {
    sources: FxHashMap<String, String>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        InMemoryLoader::default()
    }

    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for InMemoryLoader {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        InMemoryLoader {
            sources: iter
                .into_iter()
                .map(|(name, source)| (name.into(), source.into()))
                .collect(),
        }
    }
}

impl SourceLoader for InMemoryLoader {
    fn load_source(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<String>> {
        let result = self
            .sources
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(name.to_string()));
        future::ready(result).boxed_local()
    }
}

/// Reads `<root>/<name><extension>` from disk.
#[derive(Clone, Debug)]
pub struct FileLoader {
    root: PathBuf,
    extension: String,
}

impl FileLoader {
    pub const DEFAULT_EXTENSION: &'static str = ".ltml";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileLoader {
            root: root.into(),
            extension: FileLoader::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The file backing `name`. Names may not climb out of the root.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let relative = format!("{}{}", name, self.extension);
        let escapes = Path::new(&relative)
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            None
        } else {
            Some(self.root.join(relative))
        }
    }
}

impl SourceLoader for FileLoader {
    fn load_source(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<String>> {
        let result = match self.path_for(name) {
            None => Err(LoadError::NotFound(name.to_string())),
            Some(path) => {
                debug!("reading {}", path.display());
                std::fs::read_to_string(&path).map_err(|err| match err.kind() {
                    std::io::ErrorKind::NotFound => LoadError::NotFound(name.to_string()),
                    _ => LoadError::Io {
                        path: path.display().to_string(),
                        message: err.to_string(),
                    },
                })
            }
        };
        future::ready(result).boxed_local()
    }
}

/// View-model factories registered by template name.
#[derive(Clone, Default)]
pub struct InMemoryViewModels {
    factories: FxHashMap<String, ViewModelFactory>,
}

impl InMemoryViewModels {
    pub fn new() -> Self {
        InMemoryViewModels::default()
    }

    pub fn with(mut self, name: impl Into<String>, factory: impl Fn(&Value) -> RenderResult + 'static) -> Self {
        self.insert(name, factory);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, factory: impl Fn(&Value) -> RenderResult + 'static) {
        self.factories.insert(name.into(), Rc::new(factory));
    }
}

impl ViewModelLoader for InMemoryViewModels {
    fn load_view_model(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<Option<ViewModelFactory>>> {
        future::ready(Ok(self.factories.get(name).cloned())).boxed_local()
    }
}

/// Localized strings tables registered by template name.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStrings {
    tables: FxHashMap<String, Value>,
}

impl InMemoryStrings {
    pub fn new() -> Self {
        InMemoryStrings::default()
    }

    pub fn with(mut self, name: impl Into<String>, strings: impl Into<Value>) -> Self {
        self.tables.insert(name.into(), strings.into());
        self
    }
}

impl StringsLoader for InMemoryStrings {
    fn load_strings(&self, name: &str, _ctx: &Value) -> LocalBoxFuture<'static, LoadResult<Value>> {
        let strings = self.tables.get(name).cloned().unwrap_or_else(|| {
            warn!("no strings table for {}", name);
            Value::Null
        });
        future::ready(Ok(strings)).boxed_local()
    }
}

/// Completes a callback-style load. Must be called at most once; dropping
/// it without calling fails the load.
pub type Completion<T> = Box<dyn FnOnce(LoadResult<T>)>;

fn completion<T: 'static>(what: &'static str) -> (Completion<T>, LocalBoxFuture<'static, LoadResult<T>>) {
    let (sender, receiver) = oneshot::channel();
    let complete: Completion<T> = Box::new(move |result| {
        // The engine may have stopped waiting
        let _ = sender.send(result);
    });
    let pending = async move {
        receiver
            .await
            .unwrap_or_else(|_| Err(LoadError::Host(format!("The {} never completed", what))))
    }
    .boxed_local();
    (complete, pending)
}

/// Adapts callback-style host functions to the loader traits.
///
/// ```ignore
/// let loader = Callback(|name: &str, done: Completion<String>| {
///     fetch_source(name, move |source| done(Ok(source)));
/// });
/// ```
pub struct Callback<F>(pub F);

impl<F> SourceLoader for Callback<F>
where
    F: Fn(&str, Completion<String>),
{
    fn load_source(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<String>> {
        let (complete, pending) = completion("source loader");
        (self.0)(name, complete);
        pending
    }
}

impl<F> ViewModelLoader for Callback<F>
where
    F: Fn(&str, Completion<Option<ViewModelFactory>>),
{
    fn load_view_model(&self, name: &str) -> LocalBoxFuture<'static, LoadResult<Option<ViewModelFactory>>> {
        let (complete, pending) = completion("view-model loader");
        (self.0)(name, complete);
        pending
    }
}

impl<F> StringsLoader for Callback<F>
where
    F: Fn(&str, &Value, Completion<Value>),
{
    fn load_strings(&self, name: &str, ctx: &Value) -> LocalBoxFuture<'static, LoadResult<Value>> {
        let (complete, pending) = completion("strings loader");
        (self.0)(name, ctx, complete);
        pending
    }
}
