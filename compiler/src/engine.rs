use crate::cache::ProgramCache;
use crate::error::Error;
use crate::loader::{SourceLoader, StringsLoader, ViewModelLoader};

use codegen::{CompileOptions, Program};
use diagnostics::SyntaxError;
use fxhash::FxHashMap;
use log::{debug, info};
use runtime::{Deferred, Function, Host, Map, RenderError, RenderResult, Template, Value};
use serde::Deserialize;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    pub cache_enabled: bool,
    #[serde(rename = "compilerOptions")]
    pub compile: CompileOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            cache_enabled: true,
            compile: CompileOptions::default(),
        }
    }
}

struct Inner {
    options: EngineOptions,
    source_loader: RefCell<Option<Rc<dyn SourceLoader>>>,
    view_model_loader: RefCell<Option<Rc<dyn ViewModelLoader>>>,
    strings_loader: RefCell<Option<Rc<dyn StringsLoader>>>,
    helpers: RefCell<Rc<Map>>,
    templates: RefCell<FxHashMap<String, Rc<Template>>>,
    programs: RefCell<ProgramCache>,
}

/// Loads, compiles and renders templates. Cheap to clone; clones share
/// loaders, helpers and caches.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<Inner>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.inner.options)
            .field("templates", &self.inner.templates.borrow().len())
            .field("programs", &*self.inner.programs.borrow())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineOptions::default())
    }
}

impl Engine {
    /// Each engine starts with a program cache of its own; pass one to
    /// [`Engine::with_program_cache`] to share compiled programs.
    pub fn new(options: EngineOptions) -> Engine {
        Engine {
            inner: Rc::new(Inner {
                options,
                source_loader: RefCell::default(),
                view_model_loader: RefCell::default(),
                strings_loader: RefCell::default(),
                helpers: RefCell::default(),
                templates: RefCell::default(),
                programs: RefCell::new(ProgramCache::new()),
            }),
        }
    }

    pub fn with_source_loader(self, loader: impl SourceLoader + 'static) -> Engine {
        *self.inner.source_loader.borrow_mut() = Some(Rc::new(loader));
        self
    }

    pub fn with_view_model_loader(self, loader: impl ViewModelLoader + 'static) -> Engine {
        *self.inner.view_model_loader.borrow_mut() = Some(Rc::new(loader));
        self
    }

    pub fn with_strings_loader(self, loader: impl StringsLoader + 'static) -> Engine {
        *self.inner.strings_loader.borrow_mut() = Some(Rc::new(loader));
        self
    }

    pub fn with_program_cache(self, programs: ProgramCache) -> Engine {
        *self.inner.programs.borrow_mut() = programs;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    /// Register a helper, reachable as `helper::name` and through
    /// unqualified lookups. Renders already running keep the helpers
    /// they started with.
    pub fn add_helper(&self, name: impl Into<String>, helper: impl Fn(&[Value]) -> RenderResult + 'static) {
        let mut helpers = self.inner.helpers.borrow_mut();
        Rc::make_mut(&mut helpers).insert(name.into(), Value::Function(Function::new(helper)));
    }

    pub fn compile(&self, name: &str, source: &str) -> std::result::Result<Program, SyntaxError> {
        info!("compiling {}", name);
        codegen::compile(name, source, &self.inner.options.compile)
    }

    /// Drop every loaded template. Compiled programs stay in the program
    /// cache.
    pub fn clear_templates(&self) {
        self.inner.templates.borrow_mut().clear();
    }

    pub async fn load_template(&self, name: &str) -> Result<Rc<Template>> {
        if name.is_empty() {
            return Err(Error::InvalidTemplateName);
        }
        let caching = self.inner.options.cache_enabled;
        if caching {
            let cached = self.inner.templates.borrow().get(name).cloned();
            if let Some(template) = cached {
                debug!("template cache hit for {}", name);
                return Ok(template);
            }
        }

        let cached = if caching {
            self.inner.programs.borrow().get(name)
        } else {
            None
        };
        let program = match cached {
            Some(program) => {
                debug!("program cache hit for {}", name);
                program
            }
            None => {
                let loader = self
                    .inner
                    .source_loader
                    .borrow()
                    .clone()
                    .ok_or(Error::MissingSourceLoader)?;
                let source = loader.load_source(name).await?;
                let program = Arc::new(self.compile(name, &source)?);
                if caching {
                    self.inner.programs.borrow().insert(program.clone());
                }
                program
            }
        };
        self.instantiate(name, program).await
    }

    /// Load a template from an already compiled program; no source loader
    /// is involved. The template takes the program's name.
    pub async fn register_program(&self, program: impl Into<Arc<Program>>) -> Result<Rc<Template>> {
        let program = program.into();
        if program.name.is_empty() {
            return Err(Error::InvalidTemplateName);
        }
        if self.inner.options.cache_enabled {
            self.inner.programs.borrow().insert(program.clone());
        }
        let name = program.name.clone();
        self.instantiate(&name, program).await
    }

    async fn instantiate(&self, name: &str, program: Arc<Program>) -> Result<Rc<Template>> {
        let loader = self.inner.view_model_loader.borrow().clone();
        let view_model = match loader {
            Some(loader) => loader.load_view_model(name).await?,
            None => None,
        };
        let template = Rc::new(Template::new(program, view_model));
        if self.inner.options.cache_enabled {
            self.inner
                .templates
                .borrow_mut()
                .insert(name.to_string(), template.clone());
        }
        Ok(template)
    }

    pub async fn render(&self, template: &Template, data: Value, ctx: Value) -> Result<String> {
        let loader = self.inner.strings_loader.borrow().clone();
        let strings = match loader {
            Some(loader) => loader.load_strings(template.name(), &ctx).await?,
            None => Value::Null,
        };
        let output = template.render(self.host(), data, strings, ctx)?;
        Ok(output.into_string().await?)
    }

    pub async fn render_template(&self, name: &str, data: Value, ctx: Value) -> Result<String> {
        let template = self.load_template(name).await?;
        self.render(&template, data, ctx).await
    }

    pub fn host(&self) -> Rc<dyn Host> {
        Rc::new(self.clone())
    }
}

impl Host for Engine {
    fn helpers(&self) -> Value {
        Value::Map(self.inner.helpers.borrow().clone())
    }

    fn render_template(&self, name: &str, data: Value, ctx: Value) -> Deferred {
        let engine = self.clone();
        let name = name.to_string();
        Deferred::new(async move {
            let result = Engine::render_template(&engine, &name, data, ctx).await;
            match result {
                Ok(output) => Ok(Value::from(output)),
                Err(Error::Render(error)) => Err(error),
                Err(error) => Err(RenderError::Include {
                    template: name,
                    message: error.to_string(),
                }),
            }
        })
    }
}
