use compiler::{
    Engine, Error, Function, InMemoryLoader, InMemoryStrings, InMemoryViewModels, Map, ProgramCache, RenderResult,
    Value,
};
use futures::executor::block_on;
use log::debug;

/// Templates every fixture can include.
pub const SUBCOMPONENTS: &[(&str, &str)] = &[
    ("subcomponents/basic", "{data::should} {data::show}"),
    ("subcomponents/plain", "Plain"),
    (
        "subcomponents/ui-components-colors",
        r#"{{fn (renderColor renderColors)
    <div className="colors">
        Hello {data::name}
        {renderColors data::colors renderColor}
    </div>
}
    {fn (color)
        <li className="color" style="background-color: {color}">
            {color}
        </li>
    }

    {fn (colors renderColor)
        {if {isNotEmpty colors} {fn
            <ul>{each colors renderColor}</ul>
        } {fn
            <div>No colors!</div>
        }}
   }
}"#,
    ),
];

const NAME: &str = "fixture";

pub fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let map: Map = entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Value::from(map)
}

pub fn function(f: impl Fn(&[Value]) -> RenderResult + 'static) -> Value {
    Value::Function(Function::new(f))
}

fn reverse(args: &[Value]) -> RenderResult {
    let text = args.first().map(ToString::to_string).unwrap_or_default();
    Ok(Value::from(text.chars().rev().collect::<String>()))
}

/// One template plus everything it renders with.
pub struct Fixture {
    source: &'static str,
    data: Value,
    view_model: Option<Box<dyn Fn(&Value) -> RenderResult>>,
    strings: Option<Value>,
}

impl Fixture {
    pub fn new(source: &'static str) -> Fixture {
        Fixture {
            source,
            data: Value::Null,
            view_model: None,
            strings: None,
        }
    }

    pub fn data(mut self, data: impl Into<Value>) -> Fixture {
        self.data = data.into();
        self
    }

    pub fn view_model(mut self, factory: impl Fn(&Value) -> RenderResult + 'static) -> Fixture {
        self.view_model = Some(Box::new(factory));
        self
    }

    pub fn strings(mut self, strings: impl Into<Value>) -> Fixture {
        self.strings = Some(strings.into());
        self
    }

    /// An engine with a private program cache, the subcomponents and a
    /// `reverse` helper.
    pub fn engine(self) -> (Engine, Value) {
        let loader: InMemoryLoader = SUBCOMPONENTS
            .iter()
            .copied()
            .chain(std::iter::once((NAME, self.source)))
            .collect();
        let mut engine = Engine::default()
            .with_program_cache(ProgramCache::new())
            .with_source_loader(loader);
        if let Some(factory) = self.view_model {
            engine = engine.with_view_model_loader(InMemoryViewModels::new().with(NAME, factory));
        }
        if let Some(strings) = self.strings {
            engine = engine.with_strings_loader(InMemoryStrings::new().with(NAME, strings));
        }
        engine.add_helper("reverse", reverse);
        (engine, self.data)
    }

    pub fn try_render(self) -> Result<String, Error> {
        let (engine, data) = self.engine();
        let output = block_on(engine.render_template(NAME, data, Value::Null));
        debug!("{:?}", output);
        output
    }

    pub fn render(self) -> String {
        match self.try_render() {
            Ok(output) => output,
            Err(err) => panic!("render failed: {}", err),
        }
    }
}

pub fn render(source: &'static str) -> String {
    Fixture::new(source).render()
}
