use crate::harness::{function, map, Fixture};

use compiler::{
    CompileOptions, DefaultEscape, Deferred, Engine, EngineOptions, Error, FileLoader, InMemoryLoader, ProgramCache,
    RenderError, Value,
};
use futures::executor::block_on;
use futures::FutureExt;
use insta::assert_json_snapshot;
use serde_json::json;

use std::fs;

#[test]
fn syntax_errors_name_the_template() {
    let engine = Engine::default()
        .with_program_cache(ProgramCache::new())
        .with_source_loader(InMemoryLoader::new().with("dupes", "{def a 1}\n{def a 2}"));
    let err = match block_on(engine.load_template("dupes")) {
        Err(Error::Syntax(err)) => err,
        other => panic!("expected a syntax error, got {:?}", other),
    };
    assert_eq!(err.to_string(), "`a` is already defined in this scope [dupes:2:6]");
    assert_json_snapshot!(err, @r###"
    {
      "message": "`a` is already defined in this scope",
      "expected": "a name not yet bound in this scope",
      "found": "`a`",
      "location": {
        "line": 2,
        "column": 6
      },
      "template": "dupes"
    }
    "###);
}

#[test]
fn missing_includes_fail_the_render() {
    let err = Fixture::new("before {include \"subcomponents/nope\"} after")
        .try_render()
        .unwrap_err();
    match err {
        Error::Render(RenderError::Include { template, message }) => {
            assert_eq!(template, "subcomponents/nope");
            assert_eq!(message, "Template `subcomponents/nope` was not found");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn helper_failures_surface() {
    let err = Fixture::new("{data::boom}")
        .data(map([("boom", function(|_| Err(RenderError::helper("boom", "exploded"))))]))
        .try_render()
        .unwrap_err();
    assert!(matches!(err, Error::Render(RenderError::Helper { .. })));
}

#[test]
fn deferred_writes_keep_source_order() {
    let (first_sender, first) = Deferred::channel();
    let (second_sender, second) = Deferred::channel();
    let (engine, data) = Fixture::new("[{viewmodel::first}|{viewmodel::second}]")
        .view_model(move |_| {
            let first = first.clone();
            let second = second.clone();
            Ok(map([
                ("first", function(move |_| Ok(Value::Deferred(first.clone())))),
                ("second", function(move |_| Ok(Value::Deferred(second.clone())))),
            ]))
        })
        .engine();
    let mut output = Box::pin(engine.render_template("fixture", data, Value::Null));
    assert!((&mut output).now_or_never().is_none());

    // The second write resolves first
    second_sender.send(Ok(Value::from("<2>"))).unwrap();
    assert!((&mut output).now_or_never().is_none());
    first_sender.send(Ok(Value::from("<1>"))).unwrap();
    // Deferred values are written as they resolve, without escaping
    assert_eq!(block_on(output).unwrap(), "[<1>|<2>]");
}

#[test]
fn engine_options_apply_to_every_template() {
    let options: EngineOptions = serde_json::from_value(json!({
        "compilerOptions": {"keepWhitespace": true, "defaultEscape": false}
    }))
    .unwrap();
    assert_eq!(
        options.compile,
        CompileOptions {
            keep_whitespace: true,
            default_escape: DefaultEscape::Disabled,
        }
    );
    let engine = Engine::new(options)
        .with_program_cache(ProgramCache::new())
        .with_source_loader(InMemoryLoader::new().with("raw", "<p>\n  {data::html}\n</p>"));
    let output = block_on(engine.render_template("raw", Value::from(json!({"html": "<b>"})), Value::Null));
    assert_eq!(output.unwrap(), "<p>\n  <b>\n</p>");
}

#[test]
fn default_escape_comes_from_the_compile_options() {
    let render_with = |options: serde_json::Value| {
        let options: EngineOptions = serde_json::from_value(json!({ "compilerOptions": options })).unwrap();
        let engine = Engine::new(options)
            .with_source_loader(InMemoryLoader::new().with("script", "<script>var s = '{data::s}';</script>"));
        block_on(engine.render_template("script", Value::from(json!({"s": "it's </b>"})), Value::Null)).unwrap()
    };
    assert_eq!(
        render_with(json!({"defaultEscape": "escapeJs"})),
        r"<script>var s = 'it\'s <\/b>';</script>"
    );
    assert_eq!(render_with(json!({"defaultEscape": false})), "<script>var s = 'it's </b>';</script>");
    assert_eq!(render_with(json!({})), "<script>var s = 'it&#39;s &lt;/b&gt;';</script>");
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let nested = |depth: usize| format!("{}true{}", "{not ".repeat(depth), "}".repeat(depth));
    let sources = [("shallow", nested(100)), ("deep", nested(1000))];
    let engine = Engine::default().with_source_loader(sources.into_iter().collect::<InMemoryLoader>());
    assert_eq!(block_on(engine.render_template("shallow", Value::Null, Value::Null)).unwrap(), "true");
    match block_on(engine.render_template("deep", Value::Null, Value::Null)) {
        Err(Error::Syntax(err)) => assert_eq!(err.message, "Nesting exceeds 128 levels"),
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn render_context_reaches_includes() {
    let engine = Engine::default()
        .with_program_cache(ProgramCache::new())
        .with_source_loader(
            InMemoryLoader::new()
                .with("page", "{ctx::locale}/{include \"part\"}")
                .with("part", "{ctx::locale}"),
        );
    let ctx = Value::from(json!({"locale": "sv-SE"}));
    assert_eq!(block_on(engine.render_template("page", Value::Null, ctx)).unwrap(), "sv-SE/sv-SE");
}

#[test]
fn templates_load_from_disk() {
    let root = std::env::temp_dir().join(format!("ltml-tests-{}", std::process::id()));
    fs::create_dir_all(root.join("partials")).unwrap();
    fs::write(root.join("page.ltml"), "<main>{include \"partials/nav\" data::.}</main>").unwrap();
    fs::write(root.join("partials/nav.ltml"), "<nav>{data::title}</nav>").unwrap();

    let engine = Engine::default()
        .with_program_cache(ProgramCache::new())
        .with_source_loader(FileLoader::new(&root));
    let output = block_on(engine.render_template("page", Value::from(json!({"title": "Home & Away"})), Value::Null));
    fs::remove_dir_all(&root).unwrap();
    assert_eq!(output.unwrap(), "<main><nav>Home &amp; Away</nav></main>");
}
