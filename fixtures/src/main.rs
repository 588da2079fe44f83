use clap::{Parser, ValueEnum};
use compiler::{CompileOptions, DefaultEscape, Engine, EngineOptions, Error, FileLoader, SourceLoader, Value};
use futures::executor::block_on;
use log::{debug, error};

use std::fs;
use std::path::PathBuf;
use std::process;

/// Render a template from a directory, or print its compiled program.
#[derive(Debug, Parser)]
#[command(name = "fixtures")]
struct Args {
    /// Engine options as JSON, the same shape hosts pass to the engine
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
    #[arg(long)]
    keep_whitespace: bool,
    /// An escaper name such as `escapeJs`, or `false` to disable escaping
    #[arg(long, value_name = "NAME", value_parser = parse_escape)]
    default_escape: Option<DefaultEscape>,
    #[arg(long, value_enum)]
    emit: Option<Emit>,
    /// Directory templates are loaded from
    root: PathBuf,
    /// Template name, relative to the root and without the extension
    name: String,
    /// JSON file passed as `data`
    data: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum Emit {
    Ir,
}

fn parse_escape(escape: &str) -> Result<DefaultEscape, String> {
    match escape {
        "" => Err("expected an escaper name or `false`".to_string()),
        "false" => Ok(DefaultEscape::Disabled),
        name => Ok(DefaultEscape::Named(name.to_string())),
    }
}

fn engine_options(args: &Args) -> Result<EngineOptions, String> {
    let mut options = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|err| format!("{}: {}", path.display(), err))?;
            serde_json::from_str(&text).map_err(|err| format!("{}: {}", path.display(), err))?
        }
        None => EngineOptions::default(),
    };
    let compile: &mut CompileOptions = &mut options.compile;
    compile.keep_whitespace |= args.keep_whitespace;
    if let Some(escape) = &args.default_escape {
        compile.default_escape = escape.clone();
    }
    Ok(options)
}

fn read_data(path: Option<&PathBuf>) -> Result<Value, String> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Value::Null),
    };
    let text = fs::read_to_string(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|err| format!("{}: {}", path.display(), err))?;
    Ok(Value::from(json))
}

fn run(args: &Args) -> Result<(), String> {
    let name = &args.name;
    let options = engine_options(args)?;
    debug!("{:?}", options);
    let loader = FileLoader::new(&args.root);
    let engine = Engine::new(options).with_source_loader(loader.clone());

    if args.emit == Some(Emit::Ir) {
        let source = block_on(loader.load_source(name)).map_err(|err| err.to_string())?;
        return match engine.compile(name, &source) {
            Ok(program) => {
                let ir = serde_json::to_string_pretty(&program).map_err(|err| err.to_string())?;
                println!("{}", ir);
                Ok(())
            }
            Err(err) => {
                report_syntax_error(&loader, name, &err);
                Err(err.to_string())
            }
        };
    }

    let data = read_data(args.data.as_ref())?;
    match block_on(engine.render_template(name, data, Value::Null)) {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(Error::Syntax(err)) => {
            report_syntax_error(&loader, &err.template, &err);
            Err(err.to_string())
        }
        Err(err) => Err(err.to_string()),
    }
}

fn report_syntax_error(loader: &FileLoader, name: &str, err: &compiler::SyntaxError) {
    if let Ok(source) = block_on(loader.load_source(name)) {
        if let Err(io) = err.emit_to_terminal(&source) {
            error!("failed to print the diagnostic: {}", io);
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(message) = run(&args) {
        eprintln!("{}", message);
        process::exit(1);
    }
}
