use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};

use canvas_lang::ast::Program;
use canvas_lang::builtins;
use canvas_lang::engine::Engine;

/// Runs a canvas program given as a JSON AST file (the parser's output),
/// or from stdin when no path is given.
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next();
    if args.next().is_some() {
        bail!("Only one input file is supported");
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let program: Program = serde_json::from_str(&source).context("Parsing AST JSON")?;

    let mut engine = Engine::new();
    engine.push_frame("builtins");
    let output = builtins::output_buffer();
    builtins::register_standard(&mut engine, &output)?;

    engine.run(&program)?;

    let output = output.borrow().join("\n");
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
