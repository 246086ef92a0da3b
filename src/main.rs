mod cli;
mod engine;
mod logging;
mod repl;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use engine::env::Environment;
use engine::eval::{eval, set_max_depth};
use engine::parser::parse_program;
use engine::value::Value;
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use std::thread;
use tracing::{debug, info};

/// Evaluation recurses on the native stack, so the interpreter runs on a
/// thread with room for the configured depth limit.
const INTERPRETER_STACK_BYTES: usize = 512 * 1024 * 1024;

/// Reads every form in `source` and evaluates them in order in `env`.
/// Returns the value of the last form, or `None` if there were no forms.
#[tracing::instrument(skip(source, env))]
pub fn evaluate_source(
    source: &str,
    env: Rc<RefCell<Environment>>,
    origin: &str,
) -> Result<Option<Value>> {
    let forms = parse_program(source).with_context(|| format!("Failed to read {}", origin))?;
    debug!(count = forms.len(), "Evaluating forms");
    let mut last = None;
    for form in &forms {
        let value = eval(form, Rc::clone(&env))
            .with_context(|| format!("Failed to evaluate {} in {}", form, origin))?;
        last = Some(value);
    }
    Ok(last)
}

fn run_program(args: RunArgs, env: Rc<RefCell<Environment>>) -> Result<()> {
    let (source, origin) = match (args.expr, args.file) {
        (Some(expr), _) => (expr, "expression".to_string()),
        (None, Some(path)) => {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read file {}", path.display()))?;
            (source, path.display().to_string())
        }
        (None, None) => bail!("Either --expr or a file path is required"),
    };
    info!(%origin, "Running program");

    if let Some(value) = evaluate_source(&source, env, &origin)? {
        println!("{}", value);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    set_max_depth(cli.max_depth);
    let env = Environment::new_global();
    match cli.command {
        Commands::Run(args) => run_program(args, env),
        Commands::Repl => repl::start_repl(env),
    }
}

fn main() -> Result<()> {
    logging::init_logging();
    info!("Starting Lisp interpreter");

    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    let interpreter = thread::Builder::new()
        .name("cisl-eval".to_string())
        .stack_size(INTERPRETER_STACK_BYTES)
        .spawn(move || run(cli))
        .context("Failed to start interpreter thread")?;
    let result = interpreter
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))?;

    info!("Lisp interpreter finished");
    result
}
