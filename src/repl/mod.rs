pub mod highlighter;
pub mod history;

use crate::engine::env::Environment;
use highlighter::ReplHelper;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

/// True for the inputs that end the session.
fn is_exit_command(input: &str) -> bool {
    input == ".exit" || input == "(exit)"
}

#[tracing::instrument(skip(env))]
pub fn start_repl(env: Rc<RefCell<Environment>>) -> anyhow::Result<()> {
    info!("Starting REPL session with rustyline");
    let mut rl = Editor::<ReplHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(ReplHelper::new()));
    let mut line_number = 1;

    let history_path = history::get_history_path();
    match &history_path {
        Some(path) => history::load_history_from_path(&mut rl, path),
        None => warn!("Could not determine history file path. History will not be saved."),
    }

    loop {
        let prompt = format!("cisl ({})> ", line_number);
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    line_number += 1;
                    continue;
                }
                if let Err(err) = rl.add_history_entry(line.as_str()) {
                    warn!("Failed to add line to history: {}", err);
                }

                if is_exit_command(trimmed_input) {
                    info!("Exiting REPL session via user command.");
                    println!("Exiting.");
                    break;
                }

                match crate::evaluate_source(trimmed_input, Rc::clone(&env), "repl") {
                    Ok(Some(result)) => println!("{}", result),
                    Ok(None) => {} // Only comments
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                info!("REPL interrupted (Ctrl-C).");
                println!("Interrupted. Type .exit, (exit), or Ctrl-D to exit.");
            }
            Err(ReadlineError::Eof) => {
                info!("REPL EOF detected (Ctrl-D).");
                println!("Exiting.");
                break;
            }
            Err(err) => {
                eprintln!("REPL Readline Error: {:?}", err);
                break;
            }
        }
        line_number += 1;
    }

    if let Some(path) = &history_path {
        history::save_history_to_path(&mut rl, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::Value;
    use crate::logging::init_test_logging;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command(".exit"));
        assert!(is_exit_command("(exit)"));
        assert!(!is_exit_command("exit"));
    }

    #[test]
    fn definitions_persist_between_lines() {
        init_test_logging();
        let env = Environment::new_global();
        crate::evaluate_source("(define sq (lambda (x) (* x x)))", Rc::clone(&env), "repl")
            .unwrap();
        let result = crate::evaluate_source("(sq 7)", Rc::clone(&env), "repl").unwrap();
        assert_eq!(result, Some(Value::Integer(49)));
    }

    #[test]
    fn comment_only_line_has_no_value() {
        init_test_logging();
        let env = Environment::new_global();
        assert_eq!(
            crate::evaluate_source("; nothing here", env, "repl").unwrap(),
            None
        );
    }

    #[test]
    fn errors_carry_the_evaluation_cause() {
        init_test_logging();
        let env = Environment::new_global();
        let err = crate::evaluate_source("(car 1)", env, "repl").unwrap_err();
        assert!(format!("{:#}", err).contains("Type mismatch"));
    }
}
