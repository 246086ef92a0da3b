// This module is only compiled when running tests
#![cfg(test)]

use crate::engine::env::Environment;
use crate::engine::eval::{LispError, eval};
use crate::engine::parser::parse_program;
use crate::engine::value::Value;
use crate::logging::init_test_logging;
use std::cell::RefCell;
use std::rc::Rc;

fn read_all(source: &str) -> Vec<Value> {
    parse_program(source).unwrap_or_else(|e| panic!("Test parse error for '{}': {}", source, e))
}

/// Reads a single form. Panics on malformed test input.
pub fn read(source: &str) -> Value {
    let mut forms = read_all(source);
    assert_eq!(forms.len(), 1, "Expected exactly one form in '{}'", source);
    forms.remove(0)
}

/// Evaluates every form of `source` in a fresh global environment and
/// returns the last value.
pub fn run(source: &str) -> Result<Value, LispError> {
    run_in(source, Environment::new_global())
}

/// Like `run`, but in the given environment so definitions persist.
pub fn run_in(source: &str, env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    init_test_logging();
    let mut result = Value::Nil;
    for form in read_all(source) {
        result = eval(&form, Rc::clone(&env))?;
    }
    Ok(result)
}
