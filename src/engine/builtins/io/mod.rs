use crate::engine::eval::LispError;
use crate::engine::value::{NativeFn, Value};
use std::io::Write;
use tracing::{instrument, trace, warn};

pub const FUNCTIONS: &[(&str, NativeFn)] = &[("print", native_print), ("display", native_display)];

fn single_arg(args: Vec<Value>, name: &str) -> Result<Value, LispError> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(LispError::ArityMismatch(format!(
            "'{}' expects 1 argument, got {}",
            name, count
        ))),
    }
}

/// Text written by `display`: strings and characters without reader syntax.
fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.to_string(),
        Value::Character(c) => c.to_string(),
        other => other.to_string(),
    }
}

fn write_stdout(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        warn!(error = %e, "Failed to write to stdout");
    }
}

/// `(print value)`: the rendering plus a newline. Returns `value`.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_print(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native 'print' function");
    let value = single_arg(args, "print")?;
    write_stdout(&format!("{}\n", value));
    Ok(value)
}

/// `(display value)`: like `print` but strings and characters are written
/// raw and no newline is added.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_display(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native 'display' function");
    let value = single_arg(args, "display")?;
    write_stdout(&display_text(&value));
    Ok(value)
}
