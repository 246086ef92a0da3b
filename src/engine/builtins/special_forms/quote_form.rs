use crate::engine::eval::LispError;
use crate::engine::value::Value;
use tracing::{debug, instrument, trace};

#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn eval_quote(args: &[Value]) -> Result<Value, LispError> {
    trace!("Executing 'quote' special form");
    if args.len() != 1 {
        debug!(count = args.len(), "'quote' called with wrong number of operands");
        return Err(LispError::ArityMismatch(format!(
            "'quote' expects 1 argument, got {}",
            args.len()
        )));
    }
    Ok(args[0].clone())
}
