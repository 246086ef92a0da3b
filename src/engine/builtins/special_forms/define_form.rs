use crate::engine::env::{Environment, Namespace};
use crate::engine::eval::{LispError, eval as main_eval};
use crate::engine::special_forms as special_form_constants;
use crate::engine::symbol::Symbol;
use crate::engine::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// Rejects function and macro bindings that special forms would always shadow.
pub(crate) fn check_not_reserved(name: Symbol) -> Result<(), LispError> {
    if special_form_constants::is_special_form(name.as_str()) {
        debug!(attempted_keyword = %name, "Attempted to bind a reserved keyword");
        return Err(LispError::ReservedKeyword(name.to_string()));
    }
    Ok(())
}

/// `(define name value-expr)`. Functions land in the function namespace,
/// macros in the macro namespace, everything else is a variable. Always binds
/// in the current scope and returns `name`.
#[instrument(level = "trace", skip(args, env), ret, err(level = "debug"))]
pub fn eval_define(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    trace!("Executing 'define' special form");
    let [name_expr, value_expr] = args else {
        debug!(count = args.len(), "'define' called with wrong number of operands");
        return Err(LispError::ArityMismatch(format!(
            "'define' expects 2 arguments, got {}",
            args.len()
        )));
    };

    let name = name_expr.expect_symbol()?;
    let value = main_eval(value_expr, Rc::clone(&env))?;
    let namespace = match value {
        Value::Function(_) => Namespace::Function,
        Value::Macro(_) => Namespace::Macro,
        _ => Namespace::Variable,
    };
    if namespace != Namespace::Variable {
        check_not_reserved(name)?;
    }

    debug!(name = %name, %namespace, "'define' binding");
    env.borrow_mut().bind(name, value, namespace);
    Ok(Value::Symbol(name))
}
