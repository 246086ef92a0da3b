use super::define_form::check_not_reserved;
use super::lambda_form::make_closure;
use crate::engine::env::{Environment, Namespace};
use crate::engine::eval::{LispError, eval as main_eval};
use crate::engine::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// `(macro params body...)`: a closure whose arguments arrive unevaluated
/// and whose result is evaluated again by the caller.
#[instrument(level = "trace", skip(args, env), err(level = "debug"))]
pub fn eval_macro(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    trace!("Executing 'macro' special form");
    let closure = make_closure("macro", args, env)?;
    Ok(Value::Macro(Rc::new(closure.into())))
}

/// `(define-macro name expr)`. `expr` must evaluate to a function or a macro;
/// either way the procedure is bound as a macro.
#[instrument(level = "trace", skip(args, env), ret, err(level = "debug"))]
pub fn eval_define_macro(
    args: &[Value],
    env: Rc<RefCell<Environment>>,
) -> Result<Value, LispError> {
    trace!("Executing 'define-macro' special form");
    let [name_expr, value_expr] = args else {
        debug!(count = args.len(), "'define-macro' called with wrong number of operands");
        return Err(LispError::ArityMismatch(format!(
            "'define-macro' expects 2 arguments, got {}",
            args.len()
        )));
    };

    let name = name_expr.expect_symbol()?;
    check_not_reserved(name)?;
    let procedure = match main_eval(value_expr, Rc::clone(&env))? {
        Value::Function(procedure) | Value::Macro(procedure) => procedure,
        other => {
            return Err(LispError::TypeMismatch {
                expected: "function or macro".to_string(),
                found: other.to_string(),
            });
        }
    };

    debug!(name = %name, "Binding macro");
    env.borrow_mut()
        .bind(name, Value::Macro(procedure), Namespace::Macro);
    Ok(Value::Symbol(name))
}
