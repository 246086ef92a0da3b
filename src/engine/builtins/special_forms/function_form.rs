use crate::engine::env::Environment;
use crate::engine::eval::{LispError, eval as main_eval, resolve_function};
use crate::engine::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// `(function name)` or `#'name`: reads the function namespace.
/// A non-symbol operand such as a lambda form is evaluated instead.
#[instrument(level = "trace", skip(args, env), ret, err(level = "debug"))]
pub fn eval_function(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    trace!("Executing 'function' special form");
    let [target] = args else {
        debug!(count = args.len(), "'function' called with wrong number of operands");
        return Err(LispError::ArityMismatch(format!(
            "'function' expects 1 argument, got {}",
            args.len()
        )));
    };

    match target {
        Value::Symbol(name) => resolve_function(*name, &env)
            .ok_or_else(|| LispError::UnboundFunction(name.to_string())),
        other => match main_eval(other, env)? {
            function @ Value::Function(_) => Ok(function),
            value => Err(LispError::TypeMismatch {
                expected: "function".to_string(),
                found: value.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::env::Environment;
    use crate::engine::eval::LispError;
    use crate::engine::value::Value;
    use crate::logging::init_test_logging;
    use crate::test_utils::{read, run, run_in};
    use std::rc::Rc;

    #[test]
    fn eval_function_builtin() {
        init_test_logging();
        assert!(matches!(run("(function car)"), Ok(Value::Function(_))));
        assert!(matches!(run("#'car"), Ok(Value::Function(_))));
    }

    #[test]
    fn eval_function_user_definition() {
        init_test_logging();
        let env = Environment::new_global();
        run_in("(define twice (lambda (x) (* 2 x)))", Rc::clone(&env)).unwrap();
        assert_eq!(run_in("(funcall #'twice 21)", env), Ok(Value::Integer(42)));
    }

    #[test]
    fn eval_function_ignores_variable_namespace() {
        init_test_logging();
        let env = Environment::new_global();
        run_in("(define v (list 1))", Rc::clone(&env)).unwrap();
        assert_eq!(
            run_in("#'v", env),
            Err(LispError::UnboundFunction("v".to_string()))
        );
    }

    #[test]
    fn eval_function_of_lambda() {
        init_test_logging();
        assert_eq!(
            run("(funcall (function (lambda (x) (list x x))) 1)"),
            Ok(read("(1 1)"))
        );
    }

    #[test]
    fn eval_function_rejects_non_function_expression() {
        init_test_logging();
        assert_eq!(
            run("(function (quote a))"),
            Err(LispError::TypeMismatch {
                expected: "function".to_string(),
                found: "a".to_string(),
            })
        );
    }

    #[test]
    fn eval_function_arity_error() {
        init_test_logging();
        assert!(matches!(run("(function)"), Err(LispError::ArityMismatch(_))));
    }
}
