use crate::engine::env::{Environment, Namespace};
use crate::engine::eval::{LispError, eval as main_eval, invoke, resolve_function};
use crate::engine::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// `(apply fn args)`. The argument list is evaluated once and its elements
/// are passed to `fn` as they are.
#[instrument(level = "trace", skip(args, env), ret, err(level = "debug"))]
pub fn eval_apply(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    trace!("Executing 'apply' special form");
    let [fn_expr, args_expr] = args else {
        debug!(count = args.len(), "'apply' called with wrong number of operands");
        return Err(LispError::ArityMismatch(format!(
            "'apply' expects 2 arguments (function, argument list), got {}",
            args.len()
        )));
    };

    let callee = resolve_callee(fn_expr, &env)?;
    let arg_list = main_eval(args_expr, Rc::clone(&env))?;
    let values = arg_list.to_vec()?;
    debug!(%callee, count = values.len(), "Applying function");
    invoke(&callee, values)
}

fn resolve_callee(fn_expr: &Value, env: &Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    let callee = match fn_expr {
        Value::Symbol(name) => match resolve_function(*name, env) {
            Some(function) => function,
            None => env
                .borrow()
                .get(*name, Namespace::Variable)
                .ok_or_else(|| LispError::UnboundFunction(name.to_string()))?,
        },
        other => main_eval(other, Rc::clone(env))?,
    };
    match callee {
        Value::Function(_) => Ok(callee),
        other => Err(LispError::TypeMismatch {
            expected: "function".to_string(),
            found: other.to_string(),
        }),
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
    fn eval_apply_builtin_by_name() {
        init_test_logging();
        assert_eq!(run("(apply + '(1 2 3))"), Ok(Value::Integer(6)));
    }

    #[test]
    fn eval_apply_does_not_re_evaluate_arguments() {
        init_test_logging();
        assert_eq!(
            run("(apply list '(a (b c)))"),
            Ok(read("(a (b c))"))
        );
    }

    #[test]
    fn eval_apply_evaluates_argument_expression() {
        init_test_logging();
        assert_eq!(run("(apply * (list 2 3 4))"), Ok(Value::Integer(24)));
    }

    #[test]
    fn eval_apply_user_function() {
        init_test_logging();
        let env = Environment::new_global();
        run_in("(define add (lambda (a b) (+ a b)))", Rc::clone(&env)).unwrap();
        assert_eq!(run_in("(apply add '(4 5))", env), Ok(Value::Integer(9)));
    }

    #[test]
    fn eval_apply_function_held_in_variable() {
        init_test_logging();
        let env = Environment::new_global();
        run_in("(define wrap (lambda (f) (apply f '(1 2))))", Rc::clone(&env)).unwrap();
        assert_eq!(run_in("(wrap #'cons)", env), Ok(read("(1 . 2)")));
    }

    #[test]
    fn eval_apply_lambda_expression() {
        init_test_logging();
        assert_eq!(
            run("(apply (lambda (&rest xs) xs) '(1 2))"),
            Ok(read("(1 2)"))
        );
    }

    #[test]
    fn eval_apply_empty_argument_list() {
        init_test_logging();
        assert_eq!(run("(apply list nil)"), Ok(Value::Nil));
    }

    #[test]
    fn eval_apply_unknown_name() {
        init_test_logging();
        assert_eq!(
            run("(apply nope '(1))"),
            Err(LispError::UnboundFunction("nope".to_string()))
        );
    }

    #[test]
    fn eval_apply_rejects_macro() {
        init_test_logging();
        assert_eq!(
            run("(apply (macro (x) x) '(1))"),
            Err(LispError::TypeMismatch {
                expected: "function".to_string(),
                found: "#<MACRO>".to_string(),
            })
        );
    }

    #[test]
    fn eval_apply_improper_argument_list() {
        init_test_logging();
        assert!(matches!(
            run("(apply + '(1 . 2))"),
            Err(LispError::TypeMismatch { .. })
        ));
        assert!(matches!(
            run("(apply + 5)"),
            Err(LispError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn eval_apply_arity_error() {
        init_test_logging();
        assert!(matches!(run("(apply +)"), Err(LispError::ArityMismatch(_))));
    }
}
