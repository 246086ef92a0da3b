use crate::engine::env::Environment;
use crate::engine::eval::LispError;
use crate::engine::procedure::{Closure, ParamList};
use crate::engine::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// Builds the closure shared by `lambda` and `macro`: a parameter pattern,
/// the body forms, and a shared handle to the defining environment.
pub fn make_closure(
    form_name: &str,
    args: &[Value],
    env: Rc<RefCell<Environment>>,
) -> Result<Closure, LispError> {
    let Some((params_expr, body)) = args.split_first() else {
        debug!(form = form_name, "Missing parameter list");
        return Err(LispError::ArityMismatch(format!(
            "'{}' expects a parameter list and a body, got no arguments",
            form_name
        )));
    };

    let params = ParamList::parse(params_expr)?;
    let body = Value::list(body.to_vec());
    debug!(form = form_name, parameters = %params.required, rest = ?params.rest, %body, "Creating closure");
    Ok(Closure { params, body, env })
}

#[instrument(level = "trace", skip(args, env), err(level = "debug"))]
pub fn eval_lambda(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    trace!("Executing 'lambda' special form");
    let closure = make_closure("lambda", args, env)?;
    Ok(Value::Function(Rc::new(closure.into())))
}

#[cfg(test)]
mod tests {
    use crate::engine::env::{Environment, Namespace};
    use crate::engine::eval::{LispError, eval, invoke};
    use crate::engine::procedure::Procedure;
    use crate::engine::symbol::Symbol;
    use crate::engine::value::Value;
    use crate::logging::init_test_logging;
    use crate::test_utils::{read, run};
    use std::rc::Rc;

    #[test]
    fn eval_lambda_creates_closure() {
        init_test_logging();
        let env = Environment::new_global();
        let result = eval(&read("(lambda (x y) x)"), Rc::clone(&env));

        match result {
            Ok(Value::Function(procedure)) => match procedure.as_ref() {
                Procedure::Closure(closure) => {
                    assert_eq!(closure.params.required, read("(x y)"));
                    assert_eq!(closure.params.rest, None);
                    assert_eq!(closure.body, read("(x)"));
                    assert!(Rc::ptr_eq(&closure.env, &env));
                }
                other => panic!("Expected closure, got {:?}", other),
            },
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn eval_lambda_with_rest_parameter() {
        init_test_logging();
        match run("(lambda (a &rest more) more)") {
            Ok(Value::Function(procedure)) => match procedure.as_ref() {
                Procedure::Closure(closure) => {
                    assert_eq!(closure.params.arity, 1);
                    assert_eq!(closure.params.rest, Some(Symbol::new("more")));
                }
                other => panic!("Expected closure, got {:?}", other),
            },
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn eval_lambda_empty_params() {
        init_test_logging();
        assert_eq!(run("((lambda () 10))"), Ok(Value::Integer(10)));
        assert_eq!(run("((lambda nil 10))"), Ok(Value::Integer(10)));
    }

    #[test]
    fn eval_lambda_renders_as_function() {
        init_test_logging();
        assert_eq!(run("(lambda (x) x)").unwrap().to_string(), "#<FUNCTION>");
    }

    #[test]
    fn eval_lambda_missing_params() {
        init_test_logging();
        assert!(matches!(run("(lambda)"), Err(LispError::ArityMismatch(_))));
    }

    #[test]
    fn eval_lambda_params_not_a_list() {
        init_test_logging();
        assert_eq!(
            run("(lambda x x)"),
            Err(LispError::TypeMismatch {
                expected: "proper list".to_string(),
                found: "x".to_string(),
            })
        );
    }

    #[test]
    fn eval_lambda_param_list_contains_non_symbol() {
        init_test_logging();
        assert_eq!(
            run("(lambda (x 10) x)"),
            Err(LispError::TypeMismatch {
                expected: "symbol".to_string(),
                found: "10".to_string(),
            })
        );
    }

    #[test]
    fn returned_closure_owns_its_call_scope() {
        init_test_logging();
        let adder = run("((lambda (n) (lambda (x) (+ x n))) 5)").unwrap();
        match &adder {
            Value::Function(procedure) => match procedure.as_ref() {
                Procedure::Closure(closure) => {
                    assert_eq!(Rc::strong_count(&closure.env), 1);
                    assert_eq!(
                        closure.env.borrow().get(Symbol::new("n"), Namespace::Variable),
                        Some(Value::Integer(5))
                    );
                }
                other => panic!("Expected closure, got {:?}", other),
            },
            other => panic!("Expected function, got {:?}", other),
        }
        assert_eq!(
            invoke(&adder, vec![Value::Integer(3)]),
            Ok(Value::Integer(8))
        );
    }
}
