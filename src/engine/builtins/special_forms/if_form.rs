use crate::engine::env::Environment;
use crate::engine::eval::{LispError, eval as main_eval};
use crate::engine::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// `(if test then else)`. All three operands are required.
#[instrument(level = "trace", skip(args, env), ret, err(level = "debug"))]
pub fn eval_if(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    trace!("Executing 'if' special form");
    let [test_expr, then_expr, else_expr] = args else {
        debug!(count = args.len(), "'if' called with wrong number of operands");
        return Err(LispError::ArityMismatch(format!(
            "'if' expects 3 arguments (test, then, else), got {}",
            args.len()
        )));
    };

    let test = main_eval(test_expr, Rc::clone(&env))?;
    debug!(%test, "Evaluated 'if' test");

    if test.is_truthy() {
        trace!("Test is true, evaluating then-branch");
        main_eval(then_expr, env)
    } else {
        trace!("Test is nil, evaluating else-branch");
        main_eval(else_expr, env)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::env::Environment;
    use crate::engine::eval::LispError;
    use crate::engine::value::Value;
    use crate::logging::init_test_logging;
    use crate::test_utils::{run, run_in};
    use std::rc::Rc;

    #[test]
    fn eval_if_true_condition() {
        init_test_logging();
        assert_eq!(run("(if t 10 20)"), Ok(Value::Integer(10)));
    }

    #[test]
    fn eval_if_nil_condition() {
        init_test_logging();
        assert_eq!(run("(if nil 10 20)"), Ok(Value::Integer(20)));
        assert_eq!(run("(if '() 10 20)"), Ok(Value::Integer(20)));
    }

    #[test]
    fn eval_if_truthy_values() {
        init_test_logging();
        assert_eq!(run("(if 0 10 20)"), Ok(Value::Integer(10)));
        assert_eq!(run("(if \"\" 10 20)"), Ok(Value::Integer(10)));
        assert_eq!(run("(if '(1) 10 20)"), Ok(Value::Integer(10)));
    }

    #[test]
    fn eval_if_condition_evaluates() {
        init_test_logging();
        let env = Environment::new_global();
        run_in("(define flag nil)", Rc::clone(&env)).unwrap();
        assert_eq!(run_in("(if flag 'a 'b)", env), Ok(Value::symbol("b")));
    }

    #[test]
    fn eval_if_untaken_branch_is_not_evaluated() {
        init_test_logging();
        let env = Environment::new_global();
        run_in("(define counter 0)", Rc::clone(&env)).unwrap();
        run_in("(if t nil (define counter 1))", Rc::clone(&env)).unwrap();
        assert_eq!(run_in("counter", env), Ok(Value::Integer(0)));
    }

    #[test]
    fn eval_if_two_armed_is_rejected() {
        init_test_logging();
        assert_eq!(
            run("(if t 10)"),
            Err(LispError::ArityMismatch(
                "'if' expects 3 arguments (test, then, else), got 2".to_string()
            ))
        );
    }

    #[test]
    fn eval_if_arity_error_too_many_args() {
        init_test_logging();
        assert!(matches!(
            run("(if t 10 20 30)"),
            Err(LispError::ArityMismatch(_))
        ));
    }

    #[test]
    fn eval_if_test_error_propagates() {
        init_test_logging();
        assert_eq!(
            run("(if missing 1 2)"),
            Err(LispError::UnboundSymbol("missing".to_string()))
        );
    }
}
