use crate::engine::builtins;
use crate::engine::builtins::special_forms;
use crate::engine::env::{Environment, Namespace};
use crate::engine::list;
use crate::engine::procedure::{Closure, Procedure};
use crate::engine::special_forms as special_form_constants;
use crate::engine::symbol::Symbol;
use crate::engine::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Default limit on nested `eval` calls per thread.
pub const DEFAULT_MAX_DEPTH: usize = 8192;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LispError {
    #[error("Unbound symbol: {0}")]
    UnboundSymbol(String),
    #[error("Unbound function: {0}")]
    UnboundFunction(String),
    #[error("Arity mismatch: {0}")]
    ArityMismatch(String),
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("Cannot bind reserved keyword: {0}")]
    ReservedKeyword(String),
    #[error("Division by zero: {0}")]
    DivisionByZero(String),
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
    #[error("Evaluation depth limit of {0} exceeded")]
    DepthExceeded(usize),
}

thread_local! {
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
    static MAX_EVAL_DEPTH: Cell<usize> = const { Cell::new(DEFAULT_MAX_DEPTH) };
}

/// Sets the nesting limit for evaluations on the current thread.
pub fn set_max_depth(limit: usize) {
    debug!(limit, "Setting maximum evaluation depth");
    MAX_EVAL_DEPTH.with(|max| max.set(limit));
}

pub fn max_depth() -> usize {
    MAX_EVAL_DEPTH.with(Cell::get)
}

/// Counts one level of `eval` nesting for as long as it is alive.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<DepthGuard, LispError> {
        let limit = max_depth();
        let depth = EVAL_DEPTH.with(|depth| depth.get());
        if depth >= limit {
            debug!(limit, "Evaluation depth limit reached");
            return Err(LispError::DepthExceeded(limit));
        }
        EVAL_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// What an operator symbol resolved to.
#[derive(Debug, Clone)]
pub enum Operator {
    Function(Value),
    Macro(Value),
}

#[instrument(level = "trace", skip(expr, env), fields(expr = %expr), ret, err(level = "debug"))]
pub fn eval(expr: &Value, env: Rc<RefCell<Environment>>) -> Result<Value, LispError> {
    let _depth = DepthGuard::enter()?;
    match expr {
        Value::Nil
        | Value::Integer(_)
        | Value::Float(_)
        | Value::Character(_)
        | Value::String(_)
        | Value::Array(_)
        | Value::Function(_)
        | Value::Macro(_) => Ok(expr.clone()), // These evaluate to themselves
        Value::Symbol(name) => env.borrow().lookup(*name, Namespace::Variable),
        Value::Cons(cell) => {
            let operands = cell.cdr.to_vec().map_err(|_| LispError::TypeMismatch {
                expected: "proper argument list".to_string(),
                found: expr.to_string(),
            })?;
            match &cell.car {
                Value::Symbol(name) => eval_named_form(*name, operands, env),
                head => {
                    trace!(%head, "Operator is not a symbol, evaluating it");
                    match eval(head, Rc::clone(&env))? {
                        Value::Macro(procedure) => expand_and_eval(&procedure, operands, env),
                        callee => {
                            let args = eval_arguments(&operands, &env)?;
                            invoke(&callee, args)
                        }
                    }
                }
            }
        }
    }
}

// Resolution order for a symbol in operator position:
//   1. special forms (never shadowed)
//   2. user functions, 3. user macros
//   4. builtin functions, 5. builtin macros
fn eval_named_form(
    name: Symbol,
    operands: Vec<Value>,
    env: Rc<RefCell<Environment>>,
) -> Result<Value, LispError> {
    if let Some(result) = eval_special_form(name, &operands, &env) {
        return result;
    }
    match resolve_operator(name, &env) {
        Some(Operator::Function(callee)) => {
            let args = eval_arguments(&operands, &env)?;
            invoke(&callee, args)
        }
        Some(Operator::Macro(Value::Macro(procedure))) => {
            expand_and_eval(&procedure, operands, env)
        }
        Some(Operator::Macro(other)) => Err(LispError::TypeMismatch {
            expected: "macro".to_string(),
            found: other.to_string(),
        }),
        None => {
            debug!(name = %name, "Operator is not bound in any namespace");
            Err(LispError::UnboundFunction(name.to_string()))
        }
    }
}

fn eval_special_form(
    name: Symbol,
    operands: &[Value],
    env: &Rc<RefCell<Environment>>,
) -> Option<Result<Value, LispError>> {
    let result = match name.as_str() {
        special_form_constants::QUOTE => special_forms::eval_quote(operands),
        special_form_constants::IF => special_forms::eval_if(operands, Rc::clone(env)),
        special_form_constants::APPLY => special_forms::eval_apply(operands, Rc::clone(env)),
        special_form_constants::LAMBDA => special_forms::eval_lambda(operands, Rc::clone(env)),
        special_form_constants::DEFINE => special_forms::eval_define(operands, Rc::clone(env)),
        special_form_constants::FUNCTION => {
            special_forms::eval_function(operands, Rc::clone(env))
        }
        special_form_constants::MACRO => special_forms::eval_macro(operands, Rc::clone(env)),
        special_form_constants::DEFINE_MACRO => {
            special_forms::eval_define_macro(operands, Rc::clone(env))
        }
        _ => return None,
    };
    Some(result)
}

/// Resolves `name` through the user tables and then the builtin registry.
pub fn resolve_operator(name: Symbol, env: &Rc<RefCell<Environment>>) -> Option<Operator> {
    {
        let scope = env.borrow();
        if let Some(function) = scope.get(name, Namespace::Function) {
            return Some(Operator::Function(function));
        }
        if let Some(mac) = scope.get(name, Namespace::Macro) {
            return Some(Operator::Macro(mac));
        }
    }
    if let Some(function) = builtins::lookup_function(name) {
        return Some(Operator::Function(function));
    }
    builtins::lookup_macro(name).map(Operator::Macro)
}

/// Resolves `name` in the function namespace only: user functions first,
/// then builtin functions.
pub fn resolve_function(name: Symbol, env: &Rc<RefCell<Environment>>) -> Option<Value> {
    let user = env.borrow().get(name, Namespace::Function);
    user.or_else(|| builtins::lookup_function(name))
}

/// Evaluates arguments left to right.
fn eval_arguments(
    operands: &[Value],
    env: &Rc<RefCell<Environment>>,
) -> Result<Vec<Value>, LispError> {
    operands
        .iter()
        .map(|operand| eval(operand, Rc::clone(env)))
        .collect()
}

/// Applies a function value to already-evaluated arguments.
pub fn invoke(callee: &Value, args: Vec<Value>) -> Result<Value, LispError> {
    match callee {
        Value::Function(procedure) => call_procedure(procedure, args),
        other => Err(LispError::TypeMismatch {
            expected: "function".to_string(),
            found: other.to_string(),
        }),
    }
}

/// Runs a macro's procedure on the raw forms, then evaluates the expansion in
/// the caller's environment.
fn expand_and_eval(
    procedure: &Procedure,
    forms: Vec<Value>,
    env: Rc<RefCell<Environment>>,
) -> Result<Value, LispError> {
    let expansion = call_procedure(procedure, forms)?;
    debug!(%expansion, "Macro expanded");
    eval(&expansion, env)
}

fn call_procedure(procedure: &Procedure, args: Vec<Value>) -> Result<Value, LispError> {
    match procedure {
        Procedure::Native(native) => {
            trace!(name = native.name, "Calling native procedure");
            (native.func)(args)
        }
        Procedure::Closure(closure) => call_closure(closure, args),
    }
}

fn call_closure(closure: &Closure, mut args: Vec<Value>) -> Result<Value, LispError> {
    let params = &closure.params;
    if !params.accepts(args.len()) {
        return Err(LispError::ArityMismatch(format!(
            "expected {}{} arguments for parameters {}, got {}",
            if params.rest.is_some() { "at least " } else { "" },
            params.arity,
            params.required,
            args.len()
        )));
    }

    let rest_args = args.split_off(params.arity);
    let mut bindings = Vec::with_capacity(params.arity + 1);
    list::map2(&params.required, &Value::list(args), |param, arg| {
        bindings.push((param.expect_symbol()?, arg.clone()));
        Ok(Value::Nil)
    })?;
    if let Some(rest) = params.rest {
        bindings.push((rest, Value::list(rest_args)));
    }
    let call_env = Environment::extend(Rc::clone(&closure.env), bindings);

    if closure.body.is_nil() {
        return Ok(Value::Nil);
    }
    let results = list::map(&closure.body, |form| eval(form, Rc::clone(&call_env)))?;
    list::last(&results)
}
