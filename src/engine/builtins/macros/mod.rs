//! Builtin macros. Each receives its raw operands and returns a form built
//! from special forms and lambda applications; the evaluator then evaluates
//! that expansion in the caller's scope. Only `let` and `or` open a new scope.

use crate::engine::eval::LispError;
use crate::engine::special_forms::{IF, LAMBDA};
use crate::engine::value::{NativeFn, Value};
use tracing::{debug, instrument};

pub const MACROS: &[(&str, NativeFn)] = &[
    ("progn", expand_progn),
    ("let", expand_let),
    ("when", expand_when),
    ("unless", expand_unless),
    ("and", expand_and),
    ("or", expand_or),
    ("cond", expand_cond),
];

/// Temporary bound by `or` so each operand is evaluated once.
const OR_TEMP: &str = "%or";

fn sym(name: &str) -> Value {
    Value::symbol(name)
}

/// `(if test then else)`
fn if_form(test: Value, then: Value, otherwise: Value) -> Value {
    Value::list([sym(IF), test, then, otherwise])
}

/// `((lambda params body...) args...)`
fn lambda_call(params: Value, body: Vec<Value>, args: Vec<Value>) -> Value {
    let lambda = Value::cons(sym(LAMBDA), Value::cons(params, Value::list(body)));
    Value::cons(lambda, Value::list(args))
}

// `(a b c)` → `(if a (if b c c) (if b c c))`. Both arms share one tail, and
// whichever runs evaluates the forms in order in the caller's scope.
fn progn(body: Vec<Value>) -> Value {
    let mut forms = body.into_iter().rev();
    let Some(last) = forms.next() else {
        return Value::Nil;
    };
    forms.fold(last, |rest, form| if_form(form, rest.clone(), rest))
}

fn split_test(args: Vec<Value>, name: &str) -> Result<(Value, Vec<Value>), LispError> {
    let mut args = args.into_iter();
    let test = args.next().ok_or_else(|| {
        LispError::ArityMismatch(format!("'{}' expects a test form, got no arguments", name))
    })?;
    Ok((test, args.collect()))
}

/// `(progn a b c)` evaluates each form in the current scope and returns the last.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_progn(args: Vec<Value>) -> Result<Value, LispError> {
    Ok(progn(args))
}

/// `(let ((x 1) (y 2) z) body...)` → `((lambda (x y z) body...) 1 2 nil)`
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_let(args: Vec<Value>) -> Result<Value, LispError> {
    let mut args = args.into_iter();
    let bindings = args.next().ok_or_else(|| {
        LispError::ArityMismatch("'let' expects a binding list, got no arguments".to_string())
    })?;

    let mut names = Vec::new();
    let mut values = Vec::new();
    for binding in bindings.to_vec()? {
        match &binding {
            Value::Symbol(_) => {
                names.push(binding.clone());
                values.push(Value::Nil);
            }
            Value::Cons(_) => match binding.to_vec()?.as_slice() {
                [name] => {
                    names.push(Value::Symbol(name.expect_symbol()?));
                    values.push(Value::Nil);
                }
                [name, init] => {
                    names.push(Value::Symbol(name.expect_symbol()?));
                    values.push(init.clone());
                }
                _ => {
                    return Err(LispError::ArityMismatch(format!(
                        "'let' binding {} must be (name) or (name value)",
                        binding
                    )));
                }
            },
            other => {
                return Err(LispError::TypeMismatch {
                    expected: "let binding".to_string(),
                    found: other.to_string(),
                });
            }
        }
    }
    debug!(count = names.len(), "Expanding 'let'");
    Ok(lambda_call(Value::list(names), args.collect(), values))
}

/// `(when test body...)` → `(if test (progn body...) nil)`
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_when(args: Vec<Value>) -> Result<Value, LispError> {
    let (test, body) = split_test(args, "when")?;
    Ok(if_form(test, progn(body), Value::Nil))
}

/// `(unless test body...)` → `(if test nil (progn body...))`
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_unless(args: Vec<Value>) -> Result<Value, LispError> {
    let (test, body) = split_test(args, "unless")?;
    Ok(if_form(test, Value::Nil, progn(body)))
}

/// `(and)` is `t`; otherwise nested ifs returning the last value.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_and(args: Vec<Value>) -> Result<Value, LispError> {
    let mut forms = args.into_iter().rev();
    let Some(last) = forms.next() else {
        return Ok(Value::t());
    };
    Ok(forms.fold(last, |rest, form| if_form(form, rest, Value::Nil)))
}

/// `(or a b)` → `((lambda (%or) (if %or %or b)) a)`
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_or(args: Vec<Value>) -> Result<Value, LispError> {
    let mut forms = args.into_iter().rev();
    let Some(last) = forms.next() else {
        return Ok(Value::Nil);
    };
    Ok(forms.fold(last, |rest, form| {
        let temp = sym(OR_TEMP);
        let test = if_form(temp.clone(), temp.clone(), rest);
        lambda_call(Value::list([temp]), vec![test], vec![form])
    }))
}

/// `(cond (test body...) ...)`. A clause without a body yields its test value.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn expand_cond(args: Vec<Value>) -> Result<Value, LispError> {
    let mut expansion = Value::Nil;
    for clause in args.into_iter().rev() {
        let (test, body) = match clause.to_vec() {
            Ok(items) if !items.is_empty() => split_test(items, "cond")?,
            _ => {
                return Err(LispError::TypeMismatch {
                    expected: "cond clause".to_string(),
                    found: clause.to_string(),
                });
            }
        };
        expansion = if body.is_empty() {
            expand_or(vec![test, expansion])?
        } else {
            if_form(test, progn(body), expansion)
        };
    }
    Ok(expansion)
}
