use crate::engine::eval::{LispError, invoke};
use crate::engine::list;
use crate::engine::value::{NativeFn, Value};
use std::rc::Rc;
use tracing::{error, instrument, trace};

pub const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("cons", native_cons),
    ("car", native_car),
    ("cdr", native_cdr),
    ("list", native_list),
    ("length", native_length),
    ("null", native_null),
    ("not", native_null),
    ("consp", native_consp),
    ("atom", native_atom),
    ("eq", native_eq),
    ("equal", native_equal),
    ("append", native_append),
    ("reverse", native_reverse),
    ("nth", native_nth),
    ("funcall", native_funcall),
    ("mapcar", native_mapcar),
    ("type-of", native_type_of),
];

fn expect_args<const N: usize>(args: Vec<Value>, name: &str) -> Result<[Value; N], LispError> {
    args.try_into().map_err(|args: Vec<Value>| {
        let msg = format!("'{}' expects {} argument(s), got {}", name, N, args.len());
        error!("{}", msg);
        LispError::ArityMismatch(msg)
    })
}

fn type_mismatch(expected: &str, found: &Value) -> LispError {
    LispError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn native_cons(args: Vec<Value>) -> Result<Value, LispError> {
    let [car, cdr] = expect_args::<2>(args, "cons")?;
    Ok(Value::cons(car, cdr))
}

fn native_car(args: Vec<Value>) -> Result<Value, LispError> {
    let [list] = expect_args::<1>(args, "car")?;
    match list {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(cell) => Ok(cell.car.clone()),
        other => Err(type_mismatch("list", &other)),
    }
}

fn native_cdr(args: Vec<Value>) -> Result<Value, LispError> {
    let [list] = expect_args::<1>(args, "cdr")?;
    match list {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(cell) => Ok(cell.cdr.clone()),
        other => Err(type_mismatch("list", &other)),
    }
}

fn native_list(args: Vec<Value>) -> Result<Value, LispError> {
    Ok(Value::list(args))
}

fn native_length(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native list function: length");
    let [sequence] = expect_args::<1>(args, "length")?;
    let length = match &sequence {
        Value::Nil | Value::Cons(_) => sequence.to_vec()?.len(),
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        other => return Err(type_mismatch("sequence", other)),
    };
    i64::try_from(length)
        .map(Value::Integer)
        .map_err(|_| LispError::Overflow(format!("length {} does not fit an integer", length)))
}

fn native_null(args: Vec<Value>) -> Result<Value, LispError> {
    let [value] = expect_args::<1>(args, "null")?;
    Ok(Value::from_bool(value.is_nil()))
}

fn native_consp(args: Vec<Value>) -> Result<Value, LispError> {
    let [value] = expect_args::<1>(args, "consp")?;
    Ok(Value::from_bool(matches!(value, Value::Cons(_))))
}

fn native_atom(args: Vec<Value>) -> Result<Value, LispError> {
    let [value] = expect_args::<1>(args, "atom")?;
    Ok(Value::from_bool(!matches!(value, Value::Cons(_))))
}

/// Identity for heap values, value equality for numbers, characters and symbols.
fn is_same_object(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Character(x), Value::Character(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::String(x), Value::String(y)) => Rc::ptr_eq(x, y),
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Cons(x), Value::Cons(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) | (Value::Macro(x), Value::Macro(y)) => {
            Rc::ptr_eq(x, y)
        }
        _ => false,
    }
}

fn native_eq(args: Vec<Value>) -> Result<Value, LispError> {
    let [a, b] = expect_args::<2>(args, "eq")?;
    Ok(Value::from_bool(is_same_object(&a, &b)))
}

fn native_equal(args: Vec<Value>) -> Result<Value, LispError> {
    let [a, b] = expect_args::<2>(args, "equal")?;
    Ok(Value::from_bool(a == b))
}

/// `(append l1 l2 ... tail)`: copies every list but the last, which is
/// shared as the tail of the result.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
fn native_append(mut args: Vec<Value>) -> Result<Value, LispError> {
    let Some(tail) = args.pop() else {
        return Ok(Value::Nil);
    };
    let mut items = Vec::new();
    for list in &args {
        items.extend(list.to_vec()?);
    }
    Ok(Value::list_with_tail(items, tail))
}

fn native_reverse(args: Vec<Value>) -> Result<Value, LispError> {
    let [list] = expect_args::<1>(args, "reverse")?;
    let items = list.to_vec()?;
    Ok(Value::list(items.into_iter().rev()))
}

/// `(nth index list)`: nil past the end.
fn native_nth(args: Vec<Value>) -> Result<Value, LispError> {
    let [index, list] = expect_args::<2>(args, "nth")?;
    let index = match index {
        Value::Integer(i) if i >= 0 => i,
        other => return Err(type_mismatch("non-negative integer", &other)),
    };
    let items = list.to_vec()?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i).cloned())
        .unwrap_or(Value::Nil))
}

#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
fn native_funcall(mut args: Vec<Value>) -> Result<Value, LispError> {
    if args.is_empty() {
        return Err(LispError::ArityMismatch(
            "'funcall' expects a function and its arguments, got 0 arguments".to_string(),
        ));
    }
    let rest = args.split_off(1);
    invoke(&args[0], rest)
}

/// `(mapcar f list)` or `(mapcar f list-a list-b)`.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
fn native_mapcar(args: Vec<Value>) -> Result<Value, LispError> {
    match args.as_slice() {
        [function, items] => list::map(items, |item| invoke(function, vec![item.clone()])),
        [function, left, right] => list::map2(left, right, |a, b| {
            invoke(function, vec![a.clone(), b.clone()])
        }),
        _ => {
            let msg = format!(
                "'mapcar' expects a function and 1 or 2 lists, got {} arguments",
                args.len()
            );
            error!("{}", msg);
            Err(LispError::ArityMismatch(msg))
        }
    }
}

fn native_type_of(args: Vec<Value>) -> Result<Value, LispError> {
    let [value] = expect_args::<1>(args, "type-of")?;
    Ok(Value::symbol(&value.kind().to_string()))
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
    fn cons_car_cdr() {
        init_test_logging();
        assert_eq!(run("(cons 1 2)"), Ok(read("(1 . 2)")));
        assert_eq!(run("(car '(1 2))"), Ok(Value::Integer(1)));
        assert_eq!(run("(cdr '(1 2))"), Ok(read("(2)")));
        assert_eq!(run("(car nil)"), Ok(Value::Nil));
        assert_eq!(run("(cdr nil)"), Ok(Value::Nil));
    }

    #[test]
    fn car_of_atom_is_type_mismatch() {
        init_test_logging();
        assert_eq!(
            run("(car 5)"),
            Err(LispError::TypeMismatch {
                expected: "list".to_string(),
                found: "5".to_string(),
            })
        );
        assert!(matches!(run("(car)"), Err(LispError::ArityMismatch(_))));
    }

    #[test]
    fn length_of_sequences() {
        init_test_logging();
        assert_eq!(run("(length '(1 2 3))"), Ok(Value::Integer(3)));
        assert_eq!(run("(length nil)"), Ok(Value::Integer(0)));
        assert_eq!(run("(length \"héllo\")"), Ok(Value::Integer(5)));
        assert_eq!(run("(length #(1 2))"), Ok(Value::Integer(2)));
        assert!(matches!(run("(length 5)"), Err(LispError::TypeMismatch { .. })));
        assert!(matches!(
            run("(length '(1 . 2))"),
            Err(LispError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn predicates_return_t_or_nil() {
        init_test_logging();
        assert_eq!(run("(null nil)"), Ok(Value::t()));
        assert_eq!(run("(null 0)"), Ok(Value::Nil));
        assert_eq!(run("(not nil)"), Ok(Value::t()));
        assert_eq!(run("(consp '(1))"), Ok(Value::t()));
        assert_eq!(run("(consp nil)"), Ok(Value::Nil));
        assert_eq!(run("(atom nil)"), Ok(Value::t()));
        assert_eq!(run("(atom '(1))"), Ok(Value::Nil));
    }

    #[test]
    fn eq_is_identity_equal_is_structure() {
        init_test_logging();
        assert_eq!(run("(eq 'a 'a)"), Ok(Value::t()));
        assert_eq!(run("(eq 3 3)"), Ok(Value::t()));
        assert_eq!(run("(eq '(1) '(1))"), Ok(Value::Nil));
        assert_eq!(run("(equal '(1 (2)) '(1 (2)))"), Ok(Value::t()));
        assert_eq!(run("(equal \"ab\" \"ab\")"), Ok(Value::t()));
        assert_eq!(run("(equal 1 1.0)"), Ok(Value::Nil));

        let env = Environment::new_global();
        run_in("(define xs '(1 2))", Rc::clone(&env)).unwrap();
        assert_eq!(run_in("(eq xs xs)", env), Ok(Value::t()));
    }

    #[test]
    fn append_and_reverse() {
        init_test_logging();
        assert_eq!(run("(append '(1 2) '(3) nil '(4))"), Ok(read("(1 2 3 4)")));
        assert_eq!(run("(append)"), Ok(Value::Nil));
        assert_eq!(run("(append '(1) 2)"), Ok(read("(1 . 2)")));
        assert_eq!(run("(reverse '(1 2 3))"), Ok(read("(3 2 1)")));
        assert_eq!(run("(reverse nil)"), Ok(Value::Nil));
    }

    #[test]
    fn nth_indexes_from_zero() {
        init_test_logging();
        assert_eq!(run("(nth 0 '(a b))"), Ok(Value::symbol("a")));
        assert_eq!(run("(nth 1 '(a b))"), Ok(Value::symbol("b")));
        assert_eq!(run("(nth 5 '(a b))"), Ok(Value::Nil));
        assert!(matches!(run("(nth -1 '(a))"), Err(LispError::TypeMismatch { .. })));
    }

    #[test]
    fn funcall_invokes_function_values() {
        init_test_logging();
        assert_eq!(run("(funcall #'+ 1 2)"), Ok(Value::Integer(3)));
        assert_eq!(run("(funcall (lambda () 'done))"), Ok(Value::symbol("done")));
        assert!(matches!(
            run("(funcall 'car '(1))"),
            Err(LispError::TypeMismatch { .. })
        ));
        assert!(matches!(run("(funcall)"), Err(LispError::ArityMismatch(_))));
    }

    #[test]
    fn mapcar_over_one_and_two_lists() {
        init_test_logging();
        assert_eq!(
            run("(mapcar (lambda (x) (* x x)) '(1 2 3))"),
            Ok(read("(1 4 9)"))
        );
        assert_eq!(run("(mapcar #'+ '(1 2) '(10 20))"), Ok(read("(11 22)")));
        assert_eq!(run("(mapcar #'car nil)"), Ok(Value::Nil));
        assert!(matches!(
            run("(mapcar #'+ '(1 2) '(1))"),
            Err(LispError::ArityMismatch(_))
        ));
    }

    #[test]
    fn type_of_names_the_kind() {
        init_test_logging();
        assert_eq!(run("(type-of 1)"), Ok(Value::symbol("integer")));
        assert_eq!(run("(type-of 1.5)"), Ok(Value::symbol("float")));
        assert_eq!(run("(type-of #\\a)"), Ok(Value::symbol("character")));
        assert_eq!(run("(type-of \"s\")"), Ok(Value::symbol("string")));
        assert_eq!(run("(type-of 'a)"), Ok(Value::symbol("symbol")));
        assert_eq!(run("(type-of '(1))"), Ok(Value::symbol("cons")));
        assert_eq!(run("(type-of nil)"), Ok(Value::symbol("null")));
        assert_eq!(run("(type-of #'car)"), Ok(Value::symbol("function")));
    }
}
