//! Structural recursion helpers over proper lists.

use crate::engine::eval::LispError;
use crate::engine::value::Value;

fn improper(list: &Value) -> LispError {
    LispError::TypeMismatch {
        expected: "proper list".to_string(),
        found: list.to_string(),
    }
}

/// Applies `f` to each element, left to right, collecting the results into a
/// new list. Stops at the first error.
pub fn map<F>(list: &Value, mut f: F) -> Result<Value, LispError>
where
    F: FnMut(&Value) -> Result<Value, LispError>,
{
    let mut results = Vec::new();
    let mut current = list;
    loop {
        match current {
            Value::Nil => return Ok(Value::list(results)),
            Value::Cons(cell) => {
                results.push(f(&cell.car)?);
                current = &cell.cdr;
            }
            _ => return Err(improper(list)),
        }
    }
}

/// Pairs up two lists of equal length, producing a list of `f(a_i, b_i)`.
pub fn map2<F>(list_a: &Value, list_b: &Value, mut f: F) -> Result<Value, LispError>
where
    F: FnMut(&Value, &Value) -> Result<Value, LispError>,
{
    let mut results = Vec::new();
    let (mut a, mut b) = (list_a, list_b);
    loop {
        match (a, b) {
            (Value::Nil, Value::Nil) => return Ok(Value::list(results)),
            (Value::Cons(left), Value::Cons(right)) => {
                results.push(f(&left.car, &right.car)?);
                a = &left.cdr;
                b = &right.cdr;
            }
            (Value::Nil, Value::Cons(_)) | (Value::Cons(_), Value::Nil) => {
                return Err(LispError::ArityMismatch(format!(
                    "lists differ in length: {} and {}",
                    list_a, list_b
                )));
            }
            (Value::Nil | Value::Cons(_), _) => return Err(improper(list_b)),
            _ => return Err(improper(list_a)),
        }
    }
}

/// The final element of a non-empty proper list.
pub fn last(list: &Value) -> Result<Value, LispError> {
    let mut current = match list {
        Value::Cons(cell) => cell,
        _ => {
            return Err(LispError::TypeMismatch {
                expected: "non-empty list".to_string(),
                found: list.to_string(),
            });
        }
    };
    loop {
        match &current.cdr {
            Value::Nil => return Ok(current.car.clone()),
            Value::Cons(next) => current = next,
            _ => return Err(improper(list)),
        }
    }
}
