use crate::engine::eval::LispError;
use crate::engine::value::{NativeFn, Value};
use tracing::{error, instrument, trace};

pub const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("+", native_add),
    ("-", native_subtract),
    ("*", native_multiply),
    ("/", native_divide),
    ("mod", native_mod),
    ("=", native_equals),
    ("/=", native_not_equals),
    ("<", native_less_than),
    (">", native_greater_than),
    ("<=", native_less_than_or_equal),
    (">=", native_greater_than_or_equal),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

fn extract_number(value: &Value, op_name: &str) -> Result<Number, LispError> {
    match value {
        Value::Integer(i) => Ok(Number::Integer(*i)),
        Value::Float(f) => Ok(Number::Float(*f)),
        _ => {
            let type_error = LispError::TypeMismatch {
                expected: "number".to_string(),
                found: value.to_string(),
            };
            error!(operator = %op_name, error = %type_error, "Type error in native function");
            Err(type_error)
        }
    }
}

fn extract_numbers(args: &[Value], op_name: &str) -> Result<Vec<Number>, LispError> {
    args.iter().map(|arg| extract_number(arg, op_name)).collect()
}

/// Combines two numbers: checked integer arithmetic when both are integers,
/// float arithmetic as soon as either is a float.
fn combine(
    op_name: &str,
    lhs: Number,
    rhs: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Number, LispError> {
    match (lhs, rhs) {
        (Number::Integer(a), Number::Integer(b)) => {
            int_op(a, b).map(Number::Integer).ok_or_else(|| {
                let overflow = LispError::Overflow(format!("({} {} {})", op_name, a, b));
                error!(error = %overflow, "Overflow in native '{}'", op_name);
                overflow
            })
        }
        _ => Ok(Number::Float(float_op(lhs.as_f64(), rhs.as_f64()))),
    }
}

fn require_some(args: &[Value], op_name: &str) -> Result<(), LispError> {
    if args.is_empty() {
        let arity_error = LispError::ArityMismatch(format!(
            "'{}' expects at least 1 argument, got 0",
            op_name
        ));
        error!(error = %arity_error, "Arity error in native '{}'", op_name);
        return Err(arity_error);
    }
    Ok(())
}

fn check_divisor(divisor: Number, op_name: &str, position: usize) -> Result<(), LispError> {
    if divisor.is_zero() {
        let div_zero_error = LispError::DivisionByZero(format!(
            "'{}' argument {} is zero",
            op_name, position
        ));
        error!(error = %div_zero_error, "Division by zero error in native '{}'", op_name);
        return Err(div_zero_error);
    }
    Ok(())
}

#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_add(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native '+' function");
    extract_numbers(&args, "+")?
        .into_iter()
        .try_fold(Number::Integer(0), |sum, n| {
            combine("+", sum, n, i64::checked_add, |a, b| a + b)
        })
        .map(Value::from)
}

#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_multiply(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native '*' function");
    extract_numbers(&args, "*")?
        .into_iter()
        .try_fold(Number::Integer(1), |product, n| {
            combine("*", product, n, i64::checked_mul, |a, b| a * b)
        })
        .map(Value::from)
}

#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_subtract(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native '-' function");
    require_some(&args, "-")?;
    let numbers = extract_numbers(&args, "-")?;

    if let [only] = numbers.as_slice() {
        // Negation: (- x)
        return combine("-", Number::Integer(0), *only, i64::checked_sub, |a, b| a - b)
            .map(Value::from);
    }

    numbers[1..]
        .iter()
        .try_fold(numbers[0], |result, n| {
            combine("-", result, *n, i64::checked_sub, |a, b| a - b)
        })
        .map(Value::from)
}

#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_divide(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native '/' function");
    require_some(&args, "/")?;
    let numbers = extract_numbers(&args, "/")?;

    if let [only] = numbers.as_slice() {
        // Reciprocal: (/ x)
        check_divisor(*only, "/", 1)?;
        return combine("/", Number::Integer(1), *only, i64::checked_div, |a, b| a / b)
            .map(Value::from);
    }

    let mut result = numbers[0];
    for (i, divisor) in numbers.iter().enumerate().skip(1) {
        check_divisor(*divisor, "/", i + 1)?;
        result = combine("/", result, *divisor, i64::checked_div, |a, b| a / b)?;
    }
    Ok(result.into())
}

/// `(mod a b)`: the result takes the sign of the divisor.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_mod(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native 'mod' function");
    let [lhs, rhs] = args.as_slice() else {
        let arity_error =
            LispError::ArityMismatch(format!("'mod' expects 2 arguments, got {}", args.len()));
        error!(error = %arity_error, "Arity error in native 'mod'");
        return Err(arity_error);
    };
    let lhs = extract_number(lhs, "mod")?;
    let rhs = extract_number(rhs, "mod")?;
    check_divisor(rhs, "mod", 2)?;

    let remainder = combine("mod", lhs, rhs, i64::checked_rem, |a, b| a % b)?;
    let adjusted = match remainder {
        Number::Integer(r) if r != 0 && (r < 0) != (rhs.as_f64() < 0.0) => {
            combine("mod", remainder, rhs, i64::checked_add, |a, b| a + b)?
        }
        Number::Float(r) if r != 0.0 && (r < 0.0) != (rhs.as_f64() < 0.0) => {
            Number::Float(r + rhs.as_f64())
        }
        _ => remainder,
    };
    Ok(adjusted.into())
}

fn compare(lhs: Number, rhs: Number) -> Option<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
        _ => lhs.as_f64().partial_cmp(&rhs.as_f64()),
    }
}

// Helper macro to generate chained comparison functions: every adjacent pair
// must satisfy the operator.
macro_rules! define_comparison_fn {
    ($fn_name:ident, $op_str:expr, $op:tt) => {
        #[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
        pub fn $fn_name(args: Vec<Value>) -> Result<Value, LispError> {
            trace!("Executing native '{}' function", $op_str);
            require_some(&args, $op_str)?;
            let numbers = extract_numbers(&args, $op_str)?;
            let holds = numbers.windows(2).all(|pair| {
                compare(pair[0], pair[1]).is_some_and(|ordering| ordering $op std::cmp::Ordering::Equal)
            });
            Ok(Value::from_bool(holds))
        }
    };
}

define_comparison_fn!(native_equals, "=", ==);
define_comparison_fn!(native_less_than, "<", <);
define_comparison_fn!(native_greater_than, ">", >);
define_comparison_fn!(native_less_than_or_equal, "<=", <=);
define_comparison_fn!(native_greater_than_or_equal, ">=", >=);

/// `(/= a b ...)`: true when no two arguments are numerically equal.
#[instrument(level = "trace", skip(args), ret, err(level = "debug"))]
pub fn native_not_equals(args: Vec<Value>) -> Result<Value, LispError> {
    trace!("Executing native '/=' function");
    require_some(&args, "/=")?;
    let numbers = extract_numbers(&args, "/=")?;
    let distinct = numbers.iter().enumerate().all(|(i, a)| {
        numbers[i + 1..]
            .iter()
            .all(|b| compare(*a, *b) != Some(std::cmp::Ordering::Equal))
    });
    Ok(Value::from_bool(distinct))
}
