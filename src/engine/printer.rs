//! Canonical textual rendering of values.

use crate::engine::value::Value;
use std::fmt;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Integer(n) => write!(f, "{}", n),
            // Debug formatting keeps the fractional part, so 2.0 prints as "2.0".
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Character(c) => write!(f, "#\\{}", c),
            Value::String(s) => write_string(s, f),
            Value::Array(items) => {
                f.write_str("#(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Cons(_) => write_cons(self, f),
            Value::Function(_) => f.write_str("#<FUNCTION>"),
            Value::Macro(_) => f.write_str("#<MACRO>"),
        }
    }
}

// Escapes match what the reader accepts inside a string literal.
fn write_string(text: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

// `(car . cdr)` nests along the cdr; walk it iteratively and close all the
// parentheses at the end.
fn write_cons(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut depth = 0;
    let mut current = value;
    while let Value::Cons(cell) = current {
        write!(f, "({} . ", cell.car)?;
        depth += 1;
        current = &cell.cdr;
    }
    write!(f, "{}", current)?;
    for _ in 0..depth {
        f.write_str(")")?;
    }
    Ok(())
}
