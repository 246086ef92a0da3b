use crate::engine::eval::LispError;
use crate::engine::procedure::Procedure;
use crate::engine::symbol::Symbol;
use std::fmt;
use std::rc::Rc;

/// Type alias for a native Rust function that can be called from Lisp.
/// Builtin functions receive evaluated arguments; builtin macros receive
/// the raw argument forms and return an expansion.
pub type NativeFn = fn(Vec<Value>) -> Result<Value, LispError>;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Integer(i64),
    Float(f64),
    Character(char),
    String(Rc<str>),
    Array(Rc<[Value]>),
    Symbol(Symbol),
    Cons(Rc<Cons>),
    Function(Rc<Procedure>),
    Macro(Rc<Procedure>),
}

#[derive(Debug)]
pub struct Cons {
    pub car: Value,
    pub cdr: Value,
}

// Unlinks uniquely owned cdr chains one cell at a time so dropping a long
// list does not recurse once per element.
impl Drop for Cons {
    fn drop(&mut self) {
        let mut next = std::mem::replace(&mut self.cdr, Value::Nil);
        while let Value::Cons(cell) = next {
            match Rc::try_unwrap(cell) {
                Ok(mut cell) => next = std::mem::replace(&mut cell.cdr, Value::Nil),
                Err(_) => break,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    Integer,
    Float,
    Character,
    String,
    Array,
    Symbol,
    Cons,
    Function,
    Macro,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "null",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Character => "character",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Symbol => "symbol",
            ValueKind::Cons => "cons",
            ValueKind::Function => "function",
            ValueKind::Macro => "macro",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::new(name))
    }

    pub fn string(text: &str) -> Value {
        Value::String(Rc::from(text))
    }

    /// The canonical true value, the symbol `t`.
    pub fn t() -> Value {
        Value::symbol("t")
    }

    pub fn from_bool(b: bool) -> Value {
        if b { Value::t() } else { Value::Nil }
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cons(Rc::new(Cons { car, cdr }))
    }

    /// Builds a proper list from the items.
    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        Value::list_with_tail(items, Value::Nil)
    }

    /// Builds a list whose final cdr is `tail` (a dotted list unless `tail` is nil).
    pub fn list_with_tail<I>(items: I, tail: Value) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(tail, |rest, item| Value::cons(item, rest))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Character(_) => ValueKind::Character,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Cons(_) => ValueKind::Cons,
            Value::Function(_) => ValueKind::Function,
            Value::Macro(_) => ValueKind::Macro,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `nil` is true.
    pub fn is_truthy(&self) -> bool {
        !self.is_nil()
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    /// Like `as_symbol`, but a non-symbol is a type mismatch.
    pub fn expect_symbol(&self) -> Result<Symbol, LispError> {
        self.as_symbol().ok_or_else(|| LispError::TypeMismatch {
            expected: "symbol".to_string(),
            found: self.to_string(),
        })
    }

    /// Iterates over the cars of a cons chain, stopping at the first non-cons cdr.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    /// Collects a proper list into a vector. `nil` is the empty list.
    pub fn to_vec(&self) -> Result<Vec<Value>, LispError> {
        let mut items = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Nil => return Ok(items),
                Value::Cons(cell) => {
                    items.push(cell.car.clone());
                    current = &cell.cdr;
                }
                _ => {
                    return Err(LispError::TypeMismatch {
                        expected: "proper list".to_string(),
                        found: self.to_string(),
                    });
                }
            }
        }
    }
}

pub struct ListIter<'a> {
    current: &'a Value,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            Value::Cons(cell) => {
                self.current = &cell.cdr;
                Some(&cell.car)
            }
            _ => None,
        }
    }
}

// Atoms, strings, arrays and conses compare structurally.
// Procedures compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Cons(_), Value::Cons(_)) => {
                let (mut left, mut right) = (self, other);
                loop {
                    match (left, right) {
                        (Value::Cons(a), Value::Cons(b)) => {
                            if Rc::ptr_eq(a, b) {
                                return true;
                            }
                            if a.car != b.car {
                                return false;
                            }
                            left = &a.cdr;
                            right = &b.cdr;
                        }
                        _ => return left == right,
                    }
                }
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Character(c)
    }
}
