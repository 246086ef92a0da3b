use crate::engine::env::Environment;
use crate::engine::eval::LispError;
use crate::engine::symbol::Symbol;
use crate::engine::value::{NativeFn, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Marker separating required parameters from the rest parameter.
pub const REST_MARKER: &str = "&rest";

/// The callable behind a `Function` or `Macro` value. The same procedure can
/// be wrapped as either; the wrapper decides whether arguments are
/// evaluated and whether the result is evaluated again.
pub enum Procedure {
    Native(NativeProcedure),
    Closure(Closure),
}

#[derive(Clone)]
pub struct NativeProcedure {
    pub name: &'static str, // For debugging and identification
    pub func: NativeFn,
}

pub struct Closure {
    pub params: ParamList,
    /// Proper list of body forms.
    pub body: Value,
    /// Strong handle: a closure returned from a call is the only owner of
    /// that call's scope. A closure `define`d into the scope it captures
    /// forms a cycle, so that scope lives as long as the interpreter.
    pub env: Rc<RefCell<Environment>>,
}

/// Parsed parameter pattern `(a b &rest c)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamList {
    /// Proper list of the required parameter symbols.
    pub required: Value,
    pub arity: usize,
    pub rest: Option<Symbol>,
}

impl ParamList {
    pub fn parse(params: &Value) -> Result<ParamList, LispError> {
        let items = params.to_vec()?;
        let mut required = Vec::with_capacity(items.len());
        let mut rest = None;
        let mut iter = items.iter();
        while let Some(param) = iter.next() {
            let name = param.expect_symbol()?;
            if name.as_str() != REST_MARKER {
                required.push(Value::Symbol(name));
                continue;
            }
            match (iter.next(), iter.next()) {
                (Some(rest_param), None) => rest = Some(rest_param.expect_symbol()?),
                _ => {
                    return Err(LispError::ArityMismatch(format!(
                        "'{}' must be followed by exactly one parameter in {}",
                        REST_MARKER, params
                    )));
                }
            }
        }
        Ok(ParamList {
            arity: required.len(),
            required: Value::list(required),
            rest,
        })
    }

    pub fn accepts(&self, count: usize) -> bool {
        if self.rest.is_some() {
            count >= self.arity
        } else {
            count == self.arity
        }
    }
}

impl From<Closure> for Procedure {
    fn from(closure: Closure) -> Self {
        Procedure::Closure(closure)
    }
}

impl From<NativeProcedure> for Procedure {
    fn from(native: NativeProcedure) -> Self {
        Procedure::Native(native)
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Native(native) => f
                .debug_struct("NativeProcedure")
                .field("name", &native.name)
                .field("func", &"<native_fn_ptr>")
                .finish(),
            Procedure::Closure(closure) => f
                .debug_struct("Closure")
                .field("params", &closure.params)
                .field("body", &closure.body)
                .field("env", &"<captured_env>") // Avoid printing the whole env
                .finish(),
        }
    }
}
