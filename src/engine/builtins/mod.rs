//! Native functions and macros consulted after the user's own bindings.

pub mod io;
pub mod list;
pub mod macros;
pub mod math;
pub mod special_forms;

use crate::engine::procedure::{NativeProcedure, Procedure};
use crate::engine::symbol::Symbol;
use crate::engine::value::{NativeFn, Value};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// Receives evaluated arguments.
    Function,
    /// Receives the raw argument forms and returns an expansion.
    Macro,
}

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub func: NativeFn,
}

impl Builtin {
    fn to_value(&self) -> Value {
        let procedure = Rc::new(Procedure::from(NativeProcedure {
            name: self.name,
            func: self.func,
        }));
        match self.kind {
            BuiltinKind::Function => Value::Function(procedure),
            BuiltinKind::Macro => Value::Macro(procedure),
        }
    }
}

static REGISTRY: Lazy<HashMap<Symbol, Builtin>> = Lazy::new(|| {
    trace!("Building builtin registry");
    let functions = math::FUNCTIONS
        .iter()
        .chain(list::FUNCTIONS)
        .chain(io::FUNCTIONS)
        .map(|entry| (entry, BuiltinKind::Function));
    let macros = macros::MACROS
        .iter()
        .map(|entry| (entry, BuiltinKind::Macro));

    functions
        .chain(macros)
        .map(|(&(name, func), kind)| (Symbol::new(name), Builtin { name, kind, func }))
        .collect()
});

fn lookup(name: Symbol, kind: BuiltinKind) -> Option<Value> {
    REGISTRY
        .get(&name)
        .filter(|builtin| builtin.kind == kind)
        .map(Builtin::to_value)
}

pub fn lookup_function(name: Symbol) -> Option<Value> {
    lookup(name, BuiltinKind::Function)
}

pub fn lookup_macro(name: Symbol) -> Option<Value> {
    lookup(name, BuiltinKind::Macro)
}

/// Every builtin name of the given kind, for completion and highlighting.
pub fn names(kind: BuiltinKind) -> impl Iterator<Item = &'static str> {
    REGISTRY
        .values()
        .filter(move |builtin| builtin.kind == kind)
        .map(|builtin| builtin.name)
}
