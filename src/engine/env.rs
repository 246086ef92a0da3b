use crate::engine::eval::LispError;
use crate::engine::symbol::Symbol;
use crate::engine::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// The three independent binding tables a symbol can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Variable,
    Function,
    Macro,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Variable => f.write_str("variable"),
            Namespace::Function => f.write_str("function"),
            Namespace::Macro => f.write_str("macro"),
        }
    }
}

#[derive(Default)]
pub struct Environment {
    variables: HashMap<Symbol, Value>,
    functions: HashMap<Symbol, Value>,
    macros: HashMap<Symbol, Value>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// Creates a new, empty root environment without any constants.
    pub fn new() -> Rc<RefCell<Self>> {
        debug!("Creating new empty root environment");
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Creates a root environment with the global constants bound.
    pub fn new_global() -> Rc<RefCell<Self>> {
        debug!("Creating new global environment");
        let env = Environment::new();
        env.borrow_mut()
            .bind(Symbol::new("t"), Value::t(), Namespace::Variable);
        env
    }

    /// Creates a new, empty environment enclosed by an outer environment.
    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        trace!("Creating new enclosed environment");
        Rc::new(RefCell::new(Environment {
            outer: Some(outer),
            ..Environment::default()
        }))
    }

    /// Creates a child scope of `outer` holding the given variable bindings.
    pub fn extend<I>(outer: Rc<RefCell<Environment>>, bindings: I) -> Rc<RefCell<Self>>
    where
        I: IntoIterator<Item = (Symbol, Value)>,
    {
        let child = Environment::new_enclosed(outer);
        {
            let mut scope = child.borrow_mut();
            for (name, value) in bindings {
                scope.bind(name, value, Namespace::Variable);
            }
        }
        child
    }

    fn table(&self, namespace: Namespace) -> &HashMap<Symbol, Value> {
        match namespace {
            Namespace::Variable => &self.variables,
            Namespace::Function => &self.functions,
            Namespace::Macro => &self.macros,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut HashMap<Symbol, Value> {
        match namespace {
            Namespace::Variable => &mut self.variables,
            Namespace::Function => &mut self.functions,
            Namespace::Macro => &mut self.macros,
        }
    }

    /// Binds or rebinds `name` in this scope only.
    pub fn bind(&mut self, name: Symbol, value: Value, namespace: Namespace) {
        trace!(name = %name, %namespace, value = %value, "Binding in current environment");
        self.table_mut(namespace).insert(name, value);
    }

    /// Searches this scope, then the enclosing ones.
    pub fn get(&self, name: Symbol, namespace: Namespace) -> Option<Value> {
        if let Some(value) = self.table(namespace).get(&name) {
            return Some(value.clone());
        }
        match &self.outer {
            Some(outer) => outer.borrow().get(name, namespace),
            None => None,
        }
    }

    /// Like `get`, but a miss is an unbound-symbol or unbound-function error.
    pub fn lookup(&self, name: Symbol, namespace: Namespace) -> Result<Value, LispError> {
        self.get(name, namespace).ok_or_else(|| {
            debug!(name = %name, %namespace, "Lookup failed in every scope");
            match namespace {
                Namespace::Variable => LispError::UnboundSymbol(name.to_string()),
                Namespace::Function | Namespace::Macro => {
                    LispError::UnboundFunction(name.to_string())
                }
            }
        })
    }

    /// Whether `name` is bound in this scope, ignoring enclosing scopes.
    pub fn is_bound_locally(&self, name: Symbol, namespace: Namespace) -> bool {
        self.table(namespace).contains_key(&name)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |table: &HashMap<Symbol, Value>| {
            let mut keys: Vec<&str> = table.keys().map(|s| s.as_str()).collect();
            keys.sort_unstable();
            keys.join(" ")
        };
        f.debug_struct("Environment")
            .field("variables", &names(&self.variables))
            .field("functions", &names(&self.functions))
            .field("macros", &names(&self.macros))
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}
