//! The core Lisp engine: values, symbols, environments, the evaluator, the
//! reader and the builtin library.

pub mod builtins;
pub mod env;
pub mod eval;
pub mod list;
pub mod parser;
pub mod printer;
pub mod procedure;
pub mod special_forms;
pub mod symbol;
pub mod value;
