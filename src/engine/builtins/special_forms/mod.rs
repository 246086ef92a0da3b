//! One module per special form. `eval` dispatches on the operator symbol
//! and hands each form its unevaluated operands.

pub mod apply_form;
pub mod define_form;
pub mod function_form;
pub mod if_form;
pub mod lambda_form;
pub mod macro_form;
pub mod quote_form;

pub use apply_form::eval_apply;
pub use define_form::eval_define;
pub use function_form::eval_function;
pub use if_form::eval_if;
pub use lambda_form::eval_lambda;
pub use macro_form::{eval_define_macro, eval_macro};
pub use quote_form::eval_quote;
