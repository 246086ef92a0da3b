//! Names of the forms the evaluator handles directly.

pub const QUOTE: &str = "quote";
pub const IF: &str = "if";
pub const APPLY: &str = "apply";
pub const LAMBDA: &str = "lambda";
pub const DEFINE: &str = "define";
pub const FUNCTION: &str = "function";
pub const MACRO: &str = "macro";
pub const DEFINE_MACRO: &str = "define-macro";

/// Special form names. They are resolved before any user or builtin binding,
/// so functions and macros cannot be defined under these names.
pub const SPECIAL_FORMS: &[&str] = &[QUOTE, IF, APPLY, LAMBDA, DEFINE, FUNCTION, MACRO, DEFINE_MACRO];

pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name)
}
