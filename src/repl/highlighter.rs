use crate::engine::builtins::{self, BuiltinKind};
use crate::engine::parser::parse_program;
use crate::engine::special_forms::{SPECIAL_FORMS, is_special_form};
use lazy_static::lazy_static;
use owo_colors::OwoColorize;
use regex::{Captures, Regex};
use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline_derive::{Helper, Hinter};
use std::borrow::Cow::{self, Borrowed, Owned};

lazy_static! {
    // One alternative per token class; the first group that matches names the class.
    static ref TOKEN_RE: Regex = Regex::new(
        r#"(?P<comment>;.*)|(?P<string>"(?:[^"\\]|\\.)*"?)|(?P<character>#\\(?:space|newline|tab|.))|(?P<paren>#?\(|\))|(?P<quote>#?')|(?P<atom>[^\s()'";]+)"#
    )
    .unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap();
}

fn is_token_boundary(c: char) -> bool {
    c.is_whitespace() || "()'\"".contains(c)
}

fn style_atom(atom: &str) -> String {
    if NUMBER_RE.is_match(atom) {
        atom.magenta().to_string()
    } else if atom == "nil" || atom == "t" {
        atom.yellow().to_string()
    } else if is_special_form(atom) {
        atom.cyan().bold().to_string()
    } else if builtins::names(BuiltinKind::Macro).any(|name| name == atom) {
        atom.cyan().to_string()
    } else if builtins::names(BuiltinKind::Function).any(|name| name == atom) {
        atom.blue().to_string()
    } else {
        atom.to_string()
    }
}

fn style_token(caps: &Captures<'_>) -> String {
    if let Some(m) = caps.name("comment") {
        m.as_str().bright_black().to_string()
    } else if let Some(m) = caps.name("string") {
        m.as_str().green().to_string()
    } else if let Some(m) = caps.name("character") {
        m.as_str().green().to_string()
    } else if let Some(m) = caps.name("paren") {
        m.as_str().bright_black().to_string()
    } else if let Some(m) = caps.name("quote") {
        m.as_str().yellow().to_string()
    } else if let Some(m) = caps.name("atom") {
        style_atom(m.as_str())
    } else {
        caps[0].to_string()
    }
}

/// Colors a line of Lisp source with ANSI escapes.
pub fn highlight_source(line: &str) -> String {
    let mut styled = String::with_capacity(line.len() * 2);
    let mut last_end = 0;
    for caps in TOKEN_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        styled.push_str(&line[last_end..whole.start()]);
        styled.push_str(&style_token(&caps));
        last_end = whole.end();
    }
    styled.push_str(&line[last_end..]);
    styled
}

/// rustyline helper: highlighting, name completion, and multi-line input
/// for unbalanced forms.
#[derive(Default, Helper, Hinter)]
pub struct ReplHelper;

impl ReplHelper {
    pub fn new() -> Self {
        ReplHelper
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Borrowed(line);
        }
        Owned(highlight_source(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .char_indices()
            .rev()
            .find(|&(_, c)| is_token_boundary(c))
            .map_or(0, |(i, c)| i + c.len_utf8());
        let prefix = &line[start..pos];
        if prefix.is_empty() {
            return Ok((pos, Vec::new()));
        }

        let mut names: Vec<&str> = SPECIAL_FORMS
            .iter()
            .copied()
            .chain(builtins::names(BuiltinKind::Function))
            .chain(builtins::names(BuiltinKind::Macro))
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort_unstable();
        let candidates = names
            .into_iter()
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        match parse_program(ctx.input()) {
            Err(e) if e.is_unexpected_end() => Ok(ValidationResult::Incomplete),
            _ => Ok(ValidationResult::Valid(None)),
        }
    }
}
