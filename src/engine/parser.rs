use crate::engine::special_forms::{FUNCTION, QUOTE};
use crate::engine::value::Value;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{anychar, char, multispace1, none_of, satisfy},
    combinator::{cut, eof, opt, peek, recognize, value, verify},
    multi::{fold_many0, many0},
    sequence::{delimited, preceded, terminated},
};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

/// Longest piece of remaining input quoted in a parse error.
const SNIPPET_LEN: usize = 24;
const END_OF_INPUT: &str = "end of input";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Parse error at byte {offset}: unexpected {snippet}")]
pub struct ParseError {
    pub offset: usize,
    pub snippet: String,
}

impl ParseError {
    /// True when the source ended in the middle of a form.
    pub fn is_unexpected_end(&self) -> bool {
        self.snippet == END_OF_INPUT
    }

    fn at(source: &str, remaining: &str) -> ParseError {
        let offset = source.len() - remaining.len();
        let snippet = if remaining.is_empty() {
            END_OF_INPUT.to_string()
        } else {
            let head: String = remaining.chars().take(SNIPPET_LEN).collect();
            format!("{:?}", head)
        };
        ParseError { offset, snippet }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || "()';\"".contains(c)
}

/// Succeeds without consuming when the next char ends a token.
fn at_delimiter(input: &str) -> IResult<&str, ()> {
    peek(alt((value((), eof), value((), satisfy(is_delimiter))))).parse(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize((char(';'), opt(is_not("\r\n")))).parse(input)
}

/// Whitespace and `;` line comments.
fn skip_trivia(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment)))).parse(input)
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || "+-.eE".contains(c)
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

// A whole token made of sign, digit, point and exponent characters with at
// least one digit. Whether it is really a number is decided in `parse_number`.
fn number_text(input: &str) -> IResult<&str, &str> {
    verify(
        terminated(take_while1(is_number_char), at_delimiter),
        |text: &str| text.contains(|c: char| c.is_ascii_digit()),
    )
    .parse(input)
}

// Integers and floats; anything number-like that does not read as one
// (`1+`, `1-2`, `e5`) is left to the symbol parser.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = number_text(input)?;
    if is_integer_text(text) {
        return match text.parse::<i64>() {
            Ok(i) => Ok((rest, Value::Integer(i))),
            Err(_) => {
                debug!(literal = text, "Integer literal out of range");
                Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Digit,
                )))
            }
        };
    }
    match text.parse::<f64>() {
        Ok(f) => Ok((rest, Value::Float(f))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

// `#\a`, `#\space`, `#\newline`, `#\tab`
fn parse_character(input: &str) -> IResult<&str, Value> {
    preceded(
        tag("#\\"),
        cut(alt((
            terminated(value(' ', tag("space")), at_delimiter),
            terminated(value('\n', tag("newline")), at_delimiter),
            terminated(value('\t', tag("tab")), at_delimiter),
            anychar,
        ))),
    )
    .map(Value::Character)
    .parse(input)
}

fn string_char(input: &str) -> IResult<&str, char> {
    alt((
        preceded(
            char('\\'),
            alt((
                value('\n', char('n')),
                value('\t', char('t')),
                value('\\', char('\\')),
                value('"', char('"')),
            )),
        ),
        none_of("\\\""),
    ))
    .parse(input)
}

fn parse_string(input: &str) -> IResult<&str, Value> {
    preceded(
        char('"'),
        cut(terminated(
            fold_many0(string_char, String::new, |mut text, c| {
                text.push(c);
                text
            }),
            char('"'),
        )),
    )
    .map(|text| Value::string(&text))
    .parse(input)
}

fn parse_symbol(input: &str) -> IResult<&str, Value> {
    verify(take_while1(|c: char| !is_delimiter(c)), |token: &str| {
        token != "."
    })
    .map(|token: &str| match token {
        "nil" => Value::Nil,
        _ => Value::symbol(token),
    })
    .parse(input)
}

/// `'x` → `(quote x)`, `#'x` → `(function x)`
fn parse_quoted(input: &str) -> IResult<&str, Value> {
    alt((
        preceded(tag("#'"), cut(preceded(skip_trivia, parse_expr_raw)))
            .map(|expr| Value::list([Value::symbol(FUNCTION), expr])),
        preceded(char('\''), cut(preceded(skip_trivia, parse_expr_raw)))
            .map(|expr| Value::list([Value::symbol(QUOTE), expr])),
    ))
    .parse(input)
}

fn parse_array(input: &str) -> IResult<&str, Value> {
    preceded(
        tag("#("),
        cut(terminated(
            many0(preceded(skip_trivia, parse_expr_raw)),
            preceded(skip_trivia, char(')')),
        )),
    )
    .map(|items| Value::Array(Rc::from(items)))
    .parse(input)
}

// Lists with an optional dotted tail: `(a b . c)`.
#[tracing::instrument(level = "trace", skip(input), fields(input = %input))]
fn parse_list(input: &str) -> IResult<&str, Value> {
    preceded(char('('), cut(list_body)).parse(input)
}

// Everything after the opening paren. Errors here are not backtracked.
fn list_body(input: &str) -> IResult<&str, Value> {
    let (input, items) = many0(preceded(skip_trivia, parse_expr_raw)).parse(input)?;
    let (input, tail) = if items.is_empty() {
        (input, None)
    } else {
        opt(preceded(
            (skip_trivia, char('.'), at_delimiter, skip_trivia),
            parse_expr_raw,
        ))
        .parse(input)?
    };
    let (input, _) = preceded(skip_trivia, char(')')).parse(input)?;
    trace!(count = items.len(), dotted = tail.is_some(), "Parsed list");
    Ok((input, Value::list_with_tail(items, tail.unwrap_or(Value::Nil))))
}

// One expression, no surrounding whitespace.
fn parse_expr_raw(input: &str) -> IResult<&str, Value> {
    alt((
        parse_string,
        parse_character,
        parse_quoted,
        parse_array,
        parse_list,
        parse_number,
        parse_symbol,
    ))
    .parse(input)
}

/// Parses one expression, consuming surrounding whitespace and comments.
#[tracing::instrument(level = "trace", skip(input), fields(input = %input))]
pub fn parse_expr(input: &str) -> IResult<&str, Value> {
    delimited(skip_trivia, parse_expr_raw, skip_trivia).parse(input)
}

/// Reads every top-level form in `source`.
pub fn parse_program(source: &str) -> Result<Vec<Value>, ParseError> {
    let mut forms = Vec::new();
    let mut remaining = source;
    loop {
        let (rest, ()) = skip_trivia(remaining).map_err(|_| ParseError::at(source, remaining))?;
        if rest.is_empty() {
            debug!(count = forms.len(), "Parsed program");
            return Ok(forms);
        }
        match parse_expr_raw(rest) {
            Ok((after, form)) => {
                forms.push(form);
                remaining = after;
            }
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                return Err(ParseError::at(source, deepest(rest, e.input)));
            }
            Err(nom::Err::Incomplete(_)) => return Err(ParseError::at(source, "")),
        }
    }
}

// `alt` reports the input of its last branch; prefer whichever position got further.
fn deepest<'a>(start: &'a str, reported: &'a str) -> &'a str {
    if reported.len() < start.len() {
        reported
    } else {
        start
    }
}
