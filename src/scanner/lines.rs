//! Classifiers for the first line of a logical statement.
//!
//! Each parser runs on the line body, i.e. after the indentation.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, space0, space1},
    combinator::{opt, recognize},
    sequence::{pair, terminated, tuple},
    IResult,
};

/// What a statement-starting line introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Decorator,
    Definition { name: &'a str, is_async: bool },
    Container { name: &'a str },
    Other,
}

/// Classify a line body.
pub fn classify(body: &str) -> LineKind<'_> {
    if let Ok((_, ())) = parse_decorator_start(body) {
        return LineKind::Decorator;
    }
    if let Ok((_, (is_async, name))) = parse_definition(body) {
        return LineKind::Definition { name, is_async };
    }
    if let Ok((_, name)) = parse_container(body) {
        return LineKind::Container { name };
    }
    LineKind::Other
}

/// Parse a Python identifier.
pub fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// `@` introducing a decorator.
fn parse_decorator_start(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('@')(input)?;
    Ok((input, ()))
}

/// `def name(` or `async def name(`, where a type parameter list
/// `def name[T](` may open on this line and close on a later one.
fn parse_definition(input: &str) -> IResult<&str, (bool, &str)> {
    let (input, is_async) = opt(terminated(tag("async"), space1))(input)?;
    let (input, (_, _, name, _)) = tuple((tag("def"), space1, parse_identifier, space0))(input)?;
    let (input, _) = alt((char('('), char('[')))(input)?;
    Ok((input, (is_async.is_some(), name)))
}

/// `class Name` followed by `(`, `:` or a type parameter list.
fn parse_container(input: &str) -> IResult<&str, &str> {
    let (input, (_, _, name, _)) = tuple((tag("class"), space1, parse_identifier, space0))(input)?;
    let (input, _) = alt((char('('), char(':'), char('[')))(input)?;
    Ok((input, name))
}
