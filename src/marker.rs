//! Decorator records and traceability-marker detection.

use std::fmt;

use nom::{
    character::complete::{char, space0},
    combinator::all_consuming,
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::ConfigError;
use crate::scanner::lines::parse_identifier;
use crate::scanner::DefinitionBlock;

/// Canonical name of the marker managed by default.
pub const DEFAULT_MARKER: &str = "pytest.mark.test_id";

/// One decorator of a definition block, as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator<'a> {
    /// All physical lines of the decorator, indentation included, without
    /// the final terminator.
    pub raw: &'a str,
    /// Dotted path before the argument list, with inner whitespace removed.
    pub name: String,
    /// Everything after the name, verbatim.
    pub arguments: &'a str,
    /// 0-based index of the first physical line.
    pub line: usize,
}

impl<'a> Decorator<'a> {
    pub fn parse(raw: &'a str, line: usize) -> Self {
        let expr = raw.trim_start();
        match parse_decorator_name(expr) {
            Ok((rest, parts)) => Self {
                raw,
                name: parts.join("."),
                arguments: rest.trim_start(),
                line,
            },
            // Arbitrary expressions (`@handlers[0]`) keep their text as name.
            Err(_) => Self {
                raw,
                name: expr.trim_start_matches('@').trim().to_string(),
                arguments: "",
                line,
            },
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.raw.contains('\n')
    }
}

/// `foo . bar.baz` as its parts.
pub fn parse_dotted_name(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(delimited(space0, char('.'), space0), parse_identifier)(input)
}

fn parse_decorator_name(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(preceded(char('@'), space0), parse_dotted_name)(input)
}

/// A validated dotted marker name such as `pytest.mark.test_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerName(String);

impl MarkerName {
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        all_consuming(parse_dotted_name)(name.trim())
            .map(|(_, parts)| Self(parts.join(".")))
            .map_err(|_| ConfigError::InvalidMarker(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MarkerName {
    fn default() -> Self {
        Self(DEFAULT_MARKER.to_string())
    }
}

impl fmt::Display for MarkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answers whether a definition block already carries the marker.
#[derive(Debug, Clone, Default)]
pub struct MarkerDetector {
    marker: MarkerName,
}

impl MarkerDetector {
    pub fn new(marker: MarkerName) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> &MarkerName {
        &self.marker
    }

    /// First decorator whose canonical name equals the marker's.
    pub fn find<'b, 'a>(&self, block: &'b DefinitionBlock<'a>) -> Option<&'b Decorator<'a>> {
        block
            .decorators
            .iter()
            .find(|d| d.name == self.marker.as_str())
    }

    pub fn is_marked(&self, block: &DefinitionBlock<'_>) -> bool {
        self.find(block).is_some()
    }

    /// `<indent>@<marker>('<id>')`
    pub fn render(&self, indent: &str, id: &str) -> String {
        format!("{}@{}('{}')", indent, self.marker, id)
    }
}
