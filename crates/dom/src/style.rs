//! Parsers for the inline `style` attribute.
//!
//! Only declarations are understood (`name: value; ...`), there is no
//! selector matching. Malformed declarations are skipped, never fatal.

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::{map, opt};
use nom::multi::separated_list0;
use nom::number::complete::float;
use nom::sequence::delimited;
use nom::{IResult, Parser};

/// One `name: value` pair. Names are lowercased, values trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

/// The parsed declarations of a `style` attribute, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(input: &str) -> Self {
        match declarations(input) {
            Ok((_, declarations)) => Self { declarations },
            Err(e) => {
                log::warn!("Ignoring unparsable style attribute '{}': {}", input, e);
                Self::default()
            }
        }
    }

    /// The last value declared for `name`, as the cascade would pick it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    pub fn length(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(parse_length)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

// --- Helper Parsers ---

fn property_name(input: &str) -> IResult<&str, &str> {
    delimited(
        multispace0,
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        multispace0,
    )
    .parse(input)
}

fn declaration(input: &str) -> IResult<&str, Declaration> {
    let (input, (name, _, value)) =
        (property_name, char(':'), take_while(|c: char| c != ';')).parse(input)?;
    Ok((
        input,
        Declaration {
            name: name.to_ascii_lowercase(),
            value: value.trim().to_string(),
        },
    ))
}

fn declarations(input: &str) -> IResult<&str, Vec<Declaration>> {
    let entry = alt((
        map(declaration, Some),
        map(take_while(|c: char| c != ';'), |_| None),
    ));
    let (rest, entries) = separated_list0(char(';'), entry).parse(input)?;
    Ok((rest, entries.into_iter().flatten().collect()))
}

// --- Unit & Dimension Parsers ---

fn unit(input: &str) -> IResult<&str, f32> {
    alt((
        map(tag_no_case("px"), |_| 1.0),
        map(tag_no_case("pt"), |_| 96.0 / 72.0),
        map(tag_no_case("in"), |_| 96.0),
        map(tag_no_case("cm"), |_| 96.0 / 2.54),
        map(tag_no_case("mm"), |_| 96.0 / 25.4),
    ))
    .parse(input)
}

/// Parses a length such as `12px`, `9pt` or a bare number, in pixels.
pub fn parse_length(input: &str) -> Option<f32> {
    let (rest, (value, scale)) = (float, opt(unit)).parse(input.trim()).ok()?;
    if !rest.trim().is_empty() {
        return None;
    }
    Some(value * scale.unwrap_or(1.0))
}
