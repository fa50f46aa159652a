//! parse task document with structure like
//! ```text
//! title1
//! key1: value1, value2
//! key2: value 3; key3: value4
//! title2
//! key4: x^2 + y, 0
//! ```
//! into HashMap<String, HashMap<String, Option<Vec<Value>>>>. A title stands alone on its line,
//! a value runs to the next `,`, `;` or line end (so symbolic expressions may contain spaces).
//! Lines starting with `//`, `#` or `%` are comments.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, line_ending, multispace0, space0},
    combinator::{eof, map, map_res, recognize},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;

pub type DocumentMap = HashMap<String, SectionMap>;
pub type SectionMap = HashMap<String, Option<Vec<Value>>>;

/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    pub fn to_string_value(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(f) => f.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

fn identifier(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

/// Parses a title: an identifier alone on its line
pub(crate) fn parse_title(input: &str) -> IResult<&str, String> {
    let (input, _) = space0(input)?;
    let (input, title) = identifier(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = alt((line_ending, eof)).parse(input)?;
    Ok((input, title))
}

/// Parses a key (word characters without spaces)
pub(crate) fn parse_key(input: &str) -> IResult<&str, String> {
    identifier(input)
}

/// Parses a single value; everything up to `,` `;` or the line end, trimmed
pub(crate) fn parse_value(input: &str) -> IResult<&str, Value> {
    let value_parser = take_while1(|c: char| !matches!(c, ',' | ';' | '\n' | '\r'));
    let mut value_parser = map_res(value_parser, |s: &str| -> Result<Value, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty value".to_string());
        }
        if let Ok(val) = s.parse::<i64>() {
            Ok(Value::Integer(val))
        } else if let Ok(val) = s.parse::<f64>() {
            Ok(Value::Float(val))
        } else if let Ok(val) = s.parse::<bool>() {
            Ok(Value::Boolean(val))
        } else {
            Ok(Value::String(s.to_string()))
        }
    });
    value_parser.parse(input)
}

pub(crate) fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    separated_list1(tag(","), parse_value).parse(input)
}

/// Parses `key: value, value` up to and including its terminator (`;`, line end or end of input)
pub(crate) fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon_separator = delimited(space0, tag(":"), space0);
    let pair_parser = separated_pair(parse_key, colon_separator, parse_value_list);
    let mut parser = delimited(space0, pair_parser, alt((tag(";"), line_ending, eof)));
    parser.parse(input)
}

/// Parses a section with a title and one or more key-value pairs.
/// A key repeated inside one section keeps its last value.
pub(crate) fn parse_section(input: &str) -> IResult<&str, (String, SectionMap)> {
    let (input, title) = parse_title(input)?;
    let mut parser = many1(preceded(multispace0, parse_key_value_pair));
    let (input, pairs) = parser.parse(input)?;

    let mut section_map = HashMap::new();
    for (key, values) in pairs {
        section_map.insert(key, Some(values));
    }
    Ok((input, (title, section_map)))
}

/// Filters out comment lines (starting with //, #, or %) and blank lines
pub(crate) fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

fn parse_sections(input: &str) -> IResult<&str, Vec<(String, SectionMap)>> {
    let mut parser = terminated(
        many1(preceded(multispace0, parse_section)),
        multispace0,
    );
    parser.parse(input)
}

/// Parses the entire document into a HashMap. The whole input must be consumed and
/// section titles must be unique.
pub fn parse_document(input: &str) -> Result<DocumentMap, String> {
    let filtered = filter_comments(input);
    let (remaining, sections) =
        parse_sections(&filtered).map_err(|e| format!("Parsing error: {:?}", e))?;
    if !remaining.trim().is_empty() {
        return Err(format!(
            "Failed to parse entire document. Remaining: '{}'",
            remaining
        ));
    }
    let mut result = HashMap::new();
    for (title, section_map) in sections {
        if result.contains_key(&title) {
            return Err(format!("section '{}' appears twice", title));
        }
        result.insert(title, section_map);
    }
    Ok(result)
}

/// Parses a document and makes sure every title and key of `template` is present,
/// missing keys become `None`.
pub fn parse_document_as(
    input: &str,
    template: Option<&DocumentMap>,
) -> Result<DocumentMap, String> {
    let mut parsed = parse_document(input)?;
    if let Some(template) = template {
        for (title, keys_map) in template {
            let section_map = parsed.entry(title.clone()).or_default();
            for key in keys_map.keys() {
                section_map.entry(key.clone()).or_insert(None);
            }
        }
    }
    Ok(parsed)
}

/// Parses the document and converts all values to strings
pub fn parse_document_as_strings(
    input: &str,
) -> Result<HashMap<String, HashMap<String, Option<Vec<String>>>>, String> {
    let value_map = parse_document(input)?;
    Ok(value_map
        .into_iter()
        .map(|(title, section_map)| {
            let string_section = section_map
                .into_iter()
                .map(|(key, value_opt)| {
                    let strings = value_opt.map(|values| {
                        values
                            .iter()
                            .map(Value::to_string_value)
                            .collect::<Vec<String>>()
                    });
                    (key, strings)
                })
                .collect();
            (title, string_section)
        })
        .collect())
}
