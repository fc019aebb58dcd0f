//! Line-oriented circuit text format.
//!
//! ```text
//! port name=A width=1
//! comp id=G1 type=AND
//! input name=G1 index=0 value=1
//! connect from=A findex=0 to=G1 tindex=1
//! Out put=G1 kndex=0
//! ```

use std::str::FromStr;

use crate::definition::*;
use crate::error::ParseError;

/// Largest index or port width a record may carry. Bit vectors grow to cover
/// the highest index written, so unbounded values would exhaust memory.
pub const MAX_BIT_INDEX: usize = u16::MAX as usize;

/// The `key=value` fields of one line, in order of appearance.
struct Fields<'a> {
    line: usize,
    record: &'static str,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    fn new<I>(line: usize, record: &'static str, words: I) -> Self
    where
        I: Iterator<Item = &'a str>,
    {
        let pairs = words.filter_map(|word| word.split_once('=')).collect();
        Self {
            line,
            record,
            pairs,
        }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    fn text(&self, field: &'static str) -> Result<String, ParseError> {
        self.get(field)
            .map(str::to_string)
            .ok_or(ParseError::MissingField {
                line: self.line,
                record: self.record,
                field,
            })
    }

    fn number(&self, field: &'static str) -> Result<usize, ParseError> {
        let value = self.get(field).ok_or(ParseError::MissingField {
            line: self.line,
            record: self.record,
            field,
        })?;
        self.parse_number(field, value)
    }

    fn number_or(&self, field: &'static str, default: usize) -> Result<usize, ParseError> {
        match self.get(field) {
            Some(value) => self.parse_number(field, value),
            None => Ok(default),
        }
    }

    fn parse_number(&self, field: &'static str, value: &str) -> Result<usize, ParseError> {
        match value.parse() {
            Ok(number) if number <= MAX_BIT_INDEX => Ok(number),
            _ => Err(ParseError::InvalidNumber {
                line: self.line,
                field,
                value: value.to_string(),
            }),
        }
    }

    fn bit(&self, field: &'static str) -> Result<bool, ParseError> {
        match self.text(field)?.as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(ParseError::InvalidBit {
                line: self.line,
                value: other.to_string(),
            }),
        }
    }
}

/// Parses one line. `line` is the 1-based line number used in errors.
pub fn parse_line(text: &str, line: usize) -> Result<Record, ParseError> {
    let mut words = text.split_whitespace();
    let keyword = match words.next() {
        Some(keyword) if !keyword.starts_with('#') => keyword,
        _ => return Ok(Record::Ignored),
    };
    let record = match keyword {
        "comp" => {
            let fields = Fields::new(line, "comp", words);
            Record::Component(Component {
                id: fields.text("id")?,
                kind: ComponentKind::from(fields.text("type")?.as_str()),
            })
        }
        "input" => {
            let fields = Fields::new(line, "input", words);
            Record::Input(InputSignal {
                name: fields.text("name")?,
                index: fields.number("index")?,
                value: fields.bit("value")?,
            })
        }
        "connect" => {
            let fields = Fields::new(line, "connect", words);
            Record::Connection(Connection {
                from: fields.text("from")?,
                from_index: fields.number("findex")?,
                to: fields.text("to")?,
                to_index: fields.number("tindex")?,
            })
        }
        "Out" => {
            let fields = Fields::new(line, "Out", words);
            Record::Output(OutputSpec {
                pin: fields.text("put")?,
                index: fields.number("kndex")?,
            })
        }
        "port" => {
            let fields = Fields::new(line, "port", words);
            Record::Port(Port {
                name: fields.text("name")?,
                width: fields.number_or("width", 1)?,
            })
        }
        _ => Record::Ignored,
    };
    Ok(record)
}

pub fn parse_records(text: &str) -> Result<Vec<Record>, ParseError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| parse_line(line, i + 1))
        .collect()
}

pub fn parse_definition(text: &str) -> Result<CircuitDefinition, ParseError> {
    Ok(CircuitDefinition::from_records(parse_records(text)?)?)
}

impl FromStr for CircuitDefinition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_definition(s)
    }
}
