//! `//replace` command grammar
//!
//! ```text
//! command  = "//replace" ws base ws entry ("," entry)*
//! entry    = percent "%" block [ "[" prop ("," prop)* "]" ]
//! prop     = key "=" value
//! ```
//!
//! [`ReplaceCommand`] is the typed form. Its `Display` impl is the canonical
//! rendering used by the synthesizer; [`parse_replace_command`] reads the same
//! text back so generated or hand-written commands can be inspected.

use std::fmt;

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{char as pchar, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, verify},
    multi::separated_list1,
    sequence::{delimited, separated_pair, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const COMMAND_PREFIX: &str = "//replace";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandEntry {
    pub percent: u8,
    pub block: String,
    pub properties: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplaceCommand {
    pub base: String,
    pub entries: Vec<CommandEntry>,
}

impl ReplaceCommand {
    /// Sum of the emitted percentages (not necessarily 100).
    pub fn total_percent(&self) -> u32 {
        self.entries.iter().map(|e| e.percent as u32).sum()
    }
}

impl fmt::Display for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%{}", self.percent, self.block)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{key}={value}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReplaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COMMAND_PREFIX} {} ", self.base)?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid replace command at byte {offset}: {message}")]
pub struct CommandParseError {
    pub offset: usize,
    pub message: String,
}

// ============================================================================
// Parser
// ============================================================================

/// Characters allowed in a block identifier.
pub fn is_block_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-' | '/')
}

/// Characters allowed in a state key or value.
pub fn is_state_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn block_id(input: &str) -> IResult<&str, &str> {
    take_while1(is_block_char)(input)
}

fn state_token(input: &str) -> IResult<&str, &str> {
    take_while1(is_state_char)(input)
}

fn percent(input: &str) -> IResult<&str, u8> {
    verify(map_res(digit1, str::parse::<u8>), |p: &u8| *p <= 100)(input)
}

fn property(input: &str) -> IResult<&str, (String, String)> {
    map(
        separated_pair(state_token, pchar('='), state_token),
        |(k, v): (&str, &str)| (k.to_string(), v.to_string()),
    )(input)
}

fn property_clause(input: &str) -> IResult<&str, Vec<(String, String)>> {
    delimited(pchar('['), separated_list1(pchar(','), property), pchar(']'))(input)
}

fn entry(input: &str) -> IResult<&str, CommandEntry> {
    map(
        tuple((percent, pchar('%'), block_id, opt(property_clause))),
        |(percent, _, block, properties)| CommandEntry {
            percent,
            block: block.to_string(),
            properties: properties.unwrap_or_default(),
        },
    )(input)
}

fn command(input: &str) -> IResult<&str, ReplaceCommand> {
    map(
        tuple((
            multispace0,
            tag(COMMAND_PREFIX),
            multispace1,
            block_id,
            multispace1,
            separated_list1(pchar(','), entry),
            multispace0,
        )),
        |(_, _, _, base, _, entries, _)| ReplaceCommand {
            base: base.to_string(),
            entries,
        },
    )(input)
}

pub fn parse_replace_command(text: &str) -> Result<ReplaceCommand, CommandParseError> {
    match all_consuming(command)(text) {
        Ok((_, cmd)) => Ok(cmd),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(CommandParseError {
            offset: text.len() - e.input.len(),
            message: describe(e.code, e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(CommandParseError {
            offset: text.len(),
            message: "unexpected end of input".to_string(),
        }),
    }
}

fn describe(code: nom::error::ErrorKind, rest: &str) -> String {
    let near: String = rest.chars().take(16).collect();
    if near.is_empty() {
        format!("{code:?} at end of input")
    } else {
        format!("{code:?} near `{near}`")
    }
}
