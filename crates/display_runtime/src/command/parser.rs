//! Command line parsing
//!
//! Parsing is strict: any malformed field rejects the whole command before it
//! reaches the plugin manager.

use std::iter::Peekable;
use std::str::{Chars, FromStr};
use std::time::Duration;

use serde_json::Value;

use super::DELIMITER;
use crate::plugin::Uid;

/// Errors produced while parsing a command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing closing quote")]
    UnterminatedQuote,

    #[error("unexpected quote in field {0}")]
    UnexpectedQuote(usize),

    #[error("invalid escape sequence in field {0}")]
    InvalidEscape(usize),

    #[error("{command} expects {expected} parameter(s), got {got}")]
    Arity {
        command: String,
        expected: String,
        got: usize,
    },

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("invalid flag: {0}")]
    InvalidFlag(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

/// Split a command line into unquoted fields
///
/// Fields are separated by `;`. A field is either bare (surrounding spaces are
/// trimmed) or fully enclosed in double quotes, where `\"` and `\\` escape.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut chars = line.chars().peekable();
    let mut fields = Vec::new();

    loop {
        let index = fields.len();
        skip_spaces(&mut chars);

        let field = if chars.peek() == Some(&'"') {
            chars.next();
            let value = quoted_field(&mut chars, index)?;
            skip_spaces(&mut chars);
            if chars.peek().is_some_and(|c| *c != DELIMITER) {
                return Err(ParseError::UnexpectedQuote(index));
            }
            value
        } else {
            let mut value = String::new();
            while let Some(&c) = chars.peek() {
                if c == DELIMITER {
                    break;
                }
                if c == '"' {
                    return Err(ParseError::UnexpectedQuote(index));
                }
                value.push(c);
                chars.next();
            }
            value.trim_end().to_string()
        };
        fields.push(field);

        // Only the delimiter or the end of the line can follow a field
        if chars.next().is_none() {
            break;
        }
    }

    Ok(fields)
}

fn skip_spaces(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| *c == ' ' || *c == '\t') {
        chars.next();
    }
}

fn quoted_field(chars: &mut Peekable<Chars<'_>>, index: usize) -> Result<String, ParseError> {
    let mut value = String::new();
    loop {
        match chars.next() {
            None => return Err(ParseError::UnterminatedQuote),
            Some('"') => return Ok(value),
            Some('\\') => match chars.next() {
                Some(c @ ('"' | '\\')) => value.push(c),
                Some(_) => return Err(ParseError::InvalidEscape(index)),
                None => return Err(ParseError::UnterminatedQuote),
            },
            Some(c) => value.push(c),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// New duration for the `DURATION` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationValue {
    /// Drop the override and use the configured default
    Default,
    /// Custom duration; zero means infinite
    Custom(Duration),
}

/// A parsed remote command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Install { type_name: String },
    Uninstall { uid: Uid },
    Enable { uid: Uid },
    Disable { uid: Uid },
    Lock { uid: Uid },
    Unlock { uid: Uid },
    Move { uid: Uid, slot: usize, swap: bool },
    /// Query (`None`) or change the duration
    Duration { uid: Uid, value: Option<DurationValue> },
    /// Query (`None`) or change the alias
    Alias { uid: Uid, alias: Option<String> },
    Activate { slot: usize },
    Slots,
    Plugins,
    Topics { uid: Uid },
    GetTopic { uid: Uid, topic: String },
    SetTopic { uid: Uid, topic: String, value: Value },
}

impl Command {
    /// Parse a full command line; names are case-insensitive
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let fields = tokenize(line)?;
        let (name, params) = fields.split_first().ok_or(ParseError::Empty)?;
        let name = name.to_ascii_uppercase();
        let args = Args {
            command: &name,
            params,
        };

        let command = match name.as_str() {
            "INSTALL" => {
                args.arity(1, 1)?;
                Self::Install {
                    type_name: params[0].clone(),
                }
            }
            "UNINSTALL" => Self::Uninstall { uid: args.uid()? },
            "ENABLE" => Self::Enable { uid: args.uid()? },
            "DISABLE" => Self::Disable { uid: args.uid()? },
            "LOCK" => Self::Lock { uid: args.uid()? },
            "UNLOCK" => Self::Unlock { uid: args.uid()? },
            "MOVE" => {
                args.arity(2, 3)?;
                Self::Move {
                    uid: number(&params[0])?,
                    slot: number(&params[1])?,
                    swap: params.get(2).map(|p| flag(p)).transpose()?.unwrap_or(false),
                }
            }
            "DURATION" => {
                args.arity(1, 2)?;
                let value = match params.get(1).map(String::as_str) {
                    None => None,
                    Some(p) if p.eq_ignore_ascii_case("default") => Some(DurationValue::Default),
                    Some(p) => Some(DurationValue::Custom(Duration::from_millis(number(p)?))),
                };
                Self::Duration {
                    uid: number(&params[0])?,
                    value,
                }
            }
            "ALIAS" => {
                args.arity(1, 2)?;
                Self::Alias {
                    uid: number(&params[0])?,
                    alias: params.get(1).cloned(),
                }
            }
            "ACTIVATE" => {
                args.arity(1, 1)?;
                Self::Activate {
                    slot: number(&params[0])?,
                }
            }
            "SLOTS" => {
                args.arity(0, 0)?;
                Self::Slots
            }
            "PLUGINS" => {
                args.arity(0, 0)?;
                Self::Plugins
            }
            "TOPICS" => Self::Topics { uid: args.uid()? },
            "GET_TOPIC" => {
                args.arity(2, 2)?;
                Self::GetTopic {
                    uid: number(&params[0])?,
                    topic: params[1].clone(),
                }
            }
            "SET_TOPIC" => {
                args.arity(3, 3)?;
                Self::SetTopic {
                    uid: number(&params[0])?,
                    topic: params[1].clone(),
                    value: serde_json::from_str(&params[2])
                        .map_err(|e| ParseError::InvalidJson(e.to_string()))?,
                }
            }
            _ => return Err(ParseError::UnknownCommand(name.clone())),
        };

        Ok(command)
    }

    /// Protocol name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install { .. } => "INSTALL",
            Self::Uninstall { .. } => "UNINSTALL",
            Self::Enable { .. } => "ENABLE",
            Self::Disable { .. } => "DISABLE",
            Self::Lock { .. } => "LOCK",
            Self::Unlock { .. } => "UNLOCK",
            Self::Move { .. } => "MOVE",
            Self::Duration { .. } => "DURATION",
            Self::Alias { .. } => "ALIAS",
            Self::Activate { .. } => "ACTIVATE",
            Self::Slots => "SLOTS",
            Self::Plugins => "PLUGINS",
            Self::Topics { .. } => "TOPICS",
            Self::GetTopic { .. } => "GET_TOPIC",
            Self::SetTopic { .. } => "SET_TOPIC",
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Args<'a> {
    command: &'a str,
    params: &'a [String],
}

impl Args<'_> {
    fn arity(&self, min: usize, max: usize) -> Result<(), ParseError> {
        let got = self.params.len();
        if (min..=max).contains(&got) {
            return Ok(());
        }
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        Err(ParseError::Arity {
            command: self.command.to_string(),
            expected,
            got,
        })
    }

    /// Single uid parameter
    fn uid(&self) -> Result<Uid, ParseError> {
        self.arity(1, 1)?;
        number(&self.params[0])
    }
}

fn number<T: FromStr>(value: &str) -> Result<T, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::InvalidNumber(value.to_string()))
}

fn flag(value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ParseError::InvalidFlag(value.to_string())),
    }
}
