//! Remote Command Protocol
//!
//! Text commands of the form `NAME;param;"quoted param"` are parsed into a
//! [`Command`], executed against the plugin manager, and answered with
//! `ACK[;field]*` or `NACK;"reason"`.

mod parser;
mod processor;

pub use parser::{Command, DurationValue, ParseError, tokenize};
pub use processor::CommandProcessor;

use std::fmt;

/// Field delimiter of requests and responses
pub const DELIMITER: char = ';';

/// Reply to a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Success, with already encoded fields
    Ack(Vec<String>),
    /// Failure, with a human readable reason
    Nack(String),
}

impl Response {
    /// Acknowledgement without fields
    pub fn ack() -> Self {
        Self::Ack(Vec::new())
    }

    pub fn nack(reason: impl fmt::Display) -> Self {
        Self::Nack(reason.to_string())
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack(_))
    }

    /// Append a bare field (numbers, flags)
    pub fn with(mut self, field: impl fmt::Display) -> Self {
        if let Self::Ack(fields) = &mut self {
            fields.push(field.to_string());
        }
        self
    }

    /// Append a quoted string field
    pub fn with_quoted(self, field: &str) -> Self {
        self.with(quote(field))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack(fields) => {
                f.write_str("ACK")?;
                for field in fields {
                    write!(f, "{DELIMITER}{field}")?;
                }
                Ok(())
            }
            Self::Nack(reason) => write!(f, "NACK{DELIMITER}{}", quote(reason)),
        }
    }
}

/// Quote a string, escaping `"` and `\`
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
