//! Decoding of received protocol lines
//!
//! A line beginning with `:` is a response-class line and becomes a
//! [`Message`]:
//!
//!   `:`sender SPACE command *(SPACE param) [SPACE `:` trailing]
//!
//! Any other line is a bare [`Directive`] (such as the keepalive probe) that
//! the engine answers itself.

use crate::error::BotError;
use crate::utils::nick_of;
use serde::Serialize;
use std::fmt;

/// One decoded response-class line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Originating identity, `nick` or `nick!user@host`
    pub sender: String,
    pub command: String,
    pub params: Vec<String>,
    /// Free-form payload after the first standalone `:`; empty if absent
    pub trailing: String,
}

/// A bare protocol instruction such as `PING <token>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub argument: String,
}

/// Result of decoding one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Message(Message),
    Directive(Directive),
}

impl Message {
    /// Decode one line with its terminator already stripped
    pub fn parse(line: &str) -> Result<Parsed, BotError> {
        let Some(body) = line.strip_prefix(':') else {
            return Ok(Parsed::Directive(Directive::from_line(line)));
        };

        let (head, trailing) = match body.find(" :") {
            Some(idx) => (&body[..idx], &body[idx + 2..]),
            None => (body, ""),
        };

        let mut tokens = head.split_whitespace();
        let (Some(sender), Some(command)) = (tokens.next(), tokens.next()) else {
            return Err(BotError::Parse {
                line: line.to_string(),
                reason: "expected a sender and a command".to_string(),
            });
        };

        Ok(Parsed::Message(Message {
            sender: sender.to_string(),
            command: command.to_string(),
            params: tokens.map(str::to_string).collect(),
            trailing: trailing.to_string(),
        }))
    }

    /// Nickname of the sender without the `!user@host` part
    pub fn nick(&self) -> &str {
        nick_of(&self.sender)
    }

    /// First positional parameter, usually the target channel or user
    pub fn target(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{} {}", self.sender, self.command)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        if !self.trailing.is_empty() {
            write!(f, " :{}", self.trailing)?;
        }
        Ok(())
    }
}

impl Directive {
    /// Split a bare line into its name and the rest
    pub fn from_line(line: &str) -> Self {
        let (name, argument) = line.split_once(' ').unwrap_or((line, ""));
        Self {
            name: name.to_string(),
            argument: argument.to_string(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.argument.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} {}", self.name, self.argument)
        }
    }
}
