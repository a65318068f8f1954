//! Outbound protocol lines

use std::fmt;

/// A line the client sends to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pass(String),
    User(String),
    Nick(String),
    Privmsg { target: String, text: String },
    Pong(String),
    Quit,
}

impl Command {
    /// Render the command as it goes on the wire, without the terminator
    pub fn to_wire(&self) -> String {
        match self {
            Command::Pass(credential) => format!("PASS {}", credential),
            Command::User(identity) => format!("USER {}", identity),
            Command::Nick(identity) => format!("NICK {}", identity),
            Command::Privmsg { target, text } => format!("PRIVMSG {} :{}", target, text),
            Command::Pong(token) => format!("PONG {}", token),
            Command::Quit => "QUIT".to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Pass(_) => "PASS",
            Command::User(_) => "USER",
            Command::Nick(_) => "NICK",
            Command::Privmsg { .. } => "PRIVMSG",
            Command::Pong(_) => "PONG",
            Command::Quit => "QUIT",
        }
    }
}

/// Log-safe rendering; the credential of `PASS` is masked
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pass(_) => f.write_str("PASS ********"),
            other => f.write_str(&other.to_wire()),
        }
    }
}
