//! Owned IRC message.

use std::fmt;
use std::str::FromStr;

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

use super::nom_parser::ParsedMessage;

/// A received IRC line, parsed.
///
/// The command is normalized to uppercase. The raw line (without CR/LF)
/// is kept because consumers capture and forward it verbatim.
#[derive(Clone, PartialEq, Debug)]
pub struct Message {
    raw: String,
    /// Raw IRCv3 tags (without the leading `@`).
    pub tags: Option<String>,
    /// Origin of the message.
    pub prefix: Option<Prefix>,
    /// Command name or three-digit numeric, uppercased.
    pub command: String,
    /// RFC parameters, trailing parameter last.
    pub params: Vec<String>,
    arguments: String,
}

impl Message {
    /// The line as received, without line terminators.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Raw argument text after the command.
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Argument text split on whitespace.
    ///
    /// Unlike [`Message::params`] this does not merge the trailing
    /// parameter: `me bob :End of list` yields `["me", "bob", ":End",
    /// "of", "list"]`.
    pub fn argument_tokens(&self) -> Vec<&str> {
        self.arguments.split_whitespace().collect()
    }

    /// Nick of the sender, if the message has a prefix.
    pub fn nick(&self) -> Option<&str> {
        self.prefix.as_ref().map(Prefix::nick)
    }

    /// Full prefix text (`nick!user@host`), if any.
    pub fn host(&self) -> Option<&str> {
        self.prefix.as_ref().map(Prefix::as_str)
    }

    /// First parameter, usually the target of the command.
    pub fn target(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    /// Whether the command is a three-digit numeric reply.
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        let parsed =
            ParsedMessage::parse(line).map_err(|position| ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::InvalidCommand { position },
            })?;

        Ok(Message {
            raw: line.to_owned(),
            tags: parsed.tags.map(str::to_owned),
            prefix: parsed.prefix.map(Prefix::new),
            command: parsed.command.to_ascii_uppercase(),
            params: parsed.params.iter().map(|p| (*p).to_owned()).collect(),
            arguments: parsed.arguments.to_owned(),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
