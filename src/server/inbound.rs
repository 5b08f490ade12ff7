//! Inbound line pipeline: redirects first, then protocol state, then
//! ignore rules.

use slirc_proto::{Isupport, Message, ProtocolError};
use tracing::{debug, warn};

use super::{Priority, Server};
use crate::ignore::IgnoreList;
use crate::metrics;

/// What happened to an inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Captured by a redirect; not to be displayed.
    Redirected,
    /// Suppressed by an ignore rule.
    Ignored,
    /// To be displayed normally.
    Display(Message),
}

impl Server {
    /// Process one line received from the server.
    pub fn receive(
        &mut self,
        line: &str,
        ignores: &IgnoreList,
        now: i64,
    ) -> Result<Inbound, ProtocolError> {
        let message: Message = line.parse()?;

        let outcome = self.redirects.route(&self.name, &message);
        self.emit(outcome.completed);
        if outcome.consumed {
            metrics::record_consumed();
            return Ok(Inbound::Redirected);
        }

        self.track_state(&message, now);

        if self.is_message_ignored(ignores, &message) {
            metrics::record_ignored();
            return Ok(Inbound::Ignored);
        }
        Ok(Inbound::Display(message))
    }

    /// Parse a raw line and check it against `ignores`.
    pub fn is_line_ignored(&self, ignores: &IgnoreList, line: &str) -> Result<bool, ProtocolError> {
        let message: Message = line.parse()?;
        Ok(self.is_message_ignored(ignores, &message))
    }

    /// Whether a parsed message is suppressed by `ignores`.
    ///
    /// The first parameter is taken as the channel and the full prefix as
    /// the host. Messages without a prefix are never ignored.
    pub fn is_message_ignored(&self, ignores: &IgnoreList, message: &Message) -> bool {
        if message.prefix.is_none() || ignores.is_empty() {
            return false;
        }
        ignores.is_ignored(
            &self.ignore_scope(),
            message.target(),
            message.nick(),
            message.host(),
        )
    }

    fn track_state(&mut self, message: &Message, now: i64) {
        match message.command.as_str() {
            "001" => {
                if let Some(nick) = message.target() {
                    debug!(server = %self.name, nick = %nick, "Registered");
                    self.nick = Some(nick.to_string());
                }
            }
            "005" => self.apply_isupport(message),
            "NICK" => {
                let renamed = match (message.nick(), self.nick.as_deref()) {
                    (Some(from), Some(own)) => self.casemapping.eq(from, own),
                    _ => false,
                };
                if let (true, Some(new_nick)) = (renamed, message.params.first()) {
                    self.nick = Some(new_nick.clone());
                }
            }
            "PING" => {
                let reply = match message.params.first() {
                    Some(token) => format!("PONG :{token}"),
                    None => "PONG".to_string(),
                };
                self.send(&reply, Priority::Immediate, now);
            }
            _ => {}
        }
    }

    fn apply_isupport(&mut self, message: &Message) {
        let Some(isupport) = Isupport::from_response_args(&message.params) else {
            return;
        };
        if let Some(value) = isupport.casemapping() {
            match value.parse() {
                Ok(casemapping) => self.casemapping = casemapping,
                Err(e) => warn!(server = %self.name, error = %e, "Keeping current casemapping"),
            }
        }
        if let Some(chantypes) = isupport.chantypes() {
            self.chantypes = chantypes.to_string();
        }
    }
}
