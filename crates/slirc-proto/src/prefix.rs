//! IRC message prefix.
//!
//! The prefix identifies the origin of a message: a server name or a
//! user's `nick!user@host`.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

/// Origin of a message, kept as received.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefix {
    raw: String,
}

impl Prefix {
    /// Wrap a prefix string (without the leading `:`).
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The full prefix, e.g. `nick!user@host`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Nickname (or server name): everything before the first `!`.
    pub fn nick(&self) -> &str {
        match self.raw.find('!') {
            Some(pos) => &self.raw[..pos],
            None => &self.raw,
        }
    }

    /// Address (`user@host`): everything after the first `!`, if any.
    pub fn address(&self) -> Option<&str> {
        self.raw.find('!').map(|pos| &self.raw[pos + 1..])
    }

    /// Username part of `nick!user@host`, if present.
    pub fn user(&self) -> Option<&str> {
        let address = self.address()?;
        Some(match address.find('@') {
            Some(pos) => &address[..pos],
            None => address,
        })
    }

    /// Hostname part after the `@`, if present.
    pub fn hostname(&self) -> Option<&str> {
        self.raw.rfind('@').map(|pos| &self.raw[pos + 1..])
    }

    /// Whether the prefix looks like a server name (a dot, no `!` or `@`).
    pub fn is_server(&self) -> bool {
        self.raw.contains('.') && !self.raw.contains('!') && !self.raw.contains('@')
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_user_prefix() {
        let prefix = Prefix::new("nick!user@host.example");
        assert_eq!(prefix.nick(), "nick");
        assert_eq!(prefix.address(), Some("user@host.example"));
        assert_eq!(prefix.user(), Some("user"));
        assert_eq!(prefix.hostname(), Some("host.example"));
        assert!(!prefix.is_server());
    }

    #[test]
    fn server_prefix_has_no_address() {
        let prefix = Prefix::new("irc.example.net");
        assert_eq!(prefix.nick(), "irc.example.net");
        assert_eq!(prefix.address(), None);
        assert!(prefix.is_server());
    }

    #[test]
    fn user_at_host_without_nick() {
        let prefix = Prefix::new("alice@host1");
        assert_eq!(prefix.nick(), "alice@host1");
        assert_eq!(prefix.hostname(), Some("host1"));
    }
}
