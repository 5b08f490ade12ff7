//! IRC case-mapping functions.
//!
//! IRC uses a special case-insensitive comparison where some characters
//! are considered equivalent (e.g., `[` and `{`). Servers advertise the
//! rule they apply with the `CASEMAPPING` ISUPPORT token; `rfc1459` is
//! assumed until they say otherwise.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Case-mapping rule advertised by a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Casemapping {
    /// Only `A-Z` fold to `a-z`.
    Ascii,
    /// ASCII plus `[]\~` fold to `{}|^`.
    #[default]
    Rfc1459,
    /// ASCII plus `[]\` fold to `{}|` (`~` and `^` stay distinct).
    StrictRfc1459,
}

impl Casemapping {
    /// Fold a single character according to this mapping.
    #[inline]
    pub const fn lower_char(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => (c as u8 + 32) as char,
            (Casemapping::Ascii, _) => c,
            (_, '[') => '{',
            (_, ']') => '}',
            (_, '\\') => '|',
            (Casemapping::Rfc1459, '~') => '^',
            _ => c,
        }
    }

    /// Fold a whole string according to this mapping.
    pub fn to_lower(self, s: &str) -> String {
        s.chars().map(|c| self.lower_char(c)).collect()
    }

    /// Compare two strings for equality under this mapping.
    pub fn eq(self, a: &str, b: &str) -> bool {
        let mut left = a.chars();
        let mut right = b.chars();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(ca), Some(cb)) if self.lower_char(ca) == self.lower_char(cb) => {}
                _ => return false,
            }
        }
    }

    /// Name as it appears in the `CASEMAPPING` token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Casemapping::Ascii => "ascii",
            Casemapping::Rfc1459 => "rfc1459",
            Casemapping::StrictRfc1459 => "strict-rfc1459",
        }
    }
}

impl fmt::Display for Casemapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Casemapping {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ascii") {
            Ok(Casemapping::Ascii)
        } else if s.eq_ignore_ascii_case("rfc1459") {
            Ok(Casemapping::Rfc1459)
        } else if s.eq_ignore_ascii_case("strict-rfc1459") {
            Ok(Casemapping::StrictRfc1459)
        } else {
            Err(ProtocolError::UnknownCasemapping(s.to_owned()))
        }
    }
}

/// Convert a single character to IRC lowercase using RFC 1459 case mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    Casemapping::Rfc1459.lower_char(c)
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    Casemapping::Rfc1459.to_lower(s)
}

/// Compare two strings using RFC 1459 case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    Casemapping::Rfc1459.eq(a, b)
}
