//! Channel name utilities.
//!
//! A target is a channel when its first character is one of the server's
//! channel types (`CHANTYPES` in ISUPPORT). Before the server advertises
//! them, `#&` is assumed.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

/// Channel types assumed until the server sends `CHANTYPES`.
pub const DEFAULT_CHANTYPES: &str = "#&";

/// Extension trait for checking if a string names an IRC channel.
pub trait ChannelExt {
    /// Check this string against the default channel types.
    fn is_channel_name(&self) -> bool {
        self.is_channel_name_for(DEFAULT_CHANTYPES)
    }

    /// Check this string against a server's `CHANTYPES`.
    ///
    /// Valid channel names:
    /// - Start with one of `chantypes`
    /// - Do not contain space, comma, BEL (0x07), or NUL
    fn is_channel_name_for(&self, chantypes: &str) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name_for(&self, chantypes: &str) -> bool {
        let mut chars = self.chars();

        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };

        if !chantypes.contains(first) {
            return false;
        }

        chars.all(|c| c != ' ' && c != ',' && c != '\x07' && !c.is_control())
    }
}

impl ChannelExt for String {
    fn is_channel_name_for(&self, chantypes: &str) -> bool {
        self.as_str().is_channel_name_for(chantypes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        assert!("#channel".is_channel_name());
        assert!("&local".is_channel_name());
    }

    #[test]
    fn test_invalid_channels() {
        assert!(!"channel".is_channel_name());
        assert!(!"#chan nel".is_channel_name());
        assert!(!"#chan,nel".is_channel_name());
        assert!(!"".is_channel_name());
    }

    #[test]
    fn chantypes_from_server_are_honoured() {
        assert!(!"+modeless".is_channel_name());
        assert!("+modeless".is_channel_name_for("#+"));
        assert!(!"&local".is_channel_name_for("#"));
    }
}
