//! # slirc-proto
//!
//! IRC protocol helpers used by the slirc redirect client:
//!
//! - line parsing into tags, prefix, command and arguments
//! - `nick!user@host` prefix splitting
//! - IRC casemapping (`ascii`, `rfc1459`, `strict-rfc1459`)
//! - channel-name detection driven by `CHANTYPES`
//! - ISUPPORT (`RPL_ISUPPORT`) token extraction
//!
//! ## Parsing IRC Messages
//!
//! ```rust
//! use slirc_proto::Message;
//!
//! let raw = ":irc.example.net 318 me bob :End of /WHOIS list.";
//! let message: Message = raw.parse().expect("Valid IRC message");
//!
//! assert_eq!(message.command, "318");
//! assert_eq!(message.argument_tokens()[1], "bob");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod error;
pub mod isupport;
pub mod message;
pub mod prefix;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower, Casemapping};
pub use self::chan::{ChannelExt, DEFAULT_CHANTYPES};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::isupport::{Isupport, IsupportEntry};
pub use self::message::Message;
pub use self::prefix::Prefix;
