//! slirc-redirect - IRC reply redirection and ignore matching.
//!
//! A redirect captures the reply sequence of one outgoing command (the
//! lines of a `WHOIS`, a `LIST`, a `TIME`...) instead of letting it reach
//! the display, then emits a single completion event carrying the
//! captured output. The ignore list suppresses messages from matching
//! senders.
//!
//! - [`redirect`]: patterns, redirect instances and the message router
//! - [`ignore`]: ignore rules, the `/ignore` command and persistence
//! - [`server`]: per-connection state and the outgoing anti-flood queue
//! - [`engine`]: central state tying the above together
//! - [`network`]: tokio client runtime

pub mod config;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod metrics;
pub mod network;
pub mod redirect;
pub mod server;

pub use engine::Engine;
pub use error::{CommandError, IgnoreError, RedirectError};
