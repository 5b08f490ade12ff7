//! Command/reply correlation ("redirects").
//!
//! A caller arms a redirect on a server right before sending a command.
//! Replies matching the pattern's start/stop/extra conditions are then
//! captured instead of displayed, and a single [`CompletionEvent`] is
//! emitted when the redirect finishes or times out.
//!
//! - [`pattern`]: named templates and the registry
//! - [`condition`]: `TOKEN[:N]` condition sets and output filters
//! - [`instance`]: one armed redirect and its arm/send/bind state
//! - [`list`]: per-server redirects and the message router
//! - [`notifier`]: completion events and their delivery
//! - [`request`]: external key/value creation requests

pub mod condition;
pub mod instance;
pub mod list;
pub mod notifier;
pub mod pattern;
pub mod request;

pub use condition::{CommandFilter, Condition, ConditionSet};
pub use instance::{ArmRequest, RedirectId, RedirectInfo, RedirectInstance, RedirectState};
pub use list::{RedirectList, RouteOutcome};
pub use notifier::{ChannelNotifier, CompletionEvent, CompletionNotifier, NoopNotifier};
pub use pattern::{PatternInfo, PatternRegistry, RedirectPattern};
pub use request::{Payload, PatternRequest, RedirectRequest};

/// Engine default timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 60;
