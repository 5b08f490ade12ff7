//! Completion events and the notifier seam they are delivered through.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use super::instance::RedirectId;

/// Payload emitted exactly once when a redirect is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionEvent {
    /// Handle of the finalized redirect (already destroyed).
    #[serde(skip)]
    pub redirect: RedirectId,
    /// Empty on success.
    pub error: String,
    /// Captured lines joined with `\n`.
    pub output: String,
    /// Byte length of `output`.
    pub output_size: usize,
    pub server: String,
    pub pattern: String,
    pub signal: String,
    /// Outgoing line the redirect was bound to, if it was ever sent.
    pub command: Option<String>,
}

impl CompletionEvent {
    /// Event name: `irc_redirection_<signal>_<pattern>`.
    pub fn name(&self) -> String {
        format!("irc_redirection_{}_{}", self.signal, self.pattern)
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Flat key/value form, as handed to scripting callers.
    pub fn to_hashtable(&self) -> HashMap<String, String> {
        HashMap::from([
            ("error".to_string(), self.error.clone()),
            ("output".to_string(), self.output.clone()),
            ("output_size".to_string(), self.output_size.to_string()),
            ("server".to_string(), self.server.clone()),
            ("pattern".to_string(), self.pattern.clone()),
            ("signal".to_string(), self.signal.clone()),
            (
                "command".to_string(),
                self.command.clone().unwrap_or_default(),
            ),
        ])
    }
}

/// Receives completion events.
///
/// Called synchronously from the routing path, so implementations must
/// not block.
pub trait CompletionNotifier: Send + Sync {
    fn notify(&self, name: &str, event: &CompletionEvent);
}

/// Notifier that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl CompletionNotifier for NoopNotifier {
    fn notify(&self, _name: &str, _event: &CompletionEvent) {}
}

/// Forwards events to a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<CompletionEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CompletionNotifier for ChannelNotifier {
    fn notify(&self, name: &str, event: &CompletionEvent) {
        if self.tx.send(event.clone()).is_err() {
            warn!(event = %name, "Completion receiver dropped; event lost");
        }
    }
}
