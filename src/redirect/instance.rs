//! A single armed redirect.

use std::fmt;

use serde::Serialize;

use super::condition::{CommandFilter, ConditionSet};
use super::notifier::CompletionEvent;
use super::pattern::RedirectPattern;

/// Stable handle to a redirect within its server's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RedirectId(pub u64);

impl fmt::Display for RedirectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a redirect is in the arm/send/bind protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RedirectState {
    /// Armed; no outgoing line has claimed it.
    Pending,
    /// Claimed by a line still waiting in the outgoing queue.
    Queued,
    /// The claiming line was written; `since` starts the timeout clock.
    Bound { command: String, since: i64 },
}

/// What a caller asks for when arming a redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmRequest {
    pub pattern: String,
    pub signal: String,
    /// Rounds to capture before completing; values below 1 mean 1.
    pub count: u32,
    /// Disambiguator compared with indexed condition arguments.
    pub string: Option<String>,
    /// Seconds; 0 uses the pattern's timeout.
    pub timeout: u64,
    /// Comma-separated tokens kept in the output.
    pub cmd_filter: Option<String>,
}

impl ArmRequest {
    pub fn new(pattern: impl Into<String>, signal: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            signal: signal.into(),
            count: 1,
            ..Self::default()
        }
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn string(mut self, string: impl Into<String>) -> Self {
        self.string = Some(string.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cmd_filter(mut self, filter: impl Into<String>) -> Self {
        self.cmd_filter = Some(filter.into());
        self
    }
}

/// One live correlation between an outgoing command and its replies.
///
/// Conditions are copied from the pattern at arm time; later changes to
/// the registry do not affect an armed redirect.
#[derive(Debug, Clone)]
pub struct RedirectInstance {
    pub(crate) id: RedirectId,
    pub(crate) pattern: String,
    pub(crate) signal: String,
    pub(crate) count: u32,
    pub(crate) current_count: u32,
    pub(crate) string: Option<String>,
    pub(crate) timeout: u64,
    pub(crate) state: RedirectState,
    pub(crate) start: ConditionSet,
    pub(crate) stop: ConditionSet,
    pub(crate) extra: ConditionSet,
    pub(crate) start_seen: bool,
    pub(crate) stop_seen: bool,
    pub(crate) filter: Option<CommandFilter>,
    pub(crate) output: Vec<String>,
}

impl RedirectInstance {
    pub(crate) fn new(
        id: RedirectId,
        pattern: &RedirectPattern,
        request: &ArmRequest,
        timeout: u64,
    ) -> Self {
        Self {
            id,
            pattern: pattern.name.clone(),
            signal: request.signal.clone(),
            count: request.count.max(1),
            current_count: 1,
            string: request.string.clone(),
            timeout,
            state: RedirectState::Pending,
            start: pattern.start.clone(),
            stop: pattern.stop.clone(),
            extra: pattern.extra.clone(),
            start_seen: false,
            stop_seen: false,
            filter: request.cmd_filter.as_deref().and_then(CommandFilter::parse),
            output: Vec::new(),
        }
    }

    pub fn id(&self) -> RedirectId {
        self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn signal(&self) -> &str {
        &self.signal
    }

    pub fn state(&self) -> &RedirectState {
        &self.state
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RedirectState::Pending)
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, RedirectState::Bound { .. })
    }

    /// Bound command text, if the claiming line has been written.
    pub fn command(&self) -> Option<&str> {
        match &self.state {
            RedirectState::Bound { command, .. } => Some(command),
            _ => None,
        }
    }

    pub(crate) fn disambiguator(&self) -> Option<&str> {
        self.string.as_deref()
    }

    /// Record the transmitted line, trimmed at the first CR or LF.
    pub(crate) fn bind(&mut self, line: &str, now: i64) {
        let end = line.find(['\r', '\n']).unwrap_or(line.len());
        self.state = RedirectState::Bound {
            command: line[..end].to_string(),
            since: now,
        };
    }

    /// Whether the timeout elapsed. Unbound redirects never expire.
    pub(crate) fn is_expired(&self, now: i64) -> bool {
        match self.state {
            RedirectState::Bound { since, .. } => {
                since.saturating_add_unsigned(self.timeout) < now
            }
            _ => false,
        }
    }

    /// Append a line to the output unless the filter excludes `command`.
    pub(crate) fn capture(&mut self, line: &str, command: &str) {
        if self.filter.as_ref().is_some_and(|f| !f.allows(command)) {
            return;
        }
        self.output.push(line.to_string());
    }

    pub fn output(&self) -> String {
        self.output.join("\n")
    }

    /// Advance the round counter.
    ///
    /// Returns `true` when the redirect is done (an error, or the requested
    /// count was reached); otherwise resets the start/stop progress so a
    /// further round can be captured.
    pub(crate) fn advance(&mut self, error: Option<&str>) -> bool {
        self.current_count += 1;
        if error.is_some() || self.current_count > self.count {
            return true;
        }
        self.start_seen = false;
        self.stop_seen = false;
        false
    }

    pub(crate) fn into_event(self, server: &str, error: Option<&str>) -> CompletionEvent {
        let output = self.output.join("\n");
        let command = match self.state {
            RedirectState::Bound { command, .. } => Some(command),
            _ => None,
        };
        CompletionEvent {
            redirect: self.id,
            error: error.unwrap_or_default().to_string(),
            output_size: output.len(),
            output,
            server: server.to_string(),
            pattern: self.pattern,
            signal: self.signal,
            command,
        }
    }

    /// Snapshot for introspection.
    pub fn info(&self, server: &str) -> RedirectInfo {
        let output = self.output();
        RedirectInfo {
            id: self.id.0,
            server: server.to_string(),
            pattern: self.pattern.clone(),
            signal: self.signal.clone(),
            count: self.count,
            current_count: self.current_count,
            string: self.string.clone(),
            timeout: self.timeout,
            state: self.state.clone(),
            cmd_start: self.start.to_string(),
            cmd_stop: self.stop.to_string(),
            cmd_extra: self.extra.to_string(),
            cmd_start_received: self.start_seen,
            cmd_stop_received: self.stop_seen,
            cmd_filter: self.filter.as_ref().map(ToString::to_string),
            output_size: output.len(),
            output,
        }
    }
}

/// Serializable view of a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectInfo {
    pub id: u64,
    pub server: String,
    pub pattern: String,
    pub signal: String,
    pub count: u32,
    pub current_count: u32,
    pub string: Option<String>,
    pub timeout: u64,
    pub state: RedirectState,
    pub cmd_start: String,
    pub cmd_stop: String,
    pub cmd_extra: String,
    pub cmd_start_received: bool,
    pub cmd_stop_received: bool,
    pub cmd_filter: Option<String>,
    pub output: String,
    pub output_size: usize,
}
