//! External create-pattern / create-redirect requests.
//!
//! Scripting callers describe what they want as flat key/value payloads.
//! These types validate the payload; the engine applies it.

use std::collections::HashMap;

use super::instance::ArmRequest;
use crate::error::RedirectError;

/// Key/value payload of an external request.
pub type Payload = HashMap<String, String>;

fn non_empty<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Integer value of `key`; unparsable or missing values yield `None`.
fn integer(payload: &Payload, key: &str) -> Option<i64> {
    non_empty(payload, key).and_then(|value| value.parse().ok())
}

/// Request to register a temporary pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRequest {
    pub pattern: String,
    pub timeout: i64,
    pub cmd_start: Option<String>,
    pub cmd_stop: String,
    pub cmd_extra: Option<String>,
}

impl PatternRequest {
    /// Validate a payload with keys `pattern`, `timeout`, `cmd_start`,
    /// `cmd_stop` and `cmd_extra`.
    pub fn from_payload(payload: &Payload) -> Result<Self, RedirectError> {
        let pattern =
            non_empty(payload, "pattern").ok_or(RedirectError::MissingArgument("pattern"))?;
        let cmd_stop =
            non_empty(payload, "cmd_stop").ok_or(RedirectError::MissingArgument("cmd_stop"))?;

        Ok(Self {
            pattern: pattern.to_string(),
            timeout: integer(payload, "timeout").unwrap_or(0),
            cmd_start: payload.get("cmd_start").cloned(),
            cmd_stop: cmd_stop.to_string(),
            cmd_extra: payload.get("cmd_extra").cloned(),
        })
    }
}

/// Request to arm a redirect on a named server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    pub server: String,
    pub arm: ArmRequest,
}

impl RedirectRequest {
    /// Validate a payload with keys `server`, `pattern`, `signal`,
    /// `count`, `string`, `timeout` and `cmd_filter`.
    ///
    /// Only `server` is checked here; the rest is checked when arming.
    pub fn from_payload(payload: &Payload) -> Result<Self, RedirectError> {
        let server =
            non_empty(payload, "server").ok_or(RedirectError::MissingArgument("server"))?;
        let count = integer(payload, "count").unwrap_or(1);
        let timeout = integer(payload, "timeout").unwrap_or(0);

        Ok(Self {
            server: server.to_string(),
            arm: ArmRequest {
                pattern: payload.get("pattern").cloned().unwrap_or_default(),
                signal: payload.get("signal").cloned().unwrap_or_default(),
                count: u32::try_from(count.max(1)).unwrap_or(u32::MAX),
                string: payload.get("string").cloned(),
                timeout: u64::try_from(timeout).unwrap_or(0),
                cmd_filter: payload.get("cmd_filter").cloned(),
            },
        })
    }
}
