//! Redirect patterns and the process-wide pattern registry.

use serde::Serialize;
use tracing::{debug, error};

use super::condition::ConditionSet;
use crate::error::RedirectError;

/// Built-in patterns: `(name, start, stop, extra)`.
const BUILTIN_PATTERNS: &[(&str, Option<&str>, &str, Option<&str>)] = &[
    ("ison", None, "303", None),
    ("list", Some("321,322"), "323", None),
    ("mode_channel", None, "324:1,403:1,442:1,479:1", Some("329:1")),
    ("mode_channel_ban", Some("367:1"), "368:1,403:1,442:1,479:1", None),
    (
        "mode_channel_ban_exception",
        Some("348:1"),
        "349:1,403:1,442:1,472,479:1,482:1",
        None,
    ),
    (
        "mode_channel_invite",
        Some("346:1"),
        "347:1,403:1,442:1,472,479:1,482:1",
        None,
    ),
    ("mode_user", None, "mode:0,221:0,403:1,501,502", None),
    ("monitor", Some("732:2"), "733:1", None),
    ("names", Some("353:2"), "366:1", None),
    ("ping", None, "pong,402", None),
    ("time", None, "391", None),
    ("topic", None, "331:1,332:1,403:1", Some("333:1")),
    ("userhost", Some("401:1"), "302,461", None),
    ("who", Some("352:1,354,401:1"), "315:1,403:1", None),
    (
        "whois",
        Some("311:1"),
        "318:1,401:1,402:1,431:1,461",
        Some("318:1"),
    ),
    ("whowas", Some("314:1,406:1"), "369:1", None),
];

/// Named template describing which messages start, stop and extend the
/// reply sequence of a command family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPattern {
    pub name: String,
    /// Created by an external request; removed once a redirect uses it.
    pub temporary: bool,
    /// Seconds; 0 means "use the engine default".
    pub timeout: u64,
    pub start: ConditionSet,
    pub stop: ConditionSet,
    pub extra: ConditionSet,
}

impl RedirectPattern {
    /// Snapshot for introspection.
    pub fn info(&self) -> PatternInfo {
        PatternInfo {
            name: self.name.clone(),
            temporary: self.temporary,
            timeout: self.timeout,
            cmd_start: self.start.to_string(),
            cmd_stop: self.stop.to_string(),
            cmd_extra: self.extra.to_string(),
        }
    }
}

/// Serializable view of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternInfo {
    pub name: String,
    pub temporary: bool,
    pub timeout: u64,
    pub cmd_start: String,
    pub cmd_stop: String,
    pub cmd_extra: String,
}

/// Insertion-ordered table of patterns, unique by name.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    patterns: Vec<RedirectPattern>,
}

impl PatternRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in patterns.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register every built-in pattern that is not registered yet.
    pub fn register_builtins(&mut self) {
        for (name, start, stop, extra) in BUILTIN_PATTERNS {
            if self.lookup(name).is_some() {
                continue;
            }
            // Built-in specs always carry a stop condition.
            let _ = self.register(name, false, 0, *start, Some(*stop), *extra);
        }
    }

    /// Register a pattern.
    ///
    /// Rejects a pattern whose stop spec yields no condition, then a name
    /// that is already registered. A timeout of 0 (or less) defers to the
    /// engine default at arm time.
    pub fn register(
        &mut self,
        name: &str,
        temporary: bool,
        timeout: i64,
        start: Option<&str>,
        stop: Option<&str>,
        extra: Option<&str>,
    ) -> Result<&RedirectPattern, RedirectError> {
        let stop = ConditionSet::parse_opt(stop);
        if stop.is_empty() {
            let err = RedirectError::MissingStopCondition(name.to_string());
            error!(pattern = %name, error = %err, "Cannot register redirect pattern");
            return Err(err);
        }
        if self.lookup(name).is_some() {
            let err = RedirectError::DuplicateName(name.to_string());
            error!(pattern = %name, error = %err, "Cannot register redirect pattern");
            return Err(err);
        }

        self.patterns.push(RedirectPattern {
            name: name.to_string(),
            temporary,
            timeout: u64::try_from(timeout).unwrap_or(0),
            start: ConditionSet::parse_opt(start),
            stop,
            extra: ConditionSet::parse_opt(extra),
        });
        debug!(pattern = %name, temporary, "Registered redirect pattern");

        let index = self.patterns.len() - 1;
        Ok(&self.patterns[index])
    }

    pub fn lookup(&self, name: &str) -> Option<&RedirectPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Remove a pattern, returning it if it was registered.
    pub fn unregister(&mut self, name: &str) -> Option<RedirectPattern> {
        let index = self.patterns.iter().position(|p| p.name == name)?;
        Some(self.patterns.remove(index))
    }

    pub fn unregister_all(&mut self) {
        self.patterns.clear();
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RedirectPattern> {
        self.patterns.iter()
    }

    pub fn infos(&self) -> Vec<PatternInfo> {
        self.patterns.iter().map(RedirectPattern::info).collect()
    }
}
