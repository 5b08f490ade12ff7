//! Ignore rules: sender masks that suppress display of incoming messages.
//!
//! Rules are kept in insertion order and numbered densely from 1. Removing
//! a rule renumbers every rule after it. Matching is first-match-wins.

pub mod command;
pub mod mask;
pub mod persistence;

use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use slirc_proto::{Casemapping, ChannelExt, DEFAULT_CHANTYPES};
use tracing::{debug, error};

use crate::error::IgnoreError;

/// Filter value matching any server or channel.
pub const ANY: &str = "*";

/// One ignore rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    number: usize,
    mask: String,
    regex: Regex,
    server: String,
    channel: String,
}

impl IgnoreRule {
    /// 1-based position in the list.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Mask source as stored (anchored regex).
    pub fn mask(&self) -> &str {
        &self.mask
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn check_server(&self, server: &str) -> bool {
        self.server == ANY || self.server.eq_ignore_ascii_case(server)
    }

    /// The channel filter doubles as a private-message peer filter when
    /// the target is not a channel name.
    fn check_channel(
        &self,
        scope: &MatchScope<'_>,
        channel: Option<&str>,
        nick: Option<&str>,
    ) -> bool {
        let Some(channel) = channel else {
            return true;
        };
        if self.channel == ANY {
            return true;
        }
        if channel.is_channel_name_for(scope.chantypes) {
            return self.channel.eq_ignore_ascii_case(channel);
        }
        nick.is_some_and(|nick| self.channel.eq_ignore_ascii_case(nick))
    }

    /// Whether the mask matches the nick, the host, or (for masks without
    /// `!`) the part of the host after its first `!`.
    pub fn check_host(&self, nick: Option<&str>, host: Option<&str>) -> bool {
        if nick.is_some_and(|nick| self.regex.is_match(nick)) {
            return true;
        }
        let Some(host) = host else {
            return false;
        };
        if self.regex.is_match(host) {
            return true;
        }
        !self.mask.contains('!')
            && host
                .split_once('!')
                .is_some_and(|(_, address)| self.regex.is_match(address))
    }

    pub fn info(&self) -> IgnoreInfo {
        IgnoreInfo {
            number: self.number,
            mask: self.mask.clone(),
            server: self.server.clone(),
            channel: self.channel.clone(),
        }
    }
}

/// Serializable view of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoreInfo {
    pub number: usize,
    pub mask: String,
    pub server: String,
    pub channel: String,
}

/// Server context needed to evaluate a rule.
#[derive(Debug, Clone, Copy)]
pub struct MatchScope<'a> {
    /// Connection name compared with server filters.
    pub server: &'a str,
    /// Our current nick on that server.
    pub own_nick: Option<&'a str>,
    pub casemapping: Casemapping,
    /// Channel prefixes advertised by the server.
    pub chantypes: &'a str,
}

impl<'a> MatchScope<'a> {
    /// Scope with protocol defaults.
    pub fn new(server: &'a str) -> Self {
        Self {
            server,
            own_nick: None,
            casemapping: Casemapping::default(),
            chantypes: DEFAULT_CHANTYPES,
        }
    }

    pub fn with_nick(mut self, nick: &'a str) -> Self {
        self.own_nick = Some(nick);
        self
    }
}

/// Hooks fired around rule removal.
pub trait IgnoreObserver: Send + Sync {
    /// Called before `rule` is detached from the list.
    fn on_removing(&self, rule: &IgnoreRule);

    /// Called after `rule` was detached and the list renumbered.
    fn on_removed(&self, rule: &IgnoreRule);
}

/// Ordered ignore rules.
#[derive(Default)]
pub struct IgnoreList {
    rules: Vec<IgnoreRule>,
    observers: Vec<Arc<dyn IgnoreObserver>>,
}

impl std::fmt::Debug for IgnoreList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreList")
            .field("rules", &self.rules)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Arc<dyn IgnoreObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IgnoreRule> {
        self.rules.iter()
    }

    /// Append a rule. `None` filters mean "any".
    ///
    /// The mask is compiled as-is; callers wanting wildcard syntax convert
    /// it first (see [`mask::user_mask_to_stored`]).
    pub fn add(
        &mut self,
        mask: &str,
        server: Option<&str>,
        channel: Option<&str>,
    ) -> Result<&IgnoreRule, IgnoreError> {
        if mask.is_empty() {
            return Err(IgnoreError::EmptyMask);
        }
        let regex = mask::compile(mask).inspect_err(|e| {
            error!(mask = %mask, error = %e, "Cannot add ignore");
        })?;

        let number = self.rules.last().map_or(1, |last| last.number + 1);
        self.rules.push(IgnoreRule {
            number,
            mask: mask.to_string(),
            regex,
            server: server.unwrap_or(ANY).to_string(),
            channel: channel.unwrap_or(ANY).to_string(),
        });
        debug!(number, mask = %mask, "Ignore added");

        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Remove the rule numbered `number`, renumbering those after it.
    pub fn remove(&mut self, number: usize) -> Result<IgnoreRule, IgnoreError> {
        let index = self
            .rules
            .iter()
            .position(|r| r.number == number)
            .ok_or(IgnoreError::NotFound)?;
        Ok(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> IgnoreRule {
        for observer in &self.observers {
            observer.on_removing(&self.rules[index]);
        }
        for rule in &mut self.rules[index + 1..] {
            rule.number -= 1;
        }
        let removed = self.rules.remove(index);
        for observer in &self.observers {
            observer.on_removed(&removed);
        }
        debug!(mask = %removed.mask, "Ignore removed");
        removed
    }

    /// Remove every rule, notifying observers for each.
    pub fn remove_all(&mut self) {
        while !self.rules.is_empty() {
            self.remove_at(0);
        }
    }

    /// Drop every rule without notifying observers.
    pub(crate) fn clear_silently(&mut self) {
        self.rules.clear();
    }

    /// Exact lookup: mask compared verbatim, filters case-insensitively.
    pub fn search(
        &self,
        mask: &str,
        server: Option<&str>,
        channel: Option<&str>,
    ) -> Option<&IgnoreRule> {
        let server = server.unwrap_or(ANY);
        let channel = channel.unwrap_or(ANY);
        self.rules.iter().find(|r| {
            r.mask == mask
                && r.server.eq_ignore_ascii_case(server)
                && r.channel.eq_ignore_ascii_case(channel)
        })
    }

    pub fn search_by_number(&self, number: usize) -> Option<&IgnoreRule> {
        self.rules.iter().find(|r| r.number == number)
    }

    /// Whether a message from `nick`/`host` to `channel` is ignored.
    ///
    /// A nick equal to our own (under the server's casemapping) is never
    /// ignored.
    pub fn is_ignored(
        &self,
        scope: &MatchScope<'_>,
        channel: Option<&str>,
        nick: Option<&str>,
        host: Option<&str>,
    ) -> bool {
        if let (Some(nick), Some(own)) = (nick, scope.own_nick) {
            if scope.casemapping.eq(own, nick) {
                return false;
            }
        }

        self.rules.iter().any(|rule| {
            rule.check_server(scope.server)
                && rule.check_channel(scope, channel, nick)
                && rule.check_host(nick, host)
        })
    }

    pub fn infos(&self) -> Vec<IgnoreInfo> {
        self.rules.iter().map(IgnoreRule::info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn list_with(masks: &[&str]) -> IgnoreList {
        let mut list = IgnoreList::new();
        for mask in masks {
            list.add(mask, None, None).unwrap();
        }
        list
    }

    fn numbers(list: &IgnoreList) -> Vec<usize> {
        list.iter().map(IgnoreRule::number).collect()
    }

    #[test]
    fn add_numbers_sequentially() {
        let list = list_with(&["^a$", "^b$", "^c$"]);
        assert_eq!(numbers(&list), vec![1, 2, 3]);
        assert_eq!(list.search_by_number(2).unwrap().mask(), "^b$");
    }

    #[test]
    fn add_rejects_bad_masks() {
        let mut list = IgnoreList::new();
        assert!(matches!(list.add("", None, None), Err(IgnoreError::EmptyMask)));
        assert!(matches!(
            list.add("(", None, None),
            Err(IgnoreError::InvalidRegex { .. })
        ));
        assert!(list.is_empty());
    }

    #[test]
    fn remove_renumbers_followers() {
        let mut list = list_with(&["^a$", "^b$", "^c$", "^d$"]);
        let removed = list.remove(2).unwrap();
        assert_eq!(removed.mask(), "^b$");
        assert_eq!(numbers(&list), vec![1, 2, 3]);
        assert_eq!(list.search_by_number(2).unwrap().mask(), "^c$");
        assert!(matches!(list.remove(9), Err(IgnoreError::NotFound)));
        // Next add continues after the last number.
        assert_eq!(list.add("^e$", None, None).unwrap().number(), 4);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl IgnoreObserver for Recorder {
        fn on_removing(&self, rule: &IgnoreRule) {
            self.0.lock().push(format!("removing {}", rule.number()));
        }

        fn on_removed(&self, rule: &IgnoreRule) {
            self.0.lock().push(format!("removed {}", rule.mask()));
        }
    }

    #[test]
    fn observers_see_removal_pairs() {
        let recorder = Arc::new(Recorder::default());
        let mut list = list_with(&["^a$", "^b$"]);
        list.add_observer(recorder.clone());
        list.remove_all();
        assert!(list.is_empty());
        assert_eq!(
            *recorder.0.lock(),
            vec!["removing 1", "removed ^a$", "removing 1", "removed ^b$"]
        );
    }

    #[test]
    fn search_is_exact() {
        let mut list = IgnoreList::new();
        list.add("^bob$", Some("Libera"), None).unwrap();
        assert!(list.search("^bob$", Some("libera"), Some("*")).is_some());
        assert!(list.search("^BOB$", Some("libera"), None).is_none());
        assert!(list.search("^bob$", None, None).is_none());
    }

    #[test]
    fn server_filter() {
        let mut list = IgnoreList::new();
        list.add("^bob$", Some("libera"), None).unwrap();
        let host = Some("bob!b@h");
        assert!(list.is_ignored(&MatchScope::new("LIBERA"), None, Some("bob"), host));
        assert!(!list.is_ignored(&MatchScope::new("oftc"), None, Some("bob"), host));
    }

    #[test]
    fn channel_filter_for_channels_and_queries() {
        let mut list = IgnoreList::new();
        list.add("^bob$", None, Some("#weechat")).unwrap();
        list.add("^carol$", None, Some("carol")).unwrap();
        let scope = MatchScope::new("libera");

        assert!(list.is_ignored(&scope, Some("#WeeChat"), Some("bob"), None));
        assert!(!list.is_ignored(&scope, Some("#test"), Some("bob"), None));
        // Private message: filter compared with the nick.
        assert!(list.is_ignored(&scope, Some("me"), Some("carol"), None));
        assert!(!list.is_ignored(&scope, Some("me"), Some("bob"), None));
        // No channel: filter not consulted.
        assert!(list.is_ignored(&scope, None, Some("bob"), None));
    }

    #[test]
    fn chantypes_decide_what_a_channel_is() {
        let mut list = IgnoreList::new();
        list.add("^bob$", None, Some("+chan")).unwrap();
        let mut scope = MatchScope::new("srv");
        assert!(!list.is_ignored(&scope, Some("+chan"), Some("bob"), None));
        scope.chantypes = "#+";
        assert!(list.is_ignored(&scope, Some("+chan"), Some("bob"), None));
    }

    #[test]
    fn own_nick_is_never_ignored() {
        let list = list_with(&[".*"]);
        let scope = MatchScope::new("srv").with_nick("Me[away]");
        assert!(!list.is_ignored(&scope, None, Some("me{AWAY}"), Some("x!y@z")));
        assert!(list.is_ignored(&scope, None, Some("other"), Some("x!y@z")));
    }

    #[test]
    fn strict_casemapping_keeps_tilde_distinct() {
        let list = list_with(&[".*"]);
        let mut scope = MatchScope::new("srv").with_nick("me~");
        scope.casemapping = Casemapping::StrictRfc1459;
        assert!(list.is_ignored(&scope, None, Some("me^"), None));
        scope.casemapping = Casemapping::Rfc1459;
        assert!(!list.is_ignored(&scope, None, Some("me^"), None));
    }

    #[test]
    fn host_fallback_after_bang() {
        let list = list_with(&["^user1@host$"]);
        let rule = list.search_by_number(1).unwrap();
        assert!(rule.check_host(Some("nick1"), Some("user1@host")));
        assert!(rule.check_host(Some("nick1"), Some("nick1!user1@host")));
        assert!(!rule.check_host(Some("nick1"), Some("nick!aaa@bbb")));
        assert!(!rule.check_host(None, None));
    }

    #[test]
    fn first_match_wins() {
        let mut list = IgnoreList::new();
        list.add("^nomatch$", None, None).unwrap();
        list.add("^bob$", None, None).unwrap();
        assert!(list.is_ignored(&MatchScope::new("srv"), None, Some("bob"), None));
    }
}
