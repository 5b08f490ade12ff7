//! Per-server list of redirects and the message router.

use slirc_proto::Message;
use tracing::{debug, trace, warn};

use super::instance::{RedirectId, RedirectInfo, RedirectInstance, RedirectState};
use super::notifier::CompletionEvent;

/// Result of offering an inbound message to a server's redirects.
#[derive(Debug, Default)]
pub struct RouteOutcome {
    /// The message belongs to a redirect and must not be displayed.
    pub consumed: bool,
    /// Redirects finalized while routing, in order.
    pub completed: Vec<CompletionEvent>,
}

/// Redirects of one server, tried in arm order.
#[derive(Debug, Default)]
pub struct RedirectList {
    instances: Vec<RedirectInstance>,
    next_id: u64,
}

impl RedirectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RedirectInstance> {
        self.instances.iter()
    }

    pub fn get(&self, id: RedirectId) -> Option<&RedirectInstance> {
        self.instances.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: RedirectId) -> Option<&mut RedirectInstance> {
        self.instances.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn next_id(&mut self) -> RedirectId {
        self.next_id += 1;
        RedirectId(self.next_id)
    }

    /// Append an armed redirect; it is tried after every earlier one.
    pub(crate) fn push(&mut self, instance: RedirectInstance) -> RedirectId {
        let id = instance.id;
        self.instances.push(instance);
        id
    }

    /// First redirect no outgoing line has claimed yet.
    pub fn find_first_unbound(&self) -> Option<RedirectId> {
        self.instances.iter().find(|r| r.is_pending()).map(|r| r.id)
    }

    /// Mark a redirect as claimed by a queued line.
    pub(crate) fn mark_queued(&mut self, id: RedirectId) {
        if let Some(instance) = self.get_mut(id) {
            instance.state = RedirectState::Queued;
        }
    }

    /// Bind a redirect to the line actually written to the socket.
    ///
    /// Returns `false` if the handle no longer refers to a live redirect
    /// or the redirect is already bound.
    pub(crate) fn bind(&mut self, id: RedirectId, server: &str, line: &str, now: i64) -> bool {
        let Some(instance) = self.get_mut(id) else {
            return false;
        };
        if instance.is_bound() {
            return false;
        }
        instance.bind(line, now);
        debug!(
            server = %server,
            pattern = %instance.pattern,
            command = instance.command().unwrap_or_default(),
            "Starting redirection"
        );
        true
    }

    /// Finalize the redirect at `index`.
    ///
    /// Returns the completion event when the redirect was destroyed.
    fn finalize_at(
        &mut self,
        index: usize,
        server: &str,
        error: Option<&str>,
    ) -> Option<CompletionEvent> {
        if !self.instances[index].advance(error) {
            trace!(
                server = %server,
                redirect = %self.instances[index].id,
                round = self.instances[index].current_count,
                "Redirect round complete"
            );
            return None;
        }
        let instance = self.instances.remove(index);
        let event = instance.into_event(server, error);
        debug!(
            server = %server,
            pattern = %event.pattern,
            signal = %event.signal,
            error = %event.error,
            output_size = event.output_size,
            "Redirection finished"
        );
        Some(event)
    }

    /// Finalize a redirect by handle.
    pub fn finalize(
        &mut self,
        id: RedirectId,
        server: &str,
        error: Option<&str>,
    ) -> Option<CompletionEvent> {
        let index = self.instances.iter().position(|r| r.id == id)?;
        self.finalize_at(index, server, error)
    }

    /// Offer an inbound message to the bound redirects, oldest first.
    pub fn route(&mut self, server: &str, message: &Message) -> RouteOutcome {
        let mut outcome = RouteOutcome::default();
        if self.instances.is_empty() {
            return outcome;
        }

        let command = message.command.as_str();
        let args = message.argument_tokens();
        let line = message.raw();

        let mut index = 0;
        while index < self.instances.len() {
            let instance = &mut self.instances[index];
            if !instance.is_bound() {
                index += 1;
                continue;
            }

            if instance.stop_seen {
                // Waiting for an optional extra message.
                if instance
                    .extra
                    .matches(command, &args, instance.disambiguator())
                {
                    instance.capture(line, command);
                    outcome.consumed = true;
                    outcome.completed.extend(self.finalize_at(index, server, None));
                    break;
                }
                match self.finalize_at(index, server, None) {
                    Some(event) => outcome.completed.push(event),
                    None => index += 1,
                }
                continue;
            }

            if !instance.start.is_empty()
                && !instance.start_seen
                && instance
                    .start
                    .matches(command, &args, instance.disambiguator())
            {
                instance.capture(line, command);
                instance.start_seen = true;
                outcome.consumed = true;
                break;
            }

            let match_stop = instance
                .stop
                .matches(command, &args, instance.disambiguator());
            if match_stop || instance.start_seen {
                instance.capture(line, command);
                outcome.consumed = true;
                if match_stop {
                    instance.stop_seen = true;
                    let finished = instance.extra.is_empty()
                        || instance
                            .extra
                            .matches(command, &args, instance.disambiguator());
                    if finished {
                        outcome.completed.extend(self.finalize_at(index, server, None));
                    }
                }
                break;
            }

            index += 1;
        }

        trace!(
            server = %server,
            command = %command,
            consumed = outcome.consumed,
            "Routed message"
        );
        outcome
    }

    /// Finalize every bound redirect whose timeout elapsed.
    pub fn check_timeouts(&mut self, server: &str, now: i64) -> Vec<CompletionEvent> {
        let mut completed = Vec::new();
        let mut index = 0;
        while index < self.instances.len() {
            if !self.instances[index].is_expired(now) {
                index += 1;
                continue;
            }
            warn!(
                server = %server,
                pattern = %self.instances[index].pattern,
                timeout = self.instances[index].timeout,
                "Redirection timed out"
            );
            // An error always destroys the redirect.
            completed.extend(self.finalize_at(index, server, Some("timeout")));
        }
        completed
    }

    /// Drop every redirect without emitting completion events.
    ///
    /// Returns the handles that were dropped.
    pub fn destroy_all(&mut self) -> Vec<RedirectId> {
        self.instances.drain(..).map(|r| r.id).collect()
    }

    pub fn infos(&self, server: &str) -> Vec<RedirectInfo> {
        self.instances.iter().map(|r| r.info(server)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{ArmRequest, PatternRegistry};

    fn arm(list: &mut RedirectList, request: ArmRequest) -> RedirectId {
        let registry = PatternRegistry::with_builtins();
        let pattern = registry.lookup(&request.pattern).unwrap();
        let id = list.next_id();
        list.push(RedirectInstance::new(id, pattern, &request, 60))
    }

    fn msg(line: &str) -> Message {
        line.parse().unwrap()
    }

    #[test]
    fn pending_redirects_ignore_messages() {
        let mut list = RedirectList::new();
        arm(&mut list, ArmRequest::new("ison", "s"));
        let outcome = list.route("srv", &msg(":srv 303 me :bob"));
        assert!(!outcome.consumed);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn stop_only_completes_on_first_stop() {
        let mut list = RedirectList::new();
        let id = arm(&mut list, ArmRequest::new("ison", "s"));
        assert!(list.bind(id, "srv", "ISON bob", 10));

        assert!(!list.route("srv", &msg(":srv 001 me :hi")).consumed);
        let outcome = list.route("srv", &msg(":srv 303 me :bob"));
        assert!(outcome.consumed);
        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(outcome.completed[0].output, ":srv 303 me :bob");
        assert!(list.is_empty());
    }

    #[test]
    fn everything_between_start_and_stop_is_captured() {
        let mut list = RedirectList::new();
        let id = arm(&mut list, ArmRequest::new("whois", "s").string("bob"));
        list.bind(id, "srv", "WHOIS bob", 0);

        for line in [
            ":srv 311 me bob ~b host * :Bob",
            ":srv 312 me bob srv :Server",
            ":srv 318 me bob :End of /WHOIS list.",
        ] {
            let outcome = list.route("srv", &msg(line));
            assert!(outcome.consumed, "{line}");
        }
        assert!(list.is_empty());
    }

    #[test]
    fn disambiguator_selects_redirect() {
        let mut list = RedirectList::new();
        let alice = arm(&mut list, ArmRequest::new("whois", "a").string("alice"));
        let bob = arm(&mut list, ArmRequest::new("whois", "b").string("bob"));
        list.bind(alice, "srv", "WHOIS alice", 0);
        list.bind(bob, "srv", "WHOIS bob", 0);

        let outcome = list.route("srv", &msg(":srv 318 me bob :End"));
        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(outcome.completed[0].signal, "b");
        assert!(list.get(alice).is_some());
    }

    #[test]
    fn waiting_for_extra_completes_on_other_message() {
        let mut list = RedirectList::new();
        let id = arm(&mut list, ArmRequest::new("mode_channel", "s"));
        list.bind(id, "srv", "MODE #c", 0);

        let outcome = list.route("srv", &msg(":srv 324 me #c +nt"));
        assert!(outcome.consumed);
        assert!(outcome.completed.is_empty());

        let outcome = list.route("srv", &msg(":bob!b@h PRIVMSG #c :hi"));
        assert!(!outcome.consumed);
        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(outcome.completed[0].output, ":srv 324 me #c +nt");
    }

    #[test]
    fn extra_message_is_captured() {
        let mut list = RedirectList::new();
        let id = arm(&mut list, ArmRequest::new("mode_channel", "s"));
        list.bind(id, "srv", "MODE #c", 0);
        list.route("srv", &msg(":srv 324 me #c +nt"));
        let outcome = list.route("srv", &msg(":srv 329 me #c 1700000000"));
        assert!(outcome.consumed);
        assert_eq!(
            outcome.completed[0].output,
            ":srv 324 me #c +nt\n:srv 329 me #c 1700000000"
        );
    }

    #[test]
    fn timeout_finalizes_with_error() {
        let mut list = RedirectList::new();
        let id = arm(&mut list, ArmRequest::new("ping", "s").count(3));
        list.bind(id, "srv", "PING x", 100);
        assert!(list.check_timeouts("srv", 160).is_empty());
        let events = list.check_timeouts("srv", 161);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].error, "timeout");
        assert!(list.is_empty());
    }

    #[test]
    fn bound_redirect_is_not_rebound() {
        let mut list = RedirectList::new();
        let id = arm(&mut list, ArmRequest::new("time", "s"));
        list.mark_queued(id);
        assert!(list.bind(id, "srv", "TIME", 10));
        assert!(!list.bind(id, "srv", "VERSION", 50));

        let instance = list.get(id).unwrap();
        assert_eq!(instance.command(), Some("TIME"));
        assert_eq!(
            instance.state(),
            &RedirectState::Bound {
                command: "TIME".into(),
                since: 10
            }
        );
    }

    #[test]
    fn destroy_all_is_silent() {
        let mut list = RedirectList::new();
        arm(&mut list, ArmRequest::new("ison", "s"));
        arm(&mut list, ArmRequest::new("time", "s"));
        assert_eq!(list.destroy_all().len(), 2);
        assert!(list.is_empty());
    }
}
