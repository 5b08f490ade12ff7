//! Per-connection state: identity, redirects and the outgoing queue.

pub mod inbound;
pub mod outqueue;

use std::sync::Arc;

use slirc_proto::{Casemapping, DEFAULT_CHANTYPES};
use tracing::{debug, info};

use crate::ignore::MatchScope;
use crate::metrics;
use crate::redirect::{CompletionEvent, CompletionNotifier, RedirectId, RedirectList};

pub use inbound::Inbound;
pub use outqueue::{FloodSettings, OutQueue, Priority, QueuedLine};

/// One IRC server connection.
pub struct Server {
    name: String,
    connected: bool,
    nick: Option<String>,
    casemapping: Casemapping,
    chantypes: String,
    redirects: RedirectList,
    outqueue: OutQueue,
    /// Lines ready to be written to the socket, in order.
    writes: Vec<String>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("name", &self.name)
            .field("connected", &self.connected)
            .field("nick", &self.nick)
            .field("redirects", &self.redirects.len())
            .field("queued", &self.outqueue.len())
            .finish()
    }
}

impl Server {
    pub fn new(
        name: impl Into<String>,
        flood: FloodSettings,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            name: name.into(),
            connected: false,
            nick: None,
            casemapping: Casemapping::default(),
            chantypes: DEFAULT_CHANTYPES.to_string(),
            redirects: RedirectList::new(),
            outqueue: OutQueue::new(flood),
            writes: Vec::new(),
            notifier,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self) {
        self.connected = true;
    }

    /// Tear the connection state down.
    ///
    /// Redirects are dropped without completion events and queued lines
    /// are discarded.
    pub fn disconnect(&mut self) {
        let dropped = self.redirects.destroy_all();
        if !dropped.is_empty() {
            info!(server = %self.name, count = dropped.len(), "Dropped redirects on disconnect");
        }
        self.outqueue.clear();
        self.writes.clear();
        self.connected = false;
        self.nick = None;
        self.casemapping = Casemapping::default();
        self.chantypes = DEFAULT_CHANTYPES.to_string();
    }

    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    pub fn set_nick(&mut self, nick: impl Into<String>) {
        self.nick = Some(nick.into());
    }

    pub fn casemapping(&self) -> Casemapping {
        self.casemapping
    }

    pub fn chantypes(&self) -> &str {
        &self.chantypes
    }

    pub fn redirects(&self) -> &RedirectList {
        &self.redirects
    }

    pub(crate) fn redirects_mut(&mut self) -> &mut RedirectList {
        &mut self.redirects
    }

    pub fn outqueue(&self) -> &OutQueue {
        &self.outqueue
    }

    /// Context for evaluating ignore rules against this server.
    pub fn ignore_scope(&self) -> MatchScope<'_> {
        MatchScope {
            server: &self.name,
            own_nick: self.nick.as_deref(),
            casemapping: self.casemapping,
            chantypes: &self.chantypes,
        }
    }

    /// Send a message, one line per `\n`-separated part.
    ///
    /// Each line claims the first pending redirect. A line that must wait
    /// for its anti-flood slot is queued and its redirect marked queued;
    /// otherwise it goes to the write buffer and the redirect is bound at
    /// once.
    pub fn send(&mut self, message: &str, priority: Priority, now: i64) {
        for line in message.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let redirect = self.redirects.find_first_unbound();
            if self.outqueue.must_queue(priority, now) {
                if let Some(id) = redirect {
                    self.redirects.mark_queued(id);
                }
                self.outqueue.push(priority, line.to_string(), redirect);
                debug!(server = %self.name, ?priority, "Queued outgoing line");
            } else {
                self.outqueue.mark_sent(priority, now);
                if let Some(id) = redirect {
                    self.redirects.bind(id, &self.name, line, now);
                }
                self.writes.push(line.to_string());
            }
        }
    }

    /// Move queued lines whose delay elapsed to the write buffer, binding
    /// their redirects.
    pub fn flush_queue(&mut self, now: i64) {
        while let Some(queued) = self.outqueue.pop_ready(now) {
            if let Some(id) = queued.redirect {
                self.redirects.bind(id, &self.name, &queued.line, now);
            }
            self.writes.push(queued.line);
        }
    }

    /// Take the lines to write to the socket.
    pub fn take_writes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.writes)
    }

    /// Finalize bound redirects whose timeout elapsed.
    ///
    /// Returns the number of completion events emitted.
    pub fn check_timeouts(&mut self, now: i64) -> usize {
        let events = self.redirects.check_timeouts(&self.name, now);
        let count = events.len();
        self.emit(events);
        count
    }

    /// Finalize one redirect with an optional error.
    pub fn finalize_redirect(&mut self, id: RedirectId, error: Option<&str>) -> bool {
        match self.redirects.finalize(id, &self.name, error) {
            Some(event) => {
                self.emit(vec![event]);
                true
            }
            None => false,
        }
    }

    /// Deliver completion events and drop queue handles to the finished
    /// redirects.
    pub(crate) fn emit(&mut self, events: Vec<CompletionEvent>) {
        for event in events {
            self.outqueue.forget(event.redirect);
            metrics::record_completed(&event.pattern, &event.error, event.output_size);
            self.notifier.notify(&event.name(), &event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{
        ArmRequest, NoopNotifier, PatternRegistry, RedirectInstance, RedirectState,
    };

    fn server(flood: u64) -> Server {
        let mut server = Server::new(
            "libera",
            FloodSettings {
                prio_high: flood,
                prio_low: flood,
            },
            Arc::new(NoopNotifier),
        );
        server.set_connected();
        server
    }

    fn arm(server: &mut Server, pattern: &str) -> RedirectId {
        let registry = PatternRegistry::with_builtins();
        let pattern = registry.lookup(pattern).unwrap();
        let list = server.redirects_mut();
        let id = list.next_id();
        list.push(RedirectInstance::new(id, pattern, &ArmRequest::new(&pattern.name, "s"), 60))
    }

    #[test]
    fn direct_send_binds_at_once() {
        let mut server = server(0);
        let id = arm(&mut server, "ison");
        server.send("ISON bob", Priority::High, 10);
        assert_eq!(server.take_writes(), vec!["ISON bob"]);
        let redirect = server.redirects().get(id).unwrap();
        assert_eq!(redirect.command(), Some("ISON bob"));
    }

    #[test]
    fn queued_send_binds_on_flush() {
        let mut server = server(2);
        server.send("PRIVMSG a :first", Priority::High, 10);
        let id = arm(&mut server, "ison");
        server.send("ISON bob", Priority::High, 10);
        assert_eq!(server.take_writes(), vec!["PRIVMSG a :first"]);
        assert_eq!(server.redirects().get(id).unwrap().state(), &RedirectState::Queued);
        // A queued redirect is not offered to the next line.
        assert_eq!(server.redirects().find_first_unbound(), None);

        server.flush_queue(11);
        assert!(server.take_writes().is_empty());
        server.flush_queue(12);
        assert_eq!(server.take_writes(), vec!["ISON bob"]);
        assert!(server.redirects().get(id).unwrap().is_bound());
    }

    #[test]
    fn multi_line_message_claims_one_redirect_per_line() {
        let mut server = server(0);
        let first = arm(&mut server, "ison");
        let second = arm(&mut server, "time");
        server.send("ISON bob\r\nTIME\n", Priority::Immediate, 5);
        assert_eq!(server.take_writes(), vec!["ISON bob", "TIME"]);
        assert_eq!(server.redirects().get(first).unwrap().command(), Some("ISON bob"));
        assert_eq!(server.redirects().get(second).unwrap().command(), Some("TIME"));
    }

    #[test]
    fn destroyed_redirect_is_not_bound_later() {
        let mut server = server(5);
        server.send("PRIVMSG a :x", Priority::High, 100);
        let id = arm(&mut server, "ping");
        server.send("PING :x", Priority::High, 100);
        assert!(server.finalize_redirect(id, Some("cancelled")));
        assert_eq!(server.outqueue().iter(Priority::High).next().unwrap().redirect, None);
        server.flush_queue(105);
        assert_eq!(server.take_writes(), vec!["PRIVMSG a :x", "PING :x"]);
        assert!(server.redirects().is_empty());
    }

    #[test]
    fn disconnect_drops_everything() {
        let mut server = server(5);
        arm(&mut server, "ison");
        server.send("A", Priority::High, 0);
        server.send("B", Priority::High, 0);
        server.disconnect();
        assert!(!server.is_connected());
        assert!(server.redirects().is_empty());
        assert!(server.outqueue().is_empty());
        assert!(server.take_writes().is_empty());
    }
}
