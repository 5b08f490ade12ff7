//! The Engine - central state for the redirect client.
//!
//! Holds the process-wide pattern registry and ignore list next to the
//! per-server connection state. Everything runs on the event loop that
//! owns the engine; there is no interior locking.

use std::path::Path;
use std::sync::Arc;

use slirc_proto::{Message, ProtocolError};
use tracing::{debug, error, info, warn};

use crate::error::{CommandError, IgnoreError, RedirectError};
use crate::ignore::command::IgnoreCommand;
use crate::ignore::{IgnoreInfo, IgnoreList, persistence};
use crate::metrics;
use crate::redirect::{
    ArmRequest, CompletionNotifier, DEFAULT_TIMEOUT, PatternInfo, PatternRegistry, PatternRequest,
    Payload, RedirectId, RedirectInfo, RedirectInstance, RedirectRequest,
};
use crate::server::{FloodSettings, Inbound, Priority, Server};

/// Central state container.
pub struct Engine {
    /// Named patterns shared by every server.
    pub patterns: PatternRegistry,

    /// Ignore rules shared by every server.
    pub ignores: IgnoreList,

    servers: Vec<Server>,

    /// Timeout for redirects whose request and pattern set none.
    default_timeout: u64,

    notifier: Arc<dyn CompletionNotifier>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("patterns", &self.patterns.len())
            .field("ignores", &self.ignores.len())
            .field("servers", &self.servers)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl Engine {
    /// Create an engine with the built-in patterns registered.
    pub fn new(notifier: Arc<dyn CompletionNotifier>) -> Self {
        Self {
            patterns: PatternRegistry::with_builtins(),
            ignores: IgnoreList::new(),
            servers: Vec::new(),
            default_timeout: DEFAULT_TIMEOUT,
            notifier,
        }
    }

    /// Override the engine default timeout (0 keeps the current one).
    pub fn with_default_timeout(mut self, timeout: u64) -> Self {
        if timeout > 0 {
            self.default_timeout = timeout;
        }
        self
    }

    pub fn default_timeout(&self) -> u64 {
        self.default_timeout
    }

    // ========================================================================
    // Servers
    // ========================================================================

    /// Add a server, replacing any previous one with the same name.
    pub fn add_server(&mut self, name: &str, flood: FloodSettings) -> &mut Server {
        self.remove_server(name);
        self.servers
            .push(Server::new(name, flood, Arc::clone(&self.notifier)));
        let index = self.servers.len() - 1;
        &mut self.servers[index]
    }

    /// Remove a server, dropping its redirects without completion events.
    pub fn remove_server(&mut self, name: &str) -> Option<Server> {
        let index = self.servers.iter().position(|s| s.name() == name)?;
        let mut server = self.servers.remove(index);
        server.disconnect();
        Some(server)
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name() == name)
    }

    pub fn server_mut(&mut self, name: &str) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.name() == name)
    }

    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.iter()
    }

    // ========================================================================
    // Redirects
    // ========================================================================

    /// Arm a redirect on a connected server.
    ///
    /// The redirect waits for the next line sent on that server. A
    /// temporary pattern is unregistered once armed.
    pub fn arm(&mut self, server: &str, request: ArmRequest) -> Result<RedirectId, RedirectError> {
        let result = self.arm_inner(server, &request);
        if let Err(ref err) = result {
            error!(server = %server, pattern = %request.pattern, error = %err, "Cannot add redirect");
            metrics::record_error(err.error_code());
        }
        result
    }

    fn arm_inner(&mut self, server: &str, request: &ArmRequest) -> Result<RedirectId, RedirectError> {
        let target = self
            .servers
            .iter_mut()
            .find(|s| s.name() == server)
            .ok_or_else(|| RedirectError::ServerNotFound(server.to_string()))?;
        if !target.is_connected() {
            return Err(RedirectError::ServerNotConnected(server.to_string()));
        }
        if request.pattern.is_empty() {
            return Err(RedirectError::MissingArgument("pattern"));
        }
        if request.signal.is_empty() {
            return Err(RedirectError::MissingArgument("signal"));
        }
        let pattern = self
            .patterns
            .lookup(&request.pattern)
            .ok_or_else(|| RedirectError::PatternNotFound(request.pattern.clone()))?;

        let timeout = if request.timeout > 0 {
            request.timeout
        } else if pattern.timeout > 0 {
            pattern.timeout
        } else {
            self.default_timeout
        };

        let redirects = target.redirects_mut();
        let id = redirects.next_id();
        let instance = RedirectInstance::new(id, pattern, request, timeout);
        redirects.push(instance);

        let temporary = pattern.temporary;
        debug!(
            server = %server,
            redirect = %id,
            pattern = %request.pattern,
            signal = %request.signal,
            timeout,
            "Armed redirect"
        );
        metrics::record_armed(&request.pattern);

        if temporary {
            self.patterns.unregister(&request.pattern);
        }
        Ok(id)
    }

    /// Handle an external create-pattern request; the pattern is temporary.
    pub fn handle_pattern_request(&mut self, payload: &Payload) -> Result<(), RedirectError> {
        let request = PatternRequest::from_payload(payload).inspect_err(|err| {
            error!(error = %err, "Cannot create redirect pattern");
        });
        let result = request.and_then(|request| {
            self.patterns
                .register(
                    &request.pattern,
                    true,
                    request.timeout,
                    request.cmd_start.as_deref(),
                    Some(request.cmd_stop.as_str()),
                    request.cmd_extra.as_deref(),
                )
                .map(|_| ())
        });
        if let Err(ref err) = result {
            metrics::record_error(err.error_code());
        }
        result
    }

    /// Handle an external create-redirect request.
    pub fn handle_redirect_request(&mut self, payload: &Payload) -> Result<RedirectId, RedirectError> {
        match RedirectRequest::from_payload(payload) {
            Ok(request) => self.arm(&request.server, request.arm),
            Err(err) => {
                error!(error = %err, "Cannot add redirect");
                metrics::record_error(err.error_code());
                Err(err)
            }
        }
    }

    // ========================================================================
    // Traffic
    // ========================================================================

    /// Send a message on a server through its outgoing queue.
    pub fn send(
        &mut self,
        server: &str,
        message: &str,
        priority: Priority,
        now: i64,
    ) -> Result<(), RedirectError> {
        let target = self
            .server_mut(server)
            .ok_or_else(|| RedirectError::ServerNotFound(server.to_string()))?;
        target.send(message, priority, now);
        Ok(())
    }

    /// Process one line received on a server.
    ///
    /// Lines for an unknown server skip redirects and ignores.
    pub fn receive(&mut self, server: &str, line: &str, now: i64) -> Result<Inbound, ProtocolError> {
        match self.servers.iter_mut().find(|s| s.name() == server) {
            Some(target) => target.receive(line, &self.ignores, now),
            None => {
                warn!(server = %server, "Line received for unknown server");
                let message: Message = line.parse()?;
                Ok(Inbound::Display(message))
            }
        }
    }

    /// Drain every outgoing queue whose anti-flood delay elapsed.
    pub fn flush(&mut self, now: i64) {
        for server in &mut self.servers {
            server.flush_queue(now);
        }
    }

    /// Finalize timed-out redirects on every server.
    pub fn check_timeouts(&mut self, now: i64) -> usize {
        self.servers
            .iter_mut()
            .map(|server| server.check_timeouts(now))
            .sum()
    }

    // ========================================================================
    // Ignores
    // ========================================================================

    /// Run an `/ignore` command line, returning the lines to show.
    pub fn ignore_command(&mut self, args: &str) -> Result<Vec<String>, CommandError> {
        let result =
            IgnoreCommand::parse(args).and_then(|command| command.execute(&mut self.ignores));
        if let Err(ref err) = result {
            warn!(args = %args, error = %err, "Ignore command failed");
            metrics::record_error(err.error_code());
        }
        result
    }

    /// Replace the ignore list with the rules stored in `path`.
    pub fn load_ignores<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, IgnoreError> {
        let count = persistence::load_file(&mut self.ignores, path.as_ref())?;
        info!(path = %path.as_ref().display(), count, "Loaded ignore rules");
        Ok(count)
    }

    pub fn save_ignores<P: AsRef<Path>>(&self, path: P) -> Result<(), IgnoreError> {
        persistence::save_file(&self.ignores, path.as_ref())?;
        info!(path = %path.as_ref().display(), count = self.ignores.len(), "Saved ignore rules");
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn pattern_infos(&self) -> Vec<PatternInfo> {
        self.patterns.infos()
    }

    pub fn redirect_infos(&self) -> Vec<RedirectInfo> {
        self.servers
            .iter()
            .flat_map(|server| server.redirects().infos(server.name()))
            .collect()
    }

    pub fn ignore_infos(&self) -> Vec<IgnoreInfo> {
        self.ignores.infos()
    }

    /// Dump patterns, redirects and ignore rules at debug level.
    pub fn log_state(&self) {
        for pattern in self.pattern_infos() {
            debug!(
                name = %pattern.name,
                temporary = pattern.temporary,
                timeout = pattern.timeout,
                cmd_start = %pattern.cmd_start,
                cmd_stop = %pattern.cmd_stop,
                cmd_extra = %pattern.cmd_extra,
                "redirect pattern"
            );
        }
        for redirect in self.redirect_infos() {
            debug!(
                id = redirect.id,
                server = %redirect.server,
                pattern = %redirect.pattern,
                signal = %redirect.signal,
                count = redirect.count,
                current_count = redirect.current_count,
                timeout = redirect.timeout,
                state = ?redirect.state,
                output_size = redirect.output_size,
                "redirect"
            );
        }
        for rule in self.ignore_infos() {
            debug!(
                number = rule.number,
                mask = %rule.mask,
                server = %rule.server,
                channel = %rule.channel,
                "ignore"
            );
        }
    }

    /// Drop every redirect and temporary pattern.
    pub fn shutdown(&mut self) {
        for server in &mut self.servers {
            server.disconnect();
        }
        self.patterns.unregister_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{ChannelNotifier, NoopNotifier};

    fn engine() -> Engine {
        let mut engine = Engine::new(Arc::new(NoopNotifier));
        engine
            .add_server("libera", FloodSettings { prio_high: 0, prio_low: 0 })
            .set_connected();
        engine
    }

    #[test]
    fn arm_checks_server_and_pattern() {
        let mut engine = engine();
        engine.add_server("offline", FloodSettings::default());

        assert_eq!(
            engine.arm("nowhere", ArmRequest::new("whois", "s")),
            Err(RedirectError::ServerNotFound("nowhere".into()))
        );
        assert_eq!(
            engine.arm("offline", ArmRequest::new("whois", "s")),
            Err(RedirectError::ServerNotConnected("offline".into()))
        );
        assert_eq!(
            engine.arm("libera", ArmRequest::new("nope", "s")),
            Err(RedirectError::PatternNotFound("nope".into()))
        );
        assert_eq!(
            engine.arm("libera", ArmRequest::new("whois", "")),
            Err(RedirectError::MissingArgument("signal"))
        );
        assert!(engine.arm("libera", ArmRequest::new("whois", "s")).is_ok());
    }

    #[test]
    fn timeout_resolution() {
        let mut engine = engine().with_default_timeout(30);
        engine
            .patterns
            .register("slow", false, 90, None, Some("123"), None)
            .unwrap();

        let a = engine.arm("libera", ArmRequest::new("whois", "s")).unwrap();
        let b = engine.arm("libera", ArmRequest::new("slow", "s")).unwrap();
        let c = engine
            .arm("libera", ArmRequest::new("slow", "s").timeout(5))
            .unwrap();

        let redirects = engine.server("libera").unwrap().redirects();
        assert_eq!(redirects.get(a).unwrap().timeout(), 30);
        assert_eq!(redirects.get(b).unwrap().timeout(), 90);
        assert_eq!(redirects.get(c).unwrap().timeout(), 5);
    }

    #[test]
    fn temporary_pattern_is_spent() {
        let mut engine = engine();
        let payload: Payload = [("pattern", "once"), ("cmd_stop", "999")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        engine.handle_pattern_request(&payload).unwrap();
        assert!(engine.patterns.lookup("once").unwrap().temporary);

        engine.arm("libera", ArmRequest::new("once", "s")).unwrap();
        assert!(engine.patterns.lookup("once").is_none());
        assert_eq!(
            engine.arm("libera", ArmRequest::new("once", "s")),
            Err(RedirectError::PatternNotFound("once".into()))
        );
    }

    #[test]
    fn redirect_request_missing_server() {
        let mut engine = engine();
        let payload = Payload::new();
        assert_eq!(
            engine.handle_redirect_request(&payload),
            Err(RedirectError::MissingArgument("server"))
        );
    }

    #[tokio::test]
    async fn round_trip_through_engine() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let mut engine = Engine::new(Arc::new(notifier));
        engine
            .add_server("libera", FloodSettings { prio_high: 0, prio_low: 0 })
            .set_connected();

        engine.arm("libera", ArmRequest::new("time", "clock")).unwrap();
        engine.send("libera", "TIME", Priority::High, 100).unwrap();
        assert_eq!(engine.server_mut("libera").unwrap().take_writes(), vec!["TIME"]);

        let inbound = engine
            .receive("libera", ":irc.test 391 me irc.test :Sunday", 101)
            .unwrap();
        assert_eq!(inbound, Inbound::Redirected);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "irc_redirection_clock_time");
        assert_eq!(event.command.as_deref(), Some("TIME"));
        assert!(engine.redirect_infos().is_empty());
    }

    #[test]
    fn ignore_command_and_receive() {
        let mut engine = engine();
        engine.ignore_command("add troll*").unwrap();

        let inbound = engine
            .receive("libera", ":trollface!t@h PRIVMSG #chan :hi", 0)
            .unwrap();
        assert_eq!(inbound, Inbound::Ignored);

        let lines = engine.ignore_command("list").unwrap();
        assert_eq!(lines[1], "  [1] mask: troll.* / server: * / channel: *");
    }

    #[test]
    fn remove_server_drops_redirects() {
        let mut engine = engine();
        engine.arm("libera", ArmRequest::new("whois", "s")).unwrap();
        let server = engine.remove_server("libera").unwrap();
        assert!(server.redirects().is_empty());
        assert!(engine.server("libera").is_none());
    }
}
