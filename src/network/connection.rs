//! Client connection event loop.
//!
//! ```text
//!   socket lines ──► Engine::receive ──► completions ──► log
//!        ▲                 │
//!        │            outgoing queue
//!        └──── take_writes ◄──┘  (flush tick, timeout sweep tick)
//! ```
//!
//! Every branch of the loop ends by writing whatever the engine queued
//! for transmission, so redirects are bound exactly when their line hits
//! the socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, trace, warn};

use super::{MAX_LINE_LENGTH, NetworkError, now};
use crate::config::{Config, QueryConfig};
use crate::engine::Engine;
use crate::redirect::CompletionEvent;
use crate::server::{Inbound, Priority};

/// How often the outgoing queue is polled for lines whose delay elapsed.
const FLUSH_INTERVAL: Duration = Duration::from_millis(250);

/// A client session bound to one configured server.
pub struct Client<'a> {
    config: &'a Config,
    engine: &'a mut Engine,
    completions: mpsc::UnboundedReceiver<CompletionEvent>,
    queries_sent: bool,
}

impl<'a> Client<'a> {
    pub fn new(
        config: &'a Config,
        engine: &'a mut Engine,
        completions: mpsc::UnboundedReceiver<CompletionEvent>,
    ) -> Self {
        Self {
            config,
            engine,
            completions,
            queries_sent: false,
        }
    }

    fn server_name(&self) -> &'a str {
        let config: &'a Config = self.config;
        &config.server.name
    }

    /// Connect, register and run until the server closes the connection
    /// or Ctrl-C is received.
    pub async fn run(mut self) -> Result<(), NetworkError> {
        let config: &'a Config = self.config;
        let address = &config.server.address;
        let stream = TcpStream::connect(address).await?;
        info!(server = %self.server_name(), address = %address, "Connected");

        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let result = self.session(&mut framed).await;

        // Pending completions emitted during teardown still get logged.
        while let Ok(event) = self.completions.try_recv() {
            log_completion(&event);
        }
        self.engine.remove_server(self.server_name());
        result
    }

    async fn session(
        &mut self,
        framed: &mut Framed<TcpStream, LinesCodec>,
    ) -> Result<(), NetworkError> {
        let name = self.server_name();
        self.engine
            .add_server(name, self.config.flood)
            .set_connected();
        self.register()?;
        self.write_pending(framed).await?;

        let mut flush = tokio::time::interval(FLUSH_INTERVAL);
        let mut sweep = tokio::time::interval(Duration::from_millis(
            self.config.redirect.sweep_interval_ms.max(1),
        ));
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = framed.next() => match line {
                    Some(Ok(line)) => self.handle_line(&line)?,
                    Some(Err(e)) => {
                        error!(server = %name, error = %e, "Read error");
                        return Err(e.into());
                    }
                    None => {
                        info!(server = %name, "Connection closed by server");
                        return Ok(());
                    }
                },
                _ = flush.tick() => {
                    self.engine.flush(now());
                }
                _ = sweep.tick() => {
                    let expired = self.engine.check_timeouts(now());
                    if expired > 0 {
                        debug!(server = %name, expired, "Swept redirect timeouts");
                    }
                }
                Some(event) = self.completions.recv() => {
                    log_completion(&event);
                }
                _ = &mut shutdown => {
                    info!(server = %name, "Shutdown requested");
                    self.send("QUIT :shutting down", Priority::Immediate)?;
                    self.write_pending(framed).await?;
                    return Ok(());
                }
            }
            self.write_pending(framed).await?;
        }
    }

    fn send(&mut self, line: &str, priority: Priority) -> Result<(), NetworkError> {
        let name = self.server_name();
        self.engine
            .send(name, line, priority, now())
            .map_err(|_| NetworkError::UnknownServer(name.to_string()))
    }

    fn register(&mut self) -> Result<(), NetworkError> {
        let config: &'a Config = self.config;
        let server = &config.server;
        self.send(&format!("NICK {}", server.nick), Priority::Immediate)?;
        self.send(
            &format!("USER {} 0 * :{}", server.username(), server.realname),
            Priority::Immediate,
        )
    }

    fn handle_line(&mut self, line: &str) -> Result<(), NetworkError> {
        let name = self.server_name();
        match self.engine.receive(name, line, now()) {
            Ok(Inbound::Redirected) => trace!(server = %name, line, "Redirected"),
            Ok(Inbound::Ignored) => debug!(server = %name, line, "Ignored"),
            Ok(Inbound::Display(message)) => {
                info!(target: "slirc_redirect::display", server = %name, "{}", message)
            }
            Err(e) => warn!(server = %name, line, error = %e, "Unparsable line"),
        }

        if !self.queries_sent && self.is_registered() {
            self.queries_sent = true;
            let config: &'a Config = self.config;
            for query in &config.query {
                self.send_query(query)?;
            }
        }
        Ok(())
    }

    fn is_registered(&self) -> bool {
        self.engine
            .server(self.server_name())
            .is_some_and(|server| server.nick().is_some())
    }

    /// Arm the query's redirect, then send its command.
    fn send_query(&mut self, query: &QueryConfig) -> Result<(), NetworkError> {
        let name = self.server_name();
        match self.engine.arm(name, query.arm_request()) {
            Ok(id) => {
                info!(server = %name, redirect = %id, command = %query.command, "Sending query");
                self.send(&query.command, Priority::High)
            }
            // Already reported by the engine; the reply would not be captured.
            Err(_) => Ok(()),
        }
    }

    async fn write_pending(
        &mut self,
        framed: &mut Framed<TcpStream, LinesCodec>,
    ) -> Result<(), NetworkError> {
        let name = self.server_name();
        let writes = self
            .engine
            .server_mut(name)
            .map(|server| server.take_writes())
            .unwrap_or_default();
        for line in writes {
            trace!(server = %name, line = %line, "Sending");
            framed.send(line).await?;
        }
        Ok(())
    }
}

/// Log a completion event with its full payload.
pub fn log_completion(event: &CompletionEvent) {
    let payload = serde_json::to_string(&event.to_hashtable()).unwrap_or_default();
    if event.is_error() {
        warn!(signal = %event.name(), error = %event.error, payload = %payload, "Redirect failed");
    } else {
        info!(
            signal = %event.name(),
            output_size = event.output_size,
            payload = %payload,
            "Redirect completed"
        );
    }
}
