//! Integration test common infrastructure.
//!
//! Provides a recording completion notifier, engine/server fixtures and a
//! scripted IRC server for driving the client runtime.

pub mod server;

use std::sync::Arc;

use parking_lot::Mutex;
use slirc_redirect::Engine;
use slirc_redirect::redirect::{CompletionEvent, CompletionNotifier};
use slirc_redirect::server::{FloodSettings, Server};

#[allow(unused_imports)]
pub use server::ScriptedServer;

/// Notifier that keeps every event it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, CompletionEvent)>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn events(&self) -> Vec<CompletionEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

impl CompletionNotifier for RecordingNotifier {
    fn notify(&self, name: &str, event: &CompletionEvent) {
        self.events.lock().push((name.to_string(), event.clone()));
    }
}

/// Flood settings that never queue.
#[allow(dead_code)]
pub fn no_flood() -> FloodSettings {
    FloodSettings {
        prio_high: 0,
        prio_low: 0,
    }
}

/// A connected, registered server named `test` whose own nick is `me`.
#[allow(dead_code)]
pub fn connected_server() -> (Server, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut server = Server::new("test", no_flood(), notifier.clone());
    server.set_connected();
    server.set_nick("me");
    (server, notifier)
}

/// An engine with one connected, registered server named `test`.
#[allow(dead_code)]
pub fn engine() -> (Engine, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = Engine::new(notifier.clone());
    let server = engine.add_server("test", no_flood());
    server.set_connected();
    server.set_nick("me");
    (engine, notifier)
}
