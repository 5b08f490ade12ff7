//! Network layer: one tokio task driving the engine against a server.
//!
//! - [`connection`]: socket framing and the `tokio::select!` event loop

pub mod connection;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

pub use connection::Client;

/// Longest line accepted from the server, tags included.
pub const MAX_LINE_LENGTH: usize = 8704;

/// Errors that end a client session.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),
    #[error("server \"{0}\" is not registered with the engine")]
    UnknownServer(String),
}

impl NetworkError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Codec(_) => "codec",
            Self::UnknownServer(_) => "unknown_server",
        }
    }
}

/// Wall-clock seconds used for anti-flood and timeout bookkeeping.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
