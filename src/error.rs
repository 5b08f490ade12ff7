//! Unified error handling for slirc-redirect.
//!
//! Every error enum carries an `error_code()` static label used for
//! metrics, the way command-handling errors are labeled in the server.

use thiserror::Error;

// ============================================================================
// Redirect Errors (patterns, arming, external requests)
// ============================================================================

/// Errors raised while registering patterns or arming redirects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("redirect pattern \"{0}\" already exists")]
    DuplicateName(String),

    #[error("missing stop command for redirect pattern \"{0}\"")]
    MissingStopCondition(String),

    #[error("redirect pattern \"{0}\" not found")]
    PatternNotFound(String),

    #[error("cannot add redirect: not connected to server \"{0}\"")]
    ServerNotConnected(String),

    #[error("server \"{0}\" not found")]
    ServerNotFound(String),

    /// A required key of an external request (or a required arm field) is
    /// missing or empty.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

impl RedirectError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateName(_) => "duplicate_name",
            Self::MissingStopCondition(_) => "missing_stop_condition",
            Self::PatternNotFound(_) => "pattern_not_found",
            Self::ServerNotConnected(_) => "server_not_connected",
            Self::ServerNotFound(_) => "server_not_found",
            Self::MissingArgument(_) => "missing_argument",
        }
    }
}

// ============================================================================
// Ignore Errors
// ============================================================================

/// Errors raised by the ignore list and its persistence.
#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("ignore mask is empty")]
    EmptyMask,

    #[error("invalid ignore mask \"{mask}\": {source}")]
    InvalidRegex {
        mask: String,
        #[source]
        source: regex::Error,
    },

    #[error("ignore already exists")]
    AlreadyExists,

    #[error("ignore not found")]
    NotFound,

    #[error("malformed ignore line {line}: {content}")]
    MalformedLine { line: usize, content: String },

    #[error("ignore file error: {0}")]
    Io(#[from] std::io::Error),
}

impl IgnoreError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMask => "empty_mask",
            Self::InvalidRegex { .. } => "invalid_regex",
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::MalformedLine { .. } => "malformed_line",
            Self::Io(_) => "io_error",
        }
    }
}

// ============================================================================
// Command Errors (/ignore)
// ============================================================================

/// Errors from the `/ignore` command surface.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("invalid ignore number: {0}")]
    InvalidNumber(String),

    #[error(transparent)]
    Ignore(#[from] IgnoreError),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::UnknownSubcommand(_) => "unknown_subcommand",
            Self::InvalidNumber(_) => "invalid_number",
            Self::Ignore(e) => e.error_code(),
        }
    }
}
