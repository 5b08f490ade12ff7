//! Default value functions for configuration.

use crate::redirect::DEFAULT_TIMEOUT;

// =============================================================================
// Redirect Defaults
// =============================================================================

pub fn default_redirect_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

pub fn default_sweep_interval_ms() -> u64 {
    1000
}

// =============================================================================
// Query Defaults
// =============================================================================

pub fn default_query_count() -> u32 {
    1
}

pub fn default_realname() -> String {
    "slirc redirect client".to_string()
}
