//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions and `Config::load`
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks returning every error found

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConfigError, IgnoreConfig, QueryConfig, RedirectConfig, ServerConfig};
pub use validation::{ValidationError, validate};
