//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{
    default_query_count, default_realname, default_redirect_timeout, default_sweep_interval_ms,
};
use crate::redirect::ArmRequest;
use crate::server::FloodSettings;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server to connect to.
    pub server: ServerConfig,
    /// Redirect engine tuning.
    #[serde(default)]
    pub redirect: RedirectConfig,
    /// Anti-flood delays for the outgoing queue.
    #[serde(default)]
    pub flood: FloodSettings,
    /// Ignore list persistence.
    #[serde(default)]
    pub ignore: IgnoreConfig,
    /// Queries sent with an armed redirect once registered.
    #[serde(default)]
    pub query: Vec<QueryConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Connection name, used in ignore filters and completion events.
    pub name: String,
    /// `host:port` to connect to.
    pub address: String,
    pub nick: String,
    /// Defaults to the nick.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_realname")]
    pub realname: String,
}

impl ServerConfig {
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nick)
    }
}

/// Redirect engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    /// Timeout in seconds for patterns without their own.
    #[serde(default = "default_redirect_timeout")]
    pub default_timeout: u64,
    /// Interval of the timeout sweep.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            default_timeout: default_redirect_timeout(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// Ignore list configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoreConfig {
    /// File rules are loaded from at startup and saved to on shutdown.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// A command sent at startup with a redirect armed for its reply.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub pattern: String,
    pub signal: String,
    /// Raw command line.
    pub command: String,
    /// Disambiguator.
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default = "default_query_count")]
    pub count: u32,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub cmd_filter: Option<String>,
}

impl QueryConfig {
    pub fn arm_request(&self) -> ArmRequest {
        ArmRequest {
            pattern: self.pattern.clone(),
            signal: self.signal.clone(),
            count: self.count,
            string: self.string.clone(),
            timeout: self.timeout,
            cmd_filter: self.cmd_filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fill_optional_sections() {
        let config: Config = toml::from_str(
            r#"
[server]
name = "libera"
address = "irc.libera.chat:6667"
nick = "slirc"
"#,
        )
        .unwrap();
        assert_eq!(config.redirect.default_timeout, 60);
        assert_eq!(config.redirect.sweep_interval_ms, 1000);
        assert_eq!(config.flood, FloodSettings::default());
        assert_eq!(config.server.username(), "slirc");
        assert!(config.ignore.file.is_none());
        assert!(config.query.is_empty());
    }

    #[test]
    fn query_becomes_arm_request() {
        let config: Config = toml::from_str(
            r#"
[server]
name = "libera"
address = "irc.libera.chat:6667"
nick = "slirc"

[[query]]
pattern = "whois"
signal = "probe"
command = "WHOIS bob"
string = "bob"
"#,
        )
        .unwrap();
        let request = config.query[0].arm_request();
        assert_eq!(request.pattern, "whois");
        assert_eq!(request.count, 1);
        assert_eq!(request.string.as_deref(), Some("bob"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nname = \"x\"\naddress = \"h:1\"\nnick = \"n\"\n[flood]\nprio_high = 0"
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.flood.prio_high, 0);
        assert_eq!(config.flood.prio_low, 2);
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::load("/nonexistent/slirc.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
