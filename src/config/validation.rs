//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.address is required")]
    MissingAddress,
    #[error("server.nick is required")]
    MissingNick,
    #[error("server.nick must not contain spaces, got '{0}'")]
    InvalidNick(String),
    #[error("redirect.default_timeout must be greater than 0")]
    InvalidDefaultTimeout,
    #[error("query #{0}: pattern is required")]
    QueryMissingPattern(usize),
    #[error("query #{0}: signal is required")]
    QueryMissingSignal(usize),
    #[error("query #{0}: count must be at least 1")]
    QueryInvalidCount(usize),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }
    if config.server.address.is_empty() {
        errors.push(ValidationError::MissingAddress);
    }
    if config.server.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if config.server.nick.contains(' ') {
        errors.push(ValidationError::InvalidNick(config.server.nick.clone()));
    }

    if config.redirect.default_timeout == 0 {
        errors.push(ValidationError::InvalidDefaultTimeout);
    }

    // Queries are numbered from 1 in messages
    for (index, query) in config.query.iter().enumerate() {
        let number = index + 1;
        if query.pattern.is_empty() {
            errors.push(ValidationError::QueryMissingPattern(number));
        }
        if query.signal.is_empty() {
            errors.push(ValidationError::QueryMissingSignal(number));
        }
        if query.count == 0 {
            errors.push(ValidationError::QueryInvalidCount(number));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[server]
name = "libera"
address = "irc.libera.chat:6667"
nick = "slirc"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_server_name_fails() {
        let toml = r#"
[server]
name = ""
address = "irc.libera.chat:6667"
nick = "slirc"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingServerName)));
    }

    #[test]
    fn test_nick_with_space_fails() {
        let toml = r#"
[server]
name = "libera"
address = "irc.libera.chat:6667"
nick = "sl irc"

[redirect]
default_timeout = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidNick(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidDefaultTimeout)));
    }

    #[test]
    fn test_query_errors_collected() {
        let toml = format!(
            "{}\n[[query]]\npattern = \"\"\nsignal = \"\"\ncommand = \"TIME\"\ncount = 0\n",
            minimal_valid_config()
        );
        let config: Config = toml::from_str(&toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].to_string(), "query #1: pattern is required");
    }
}
