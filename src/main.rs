//! slirc-redirect - IRC client driving the redirect engine.
//!
//! Connects to the configured server, sends the configured queries with
//! redirects armed for their replies and logs every completion event.

use std::sync::Arc;

use slirc_redirect::config::{Config, validate};
use slirc_redirect::network::Client;
use slirc_redirect::redirect::ChannelNotifier;
use slirc_redirect::{Engine, metrics};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    info!(
        server = %config.server.name,
        address = %config.server.address,
        queries = config.query.len(),
        "Starting slirc-redirect"
    );

    metrics::init();

    let (notifier, completions) = ChannelNotifier::new();
    let mut engine =
        Engine::new(Arc::new(notifier)).with_default_timeout(config.redirect.default_timeout);

    if let Some(path) = &config.ignore.file {
        if path.exists() {
            engine.load_ignores(path)?;
        } else {
            info!(path = %path.display(), "Ignore file not found, starting empty");
        }
    }
    engine.log_state();

    let result = Client::new(&config, &mut engine, completions).run().await;
    if let Err(e) = &result {
        error!(error = %e, "Client session failed");
        metrics::record_error(e.error_code());
    }

    if let Some(path) = &config.ignore.file {
        if let Err(e) = engine.save_ignores(path) {
            warn!(path = %path.display(), error = %e, "Failed to save ignore rules");
        }
    }
    engine.shutdown();

    info!(metrics = %metrics::gather(), "Final metrics");
    result?;
    Ok(())
}
