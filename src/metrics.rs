//! Prometheus metrics for the redirect engine and ignore matcher.
//!
//! - `redirect_armed_total{pattern}` - Redirects armed by pattern
//! - `redirect_completed_total{pattern}` - Completion events by pattern
//! - `redirect_errors_total{error}` - Failed arms/requests and timeouts
//! - `redirect_messages_consumed_total` - Inbound lines captured by redirects
//! - `redirect_output_bytes` - Output size of completed redirects
//! - `ignore_hits_total` - Inbound lines suppressed by ignore rules
//!
//! Recording is a no-op until [`init`] has run.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Redirects armed, by pattern.
pub static REDIRECTS_ARMED: OnceLock<IntCounterVec> = OnceLock::new();

/// Completion events emitted, by pattern.
pub static REDIRECTS_COMPLETED: OnceLock<IntCounterVec> = OnceLock::new();

/// Errors by kind (`timeout` or a `RedirectError` code).
pub static REDIRECT_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Inbound messages consumed by a redirect.
pub static MESSAGES_CONSUMED: OnceLock<IntCounter> = OnceLock::new();

/// Inbound messages suppressed by an ignore rule.
pub static IGNORE_HITS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Output bytes per completed redirect.
pub static REDIRECT_OUTPUT_BYTES: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers metrics.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(REDIRECTS_ARMED, IntCounterVec::new(Opts::new("redirect_armed_total", "Redirects armed by pattern"), &["pattern"]));
    register!(REDIRECTS_COMPLETED, IntCounterVec::new(Opts::new("redirect_completed_total", "Redirect completion events by pattern"), &["pattern"]));
    register!(REDIRECT_ERRORS, IntCounterVec::new(Opts::new("redirect_errors_total", "Redirect errors by kind"), &["error"]));
    register!(MESSAGES_CONSUMED, IntCounter::new("redirect_messages_consumed_total", "Inbound messages consumed by redirects"));
    register!(IGNORE_HITS, IntCounter::new("ignore_hits_total", "Inbound messages suppressed by ignore rules"));
    register!(REDIRECT_OUTPUT_BYTES, Histogram::with_opts(
        HistogramOpts::new("redirect_output_bytes", "Output size of completed redirects")
            .buckets(vec![0.0, 64.0, 256.0, 1024.0, 4096.0, 16384.0, 65536.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

#[inline]
pub fn record_armed(pattern: &str) {
    if let Some(c) = REDIRECTS_ARMED.get() {
        c.with_label_values(&[pattern]).inc();
    }
}

/// Record a completion event; errors are also counted by kind.
#[inline]
pub fn record_completed(pattern: &str, error: &str, output_size: usize) {
    if let Some(c) = REDIRECTS_COMPLETED.get() {
        c.with_label_values(&[pattern]).inc();
    }
    if !error.is_empty() {
        record_error(error);
    }
    if let Some(h) = REDIRECT_OUTPUT_BYTES.get() {
        h.observe(output_size as f64);
    }
}

#[inline]
pub fn record_error(error: &str) {
    if let Some(c) = REDIRECT_ERRORS.get() {
        c.with_label_values(&[error]).inc();
    }
}

#[inline]
pub fn record_consumed() {
    if let Some(c) = MESSAGES_CONSUMED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_ignored() {
    if let Some(c) = IGNORE_HITS.get() {
        c.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_armed("whois");
        record_completed("whois", "timeout", 12);
        record_consumed();
        record_ignored();

        let output = gather();
        assert!(output.contains("redirect_armed_total"));
        assert!(output.contains("redirect_errors_total{error=\"timeout\"}"));
        assert!(output.contains("ignore_hits_total"));
    }
}
