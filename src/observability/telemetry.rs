//! Telemetry & Observability
//!
//! Provides structured logging for substitution runs.
//! Features:
//! - Compact stderr output, one line per event
//! - Level chosen from the command line, overridable via RUST_LOG
//! - Log-injection safe rendering of externally supplied keys and values

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sanitize a string for safe log output by escaping control characters.
/// Variable keys and values come from the environment or the command line
/// and may embed newlines that would forge log entries.
pub fn sanitize_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x1b' => out.push_str("\\e"),
            '\x00' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

/// Map the quiet/verbose switches to a default filter directive.
pub fn default_filter(quiet: bool, verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Initialize global tracing subscriber. `RUST_LOG` wins over the
/// command-line level when it is set.
pub fn init_tracing(quiet: bool, verbose: bool) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| default_filter(quiet, verbose).to_string());
    init_tracing_with_filter(&filter);
}

/// Initialize with custom filter string
pub fn init_tracing_with_filter(filter: &str) {
    // Skip if already initialized
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_level(true)
            .compact()
            .with_writer(std::io::stderr); // Write to stderr, stdout carries the summary

        let filter_layer = EnvFilter::try_new(filter)
            .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}
