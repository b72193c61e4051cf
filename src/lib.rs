//! json-stamp - type-preserving value substitution for JSON configuration
//!
//! Rewrites selected leaf values in JSON documents addressed by dotted key
//! paths (`Logging.LogLevel.Default`, `Servers.2.Port`), converting each
//! replacement string into the JSON type already present at that path.
//!
//! - **Substitution**: path resolution, typed conversion, all-or-nothing commit
//! - **Variables**: environment or explicit `key=value` sources
//! - **Targets**: glob discovery over directories and zip packages
//!
//! # Quick Start
//!
//! ```
//! use json_stamp::substitution::JsonSubstituter;
//! use json_stamp::variables::Variables;
//!
//! let mut variables = Variables::new();
//! variables.insert("foo.1", "1259");
//!
//! let outcome = JsonSubstituter::default().substitute(&variables, r#"{"Foo":[58,96,15,0]}"#);
//! assert!(outcome.was_substituted);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

// ─── Core ──────────────────────────────────────────────────────────
pub mod errors;
pub mod substitution;
pub mod variables;

// ─── Orchestration ─────────────────────────────────────────────────
pub mod cli;
pub mod config;
pub mod targets;

// ─── Observability ─────────────────────────────────────────────────
pub mod observability;
pub mod redact;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Ask long-running batches to stop after the current document.
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Whether a shutdown signal has been received.
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
