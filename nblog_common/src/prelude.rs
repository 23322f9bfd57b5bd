//! Prelude module for common re-exports.
//!
//! ```rust
//! use nblog_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, DumpConfig, DumpSection, SharedConfig};

// ─── Wire Constants ─────────────────────────────────────────────────
pub use crate::consts::{
    DEFAULT_LOG_SIZE, ENTRY_OVERHEAD, MAX_ENTRY_LEN, MAX_PAYLOAD_LEN, SQUASH_TIMESTAMP,
    TIMESTAMP_PAYLOAD_LEN,
};
