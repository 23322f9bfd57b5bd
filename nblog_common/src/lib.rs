//! Common library for the non-blocking event log workspace.
//!
//! This crate provides the shared wire/sizing constants and configuration
//! loading utilities used by the log core and its tools.
//!
//! # Module Structure
//!
//! - [`consts`] - Record layout and buffer sizing constants
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use nblog_common::consts::*;
//! use nblog_common::config::{ConfigLoader, SharedConfig};
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
