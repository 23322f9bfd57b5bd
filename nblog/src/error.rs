//! Error types for log setup operations
//!
//! Only setup can fail: allocating a buffer, creating or attaching a named
//! segment, attaching a writer, registering a reader. Logging and dumping
//! never return errors.

use thiserror::Error;

/// Errors that can occur while setting up a log
#[derive(Error, Debug)]
pub enum NbLogError {
    /// Requested capacity is zero or above the maximum
    #[error("Invalid log capacity: {requested} bytes (must be 1B-1GB)")]
    InvalidCapacity {
        /// Requested capacity in bytes
        requested: usize,
    },

    /// Named segment already exists
    #[error("Log segment already exists: {name}")]
    AlreadyExists {
        /// Segment name
        name: String,
    },

    /// Named segment not found
    #[error("Log segment not found: {name}")]
    NotFound {
        /// Segment name
        name: String,
    },

    /// Segment has a layout that cannot hold a ring buffer
    #[error("Invalid log segment {name}: {len} bytes")]
    InvalidSegment {
        /// Segment name
        name: String,
        /// Mapped length in bytes
        len: usize,
    },

    /// An unsynchronized writer is already attached to the buffer
    #[error("A writer is already attached to this log buffer")]
    WriterAttached,

    /// The buffer is mapped read-only
    #[error("Log buffer is read-only")]
    ReadOnly,

    /// Log service holds the maximum number of readers
    #[error("Log service is full ({max} readers)")]
    RegistryFull {
        /// Reader limit
        max: usize,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Nix system call error
    #[error("System call error: {source}")]
    Nix {
        /// Source nix error
        #[from]
        source: nix::Error,
    },
}

/// Result type for log setup operations
pub type NbLogResult<T> = Result<T, NbLogError>;
