//! # Non-Blocking Event Log
//!
//! A diagnostic event log that hard real-time threads (audio mixers, control
//! loops) can write to without blocking, allocating or risking priority
//! inversion, while a separate non-real-time thread or process drains and
//! renders it later.
//!
//! ## Features
//!
//! - **Wait-Free Writes**: one relaxed byte copy per record plus a single release store
//! - **Lock-Free Reads**: readers never write shared state and never block the writer
//! - **Single-Writer Multi-Reader**: each reader keeps its own front cursor
//! - **Self-Healing Dumps**: overwritten or torn data degrades to a "lost bytes" line
//! - **Cross-Process**: named segments mapped read-only by a separate dumper
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────────┐    ┌─────────────────┐
//! │  RT thread      │    │  SharedBuffer        │    │  Reader 1       │
//! │                 │    │                      │    │                 │
//! │  Writer         ├───►│ [rear | ring bytes]  ├───►│  dump(sink)     │
//! │  log / nblog!   │    │  power-of-two ring   │    │  front cursor   │
//! └─────────────────┘    └──────────────────────┘    └─────────────────┘
//!                                  │
//!                                  │                 ┌─────────────────┐
//!                                  └────────────────►│  Reader N       │
//!                                                    └─────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! Each record is `[event: u8][length: u8][data; length][length: u8]`, 3 to
//! 258 bytes, stored contiguously in the ring and wrapping at its end.
//!
//! ## Usage
//!
//! ```rust
//! use nblog::{Reader, SharedBuffer, Timestamp, Writer, nblog};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let shared = SharedBuffer::new(4096)?;
//!
//! // Real-time side
//! let mut writer = Writer::new(shared.clone())?;
//! writer.log_timestamp_at(Timestamp::new(12, 345_000_000));
//! nblog!(writer, "underrun: {} frames", 256);
//!
//! // Dump side
//! let mut reader = Reader::new(shared);
//! let mut lines: Vec<String> = Vec::new();
//! reader.dump(&mut lines, 0);
//! assert_eq!(lines, vec!["[12.345] underrun: 256 frames"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Cross-Process Logs
//!
//! ```rust,no_run
//! use nblog::{LogSegment, Reader, SegmentConfig, Writer, WriteSink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SegmentConfig::default();
//!
//! // Producer process
//! let mut writer = Writer::new(LogSegment::create("mixer", 4096, &config)?)?;
//! writer.log("started");
//!
//! // Dumper process
//! let mut reader = Reader::new(LogSegment::attach("mixer", &config)?);
//! reader.dump(&mut WriteSink(std::io::stdout()), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - **Writer**: `&mut self`; exactly one per buffer, enforced at attach
//! - **LockedWriter**: `&self` behind a mutex; for non-real-time threads only
//! - **Reader**: one per consumer; any number per buffer
//! - **LogService**: internally synchronized; never touched from the RT path

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod platform;
pub mod reader;
pub mod registry;
mod render;
pub mod segment;
pub mod timeline;
pub mod timestamp;
pub mod writer;

pub use entry::{Entry, Event, RecordView};
pub use error::{NbLogError, NbLogResult};
pub use reader::{DumpSink, DumpSummary, Reader, TracingSink, WriteSink, scan_valid_start};
pub use registry::LogService;
pub use segment::{LogSegment, SegmentConfig};
pub use timeline::{SharedBuffer, Timeline};
pub use timestamp::Timestamp;
pub use writer::{LockedWriter, Writer};

/// Initialize tracing for the non-real-time side of the log
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
