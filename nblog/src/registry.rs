//! Log service: hands out writers and dumps every registered log by name
//!
//! A host process owns one `LogService`. Each real-time thread asks it for a
//! writer; the service keeps a reader for that buffer under the thread's
//! name and renders all of them on request. When logging is switched off the
//! service hands out detached writers, so call sites never branch.

use crate::error::{NbLogError, NbLogResult};
use crate::reader::{DumpSink, DumpSummary, Reader};
use crate::timeline::SharedBuffer;
use crate::writer::Writer;
use nblog_common::consts::MAX_NAMED_READERS;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Indentation of each reader's lines under its name
const READER_INDENT: usize = 2;

struct NamedReader {
    name: String,
    reader: Reader,
}

impl NamedReader {
    fn shared(&self) -> &Arc<SharedBuffer> {
        self.reader.shared()
    }
}

/// Registry of named readers plus a writer factory
pub struct LogService {
    enabled: bool,
    readers: Mutex<Vec<NamedReader>>,
}

impl LogService {
    /// Create a service; a disabled service only hands out detached writers
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            readers: Mutex::new(Vec::new()),
        }
    }

    /// Service with logging switched off
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Whether writers handed out are attached
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Allocate a buffer of `size` bytes, register it as `name` and return its
    /// writer. Any failure yields a detached writer.
    pub fn new_writer(&self, size: usize, name: &str) -> Writer {
        if !self.enabled {
            return Writer::detached();
        }

        let attached = SharedBuffer::new(size).and_then(|shared| {
            let writer = Writer::new(shared.clone())?;
            self.register(name, shared)?;
            Ok(writer)
        });

        match attached {
            Ok(writer) => writer,
            Err(e) => {
                warn!("Log '{}' unavailable, logging disabled for it: {}", name, e);
                Writer::detached()
            }
        }
    }

    /// Register an existing buffer under `name`
    pub fn register(&self, name: &str, shared: Arc<SharedBuffer>) -> NbLogResult<()> {
        let mut readers = self.readers.lock();
        if readers.len() >= MAX_NAMED_READERS {
            return Err(NbLogError::RegistryFull {
                max: MAX_NAMED_READERS,
            });
        }

        info!(
            "Registered log '{}' ({} bytes ring)",
            name,
            shared.capacity()
        );
        readers.push(NamedReader {
            name: name.to_string(),
            reader: Reader::new(shared),
        });
        Ok(())
    }

    /// Drop the reader for `shared`. Returns whether one was registered.
    pub fn unregister(&self, shared: &Arc<SharedBuffer>) -> bool {
        let mut readers = self.readers.lock();
        let before = readers.len();
        readers.retain(|named| {
            let keep = !Arc::ptr_eq(named.shared(), shared);
            if !keep {
                info!("Unregistered log '{}'", named.name);
            }
            keep
        });
        readers.len() != before
    }

    /// Drop the reader for `writer`'s buffer; no-op for detached writers
    pub fn unregister_writer(&self, writer: &Writer) -> bool {
        writer
            .shared()
            .is_some_and(|shared| self.unregister(shared))
    }

    /// Names of registered logs in registration order
    pub fn names(&self) -> Vec<String> {
        self.readers
            .lock()
            .iter()
            .map(|named| named.name.clone())
            .collect()
    }

    /// Dump every registered log: a `<name>:` header, then its new records
    pub fn dump(&self, sink: &mut dyn DumpSink) -> DumpSummary {
        let mut total = DumpSummary::default();
        let mut readers = self.readers.lock();
        for named in readers.iter_mut() {
            sink.write_line(&format!("{}:", named.name));
            let summary = named.reader.dump(sink, READER_INDENT);
            total.lost_bytes += summary.lost_bytes;
            total.entries += summary.entries;
            total.lines += summary.lines + 1;
        }
        total
    }
}

impl Default for LogService {
    fn default() -> Self {
        Self::new(true)
    }
}
