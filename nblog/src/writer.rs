//! Non-blocking writer and its mutex-guarded variant
//!
//! [`Writer`] is safe to call from a hard real-time thread: appending a
//! record touches only the ring bytes and ends with one release store of the
//! rear cursor. No allocation, no lock, no system call (timestamps read the
//! clock through the vDSO).
//!
//! Every failure is a silent no-op so logging never changes the caller's
//! control flow. Payloads over the size limit are dropped, never truncated,
//! and counted in [`Writer::dropped`].

use crate::entry::{Entry, Event};
use crate::error::NbLogResult;
use crate::timeline::SharedBuffer;
use crate::timestamp::Timestamp;
use nblog_common::consts::{MAX_PAYLOAD_LEN, TIMESTAMP_PAYLOAD_LEN};
use parking_lot::Mutex;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Single unsynchronized writer attached to one shared buffer
///
/// At most one `Writer` may be attached to a buffer at a time; share a
/// [`LockedWriter`] between threads instead.
#[derive(Debug)]
pub struct Writer {
    shared: Option<Arc<SharedBuffer>>,
    /// Shadow of the shared rear cursor
    rear: usize,
    enabled: bool,
    dropped: u64,
}

impl Writer {
    /// Attach to `shared`, continuing after whatever it already holds.
    ///
    /// Fails if another writer is attached or the buffer is read-only.
    pub fn new(shared: Arc<SharedBuffer>) -> NbLogResult<Self> {
        shared.claim_writer()?;
        let rear = shared.rear();
        Ok(Self {
            shared: Some(shared),
            rear,
            enabled: true,
            dropped: 0,
        })
    }

    /// Writer with no buffer; every call is a no-op and it cannot be enabled
    pub fn detached() -> Self {
        Self {
            shared: None,
            rear: 0,
            enabled: false,
            dropped: 0,
        }
    }

    /// Log `text` as a STRING record. Text over 255 bytes is dropped.
    #[inline]
    pub fn log(&mut self, text: &str) {
        self.log_event(Event::String, text.as_bytes());
    }

    /// Log formatted text as a STRING record.
    ///
    /// Formats into a 255-byte stack buffer; output that does not fit is
    /// dropped. Usually reached through the [`nblog!`](crate::nblog) macro.
    pub fn log_fmt(&mut self, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        let mut buf = heapless::String::<MAX_PAYLOAD_LEN>::new();
        if buf.write_fmt(args).is_err() {
            self.dropped += 1;
            return;
        }
        self.log_event(Event::String, buf.as_bytes());
    }

    /// Log the current monotonic time as a TIMESTAMP record
    pub fn log_timestamp(&mut self) {
        if !self.enabled {
            return;
        }
        match Timestamp::now() {
            Ok(ts) => self.log_timestamp_at(ts),
            Err(_) => self.dropped += 1,
        }
    }

    /// Log a caller-supplied time as a TIMESTAMP record
    #[inline]
    pub fn log_timestamp_at(&mut self, ts: Timestamp) {
        self.log_event(Event::Timestamp, &ts.to_bytes());
    }

    /// Append a raw record.
    ///
    /// No-op when disabled or for non-writable kinds. Dropped (and counted)
    /// when the payload exceeds 255 bytes, a TIMESTAMP payload has the wrong
    /// size, or the record cannot fit in the ring at all.
    pub fn log_event(&mut self, event: Event, data: &[u8]) {
        if !self.enabled || !event.is_user_writable() {
            return;
        }
        if event == Event::Timestamp && data.len() != TIMESTAMP_PAYLOAD_LEN {
            self.dropped += 1;
            return;
        }
        match Entry::new(event, data) {
            Some(entry) => self.append(&entry),
            None => self.dropped += 1,
        }
    }

    fn append(&mut self, entry: &Entry<'_>) {
        let Some(shared) = &self.shared else {
            return;
        };
        let need = entry.encoded_len();
        if need > shared.capacity() {
            self.dropped += 1;
            return;
        }

        shared.write_with(self.rear, need, |i| entry.read_at(i));
        self.rear = self.rear.wrapping_add(need);
        shared.publish_rear(self.rear);
    }

    /// Whether records are currently accepted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable logging, returning the previous state.
    ///
    /// A detached writer stays disabled.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let old = self.enabled;
        self.enabled = enabled && self.shared.is_some();
        old
    }

    /// Buffer this writer appends to
    pub fn shared(&self) -> Option<&Arc<SharedBuffer>> {
        self.shared.as_ref()
    }

    /// Records dropped because they could not be encoded
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::detached()
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            shared.release_writer();
        }
    }
}

/// Writer shared by several non-real-time threads
///
/// Same contract as [`Writer`], with every call serialized by a mutex. May
/// block, so never use it from a real-time thread.
#[derive(Debug)]
pub struct LockedWriter {
    inner: Mutex<Writer>,
}

impl LockedWriter {
    /// Attach a new writer to `shared`
    pub fn new(shared: Arc<SharedBuffer>) -> NbLogResult<Self> {
        Ok(Self::from_writer(Writer::new(shared)?))
    }

    /// Wrap an existing writer
    pub fn from_writer(writer: Writer) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// See [`Writer::log`]
    pub fn log(&self, text: &str) {
        self.inner.lock().log(text);
    }

    /// See [`Writer::log_fmt`]
    pub fn log_fmt(&self, args: fmt::Arguments<'_>) {
        self.inner.lock().log_fmt(args);
    }

    /// See [`Writer::log_timestamp`]
    pub fn log_timestamp(&self) {
        self.inner.lock().log_timestamp();
    }

    /// See [`Writer::log_timestamp_at`]
    pub fn log_timestamp_at(&self, ts: Timestamp) {
        self.inner.lock().log_timestamp_at(ts);
    }

    /// See [`Writer::log_event`]
    pub fn log_event(&self, event: Event, data: &[u8]) {
        self.inner.lock().log_event(event, data);
    }

    /// See [`Writer::is_enabled`]
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().is_enabled()
    }

    /// See [`Writer::set_enabled`]
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.inner.lock().set_enabled(enabled)
    }

    /// See [`Writer::shared`]
    pub fn shared(&self) -> Option<Arc<SharedBuffer>> {
        self.inner.lock().shared().cloned()
    }

    /// See [`Writer::dropped`]
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped()
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> Writer {
        self.inner.into_inner()
    }
}

/// Log formatted text through a [`Writer`] or [`LockedWriter`]
///
/// ```rust
/// use nblog::{SharedBuffer, Writer, nblog};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut writer = Writer::new(SharedBuffer::new(4096)?)?;
/// nblog!(writer, "underrun {} frames", 128);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! nblog {
    ($writer:expr, $($arg:tt)*) => {
        $writer.log_fmt(::core::format_args!($($arg)*))
    };
}
