//! Record encoding and decoding
//!
//! One record on the wire is `[event][length][data; length][length]`. The
//! trailing copy of the length lets a reader walk records backward from the
//! newest byte.

use nblog_common::consts::{ENTRY_OVERHEAD, MAX_PAYLOAD_LEN};

/// Kind of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Never written by a writer; decoded as unknown
    Reserved = 0,
    /// Raw text, not NUL-terminated
    String = 1,
    /// Monotonic clock value
    Timestamp = 2,
}

impl Event {
    /// Convert from the raw event byte. Returns `None` for unassigned values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Reserved),
            1 => Some(Self::String),
            2 => Some(Self::Timestamp),
            _ => None,
        }
    }

    /// Whether writers may emit this kind.
    #[inline]
    pub const fn is_user_writable(self) -> bool {
        matches!(self, Self::String | Self::Timestamp)
    }
}

/// One record ready to be streamed into a ring buffer
///
/// Borrows its payload so building an entry never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    event: Event,
    data: &'a [u8],
}

impl<'a> Entry<'a> {
    /// Build an entry. Returns `None` if `data` exceeds [`MAX_PAYLOAD_LEN`].
    #[inline]
    pub fn new(event: Event, data: &'a [u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD_LEN {
            return None;
        }
        Some(Self { event, data })
    }

    /// Event kind
    pub fn event(&self) -> Event {
        self.event
    }

    /// Payload bytes
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Payload length as stored in both length bytes
    #[inline]
    pub fn length(&self) -> u8 {
        // new() bounds data to MAX_PAYLOAD_LEN == u8::MAX
        self.data.len() as u8
    }

    /// Encoded size in bytes, `length + 3`
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.data.len() + ENTRY_OVERHEAD
    }

    /// Byte at `offset` of the encoded record.
    ///
    /// Offsets outside the record read as 0 so copy loops need no branches.
    #[inline]
    pub fn read_at(&self, offset: usize) -> u8 {
        let len = self.data.len();
        match offset {
            0 => self.event as u8,
            1 => self.length(),
            o if o >= 2 && o < len + 2 => self.data[o - 2],
            o if o == len + 2 => self.length(),
            _ => 0,
        }
    }

    /// Encode into `out`, returning the number of bytes written.
    ///
    /// Returns `None` if `out` is shorter than [`Entry::encoded_len`].
    pub fn encode_into(&self, out: &mut [u8]) -> Option<usize> {
        let need = self.encoded_len();
        let out = out.get_mut(..need)?;
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.read_at(i);
        }
        Some(need)
    }
}

/// A well-framed record found in a byte slice
///
/// Keeps the raw event byte so unknown kinds can still be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView<'a> {
    /// Raw event byte
    pub kind: u8,
    /// Payload bytes
    pub payload: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// Decode the record starting at `bytes[0]`.
    ///
    /// Returns `None` if the record does not fit in `bytes` or its two length
    /// bytes disagree.
    pub fn decode(bytes: &'a [u8]) -> Option<Self> {
        let kind = *bytes.first()?;
        let len = *bytes.get(1)? as usize;
        let trailing = *bytes.get(len + 2)?;
        if trailing as usize != len {
            return None;
        }
        Some(Self {
            kind,
            payload: &bytes[2..len + 2],
        })
    }

    /// Known event kind, if any
    pub fn event(&self) -> Option<Event> {
        Event::from_u8(self.kind)
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        self.payload.len() + ENTRY_OVERHEAD
    }
}
