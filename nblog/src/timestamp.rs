//! Monotonic timestamps carried by TIMESTAMP records

use nblog_common::consts::TIMESTAMP_PAYLOAD_LEN;
use nix::time::{ClockId, clock_gettime};

/// Monotonic clock value, seconds plus nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    /// Whole seconds
    pub sec: i64,
    /// Nanoseconds within the second
    pub nsec: i64,
}

impl Timestamp {
    /// Create a timestamp from its parts
    pub const fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// Read `CLOCK_MONOTONIC`.
    ///
    /// Goes through the vDSO on Linux: no allocation, no lock.
    pub fn now() -> nix::Result<Self> {
        let ts = clock_gettime(ClockId::CLOCK_MONOTONIC)?;
        Ok(Self {
            sec: ts.tv_sec() as i64,
            nsec: ts.tv_nsec() as i64,
        })
    }

    /// Milliseconds within the second
    #[inline]
    pub fn millis(&self) -> i64 {
        self.nsec / 1_000_000
    }

    /// Wire payload: `sec` then `nsec`, little-endian
    pub fn to_bytes(&self) -> [u8; TIMESTAMP_PAYLOAD_LEN] {
        let mut out = [0u8; TIMESTAMP_PAYLOAD_LEN];
        out[..8].copy_from_slice(&self.sec.to_le_bytes());
        out[8..].copy_from_slice(&self.nsec.to_le_bytes());
        out
    }

    /// Parse a wire payload. Returns `None` unless it is exactly
    /// [`TIMESTAMP_PAYLOAD_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; TIMESTAMP_PAYLOAD_LEN] = bytes.try_into().ok()?;
        let mut sec = [0u8; 8];
        let mut nsec = [0u8; 8];
        sec.copy_from_slice(&bytes[..8]);
        nsec.copy_from_slice(&bytes[8..]);
        Some(Self {
            sec: i64::from_le_bytes(sec),
            nsec: i64::from_le_bytes(nsec),
        })
    }
}
