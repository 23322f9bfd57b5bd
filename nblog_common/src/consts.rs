//! Wire-format and sizing constants for the event log.
//!
//! Single source of truth for record layout, buffer limits and default paths.
//! Imported by all crates; never duplicate these values.

use static_assertions::const_assert;
use static_assertions::const_assert_eq;

/// Maximum payload length of one record in bytes.
///
/// The length travels in a single byte, so payloads above this are
/// rejected at the writer API boundary.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Per-record framing overhead: event byte, leading length, trailing length.
pub const ENTRY_OVERHEAD: usize = 3;

/// Largest encoded record in bytes.
pub const MAX_ENTRY_LEN: usize = MAX_PAYLOAD_LEN + ENTRY_OVERHEAD;

/// Minimum run of consecutive timestamps collapsed into one summary line.
pub const SQUASH_TIMESTAMP: usize = 4;

/// TIMESTAMP payload: `sec: i64` then `nsec: i64`, both little-endian.
pub const TIMESTAMP_PAYLOAD_LEN: usize = 16;

/// Size of the rear cursor word stored in front of the byte array.
pub const CURSOR_SIZE: usize = core::mem::size_of::<usize>();

/// Smallest ring capacity handed out; smaller requests are rounded up.
pub const MIN_CAPACITY: usize = 8;

/// Largest ring capacity accepted (1 GiB).
pub const MAX_CAPACITY: usize = 1 << 30;

/// Default log size for a mixer thread.
pub const DEFAULT_LOG_SIZE: usize = 4 * 1024;

/// Default log size for the fast mixer.
pub const FAST_LOG_SIZE: usize = 4 * 1024;

/// Maximum number of named readers held by one log service.
pub const MAX_NAMED_READERS: usize = 32;

/// Default directory holding named log segments.
pub const SHM_DIR: &str = "/dev/shm";

/// File name prefix of named log segments.
pub const SEGMENT_PREFIX: &str = "nblog_";

const_assert_eq!(MAX_ENTRY_LEN, 258);
const_assert!(TIMESTAMP_PAYLOAD_LEN <= MAX_PAYLOAD_LEN);
const_assert!(MIN_CAPACITY.is_power_of_two());
const_assert!(MAX_CAPACITY.is_power_of_two());
const_assert!(MIN_CAPACITY >= CURSOR_SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert_eq!(MAX_ENTRY_LEN, MAX_PAYLOAD_LEN + ENTRY_OVERHEAD);
        assert!(SQUASH_TIMESTAMP >= 2);
        assert!(DEFAULT_LOG_SIZE.is_power_of_two());
        assert!(FAST_LOG_SIZE.is_power_of_two());
        assert!(MIN_CAPACITY < MAX_CAPACITY);
    }

    #[test]
    fn payload_length_fits_in_one_byte() {
        assert_eq!(MAX_PAYLOAD_LEN, u8::MAX as usize);
    }
}
