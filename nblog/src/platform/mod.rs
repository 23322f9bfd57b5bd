//! Platform-specific memory mapping helpers

pub mod linux;

pub use linux::{attach_segment_mmap, create_segment_mmap, lock_region, validate_alignment};
