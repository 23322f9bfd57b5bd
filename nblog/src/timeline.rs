//! Shared ring buffer layout and access
//!
//! The shared region is one platform-word rear cursor followed by a
//! power-of-two byte array:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────┐
//! │ rear: usize  │ data: [u8; capacity]                     │
//! └──────────────┴──────────────────────────────────────────┘
//! ```
//!
//! The rear cursor counts every byte ever written and wraps only at
//! `usize::MAX`. The writer publishes it with release ordering; readers load
//! it with acquire ordering. Bytes are accessed as relaxed `AtomicU8`, so a
//! reader racing an overwrite sees stale or new bytes but never undefined
//! behaviour.

use crate::error::{NbLogError, NbLogResult};
use crate::platform;
use memmap2::{Mmap, MmapMut};
use nblog_common::consts::{CURSOR_SIZE, MAX_CAPACITY, MIN_CAPACITY};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use tracing::debug;

/// Sizing helper for shared log regions
pub struct Timeline;

impl Timeline {
    /// Ring capacity actually used for a requested size
    #[inline]
    pub const fn capacity_for(requested: usize) -> usize {
        let n = if requested < MIN_CAPACITY {
            MIN_CAPACITY
        } else {
            requested
        };
        n.next_power_of_two()
    }

    /// Bytes to allocate for a shared region of the requested size:
    /// one cursor word plus the rounded-up ring.
    #[inline]
    pub const fn shared_size(requested: usize) -> usize {
        CURSOR_SIZE + Self::capacity_for(requested)
    }

    /// Ring capacity of a region of `len` bytes, if `len` is a valid shared size
    pub fn capacity_of(len: usize) -> Option<usize> {
        let capacity = len.checked_sub(CURSOR_SIZE)?;
        (capacity.is_power_of_two() && (MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity))
            .then_some(capacity)
    }
}

fn validate_capacity(requested: usize) -> NbLogResult<()> {
    if requested == 0 || requested > MAX_CAPACITY {
        return Err(NbLogError::InvalidCapacity { requested });
    }
    Ok(())
}

enum Backing {
    /// Process-local allocation in cursor-sized words
    Heap(Box<[AtomicUsize]>),
    /// Writable file mapping; `owned` files are unlinked on drop
    Mapped {
        map: MmapMut,
        owned: Option<PathBuf>,
    },
    /// Read-only file mapping of another process's log
    ReadOnly(Mmap),
}

/// Shared ring buffer: capacity, rear cursor and byte array
///
/// Created once per logging session and handed to one [`Writer`] and any
/// number of [`Reader`]s through an `Arc`.
///
/// [`Writer`]: crate::Writer
/// [`Reader`]: crate::Reader
pub struct SharedBuffer {
    backing: Backing,
    capacity: usize,
    writer_attached: AtomicBool,
}

impl SharedBuffer {
    /// Allocate a process-local buffer of at least `requested` bytes
    pub fn new(requested: usize) -> NbLogResult<Arc<Self>> {
        validate_capacity(requested)?;
        let capacity = Timeline::capacity_for(requested);
        let words = Timeline::shared_size(requested) / CURSOR_SIZE;
        let heap: Box<[AtomicUsize]> = (0..words).map(|_| AtomicUsize::new(0)).collect();

        Ok(Arc::new(Self {
            backing: Backing::Heap(heap),
            capacity,
            writer_attached: AtomicBool::new(false),
        }))
    }

    /// Wrap a writable mapping of exactly `Timeline::shared_size(capacity)` bytes
    pub(crate) fn from_mapping(map: MmapMut, owned: Option<PathBuf>) -> NbLogResult<Self> {
        let capacity =
            Timeline::capacity_of(map.len()).ok_or_else(|| NbLogError::InvalidSegment {
                name: owned
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                len: map.len(),
            })?;
        platform::validate_alignment(map.as_ptr())?;

        Ok(Self {
            backing: Backing::Mapped { map, owned },
            capacity,
            writer_attached: AtomicBool::new(false),
        })
    }

    /// Wrap a read-only mapping; writers cannot attach
    pub(crate) fn from_read_only(name: &str, map: Mmap) -> NbLogResult<Self> {
        let capacity =
            Timeline::capacity_of(map.len()).ok_or_else(|| NbLogError::InvalidSegment {
                name: name.to_string(),
                len: map.len(),
            })?;
        platform::validate_alignment(map.as_ptr())?;

        Ok(Self {
            backing: Backing::ReadOnly(map),
            capacity,
            writer_attached: AtomicBool::new(false),
        })
    }

    /// Ring capacity in bytes (a power of two)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a writer may attach
    pub fn is_writable(&self) -> bool {
        !matches!(self.backing, Backing::ReadOnly(_))
    }

    /// Total shared size including the cursor word
    pub fn shared_size(&self) -> usize {
        CURSOR_SIZE + self.capacity
    }

    #[inline]
    fn base_ptr(&self) -> *const u8 {
        match &self.backing {
            Backing::Heap(words) => words.as_ptr() as *const u8,
            Backing::Mapped { map, .. } => map.as_ptr(),
            Backing::ReadOnly(map) => map.as_ptr(),
        }
    }

    #[inline]
    fn cursor(&self) -> &AtomicUsize {
        // Base is word-aligned: heap words, or a page-aligned mapping
        unsafe { &*(self.base_ptr() as *const AtomicUsize) }
    }

    #[inline]
    fn data(&self) -> &[AtomicU8] {
        // AtomicU8 has the layout of u8; the region holds CURSOR_SIZE + capacity bytes
        unsafe {
            std::slice::from_raw_parts(
                self.base_ptr().add(CURSOR_SIZE) as *const AtomicU8,
                self.capacity,
            )
        }
    }

    /// Load the rear cursor with acquire ordering
    #[inline]
    pub fn rear(&self) -> usize {
        self.cursor().load(Ordering::Acquire)
    }

    /// Publish a new rear cursor with release ordering
    #[inline]
    pub(crate) fn publish_rear(&self, rear: usize) {
        debug_assert!(self.is_writable());
        self.cursor().store(rear, Ordering::Release);
    }

    /// Copy `out.len()` bytes starting at logical `offset`, wrapping at the end
    pub fn read_range(&self, offset: usize, out: &mut [u8]) {
        let data = self.data();
        let start = offset & (self.capacity - 1);
        let first = out.len().min(self.capacity - start);
        let (head, tail) = out.split_at_mut(first);

        for (dst, src) in head.iter_mut().zip(&data[start..start + first]) {
            *dst = src.load(Ordering::Relaxed);
        }
        for (dst, src) in tail.iter_mut().zip(data.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
    }

    /// Store `bytes` starting at logical `offset`, wrapping at the end
    pub(crate) fn write_range(&self, offset: usize, bytes: &[u8]) {
        self.write_with(offset, bytes.len(), |i| bytes[i]);
    }

    /// Store `len` bytes produced by `byte_at(0..len)` starting at logical `offset`
    ///
    /// First chunk runs to the physical end of the array; the remainder wraps
    /// to offset 0.
    #[inline]
    pub(crate) fn write_with(&self, offset: usize, len: usize, byte_at: impl Fn(usize) -> u8) {
        debug_assert!(self.is_writable());
        debug_assert!(len <= self.capacity);
        let data = self.data();
        let start = offset & (self.capacity - 1);
        let first = len.min(self.capacity - start);

        for (i, cell) in data[start..start + first].iter().enumerate() {
            cell.store(byte_at(i), Ordering::Relaxed);
        }
        for (i, cell) in data[..len - first].iter().enumerate() {
            cell.store(byte_at(first + i), Ordering::Relaxed);
        }
    }

    /// Claim the single unsynchronized writer slot
    pub(crate) fn claim_writer(&self) -> NbLogResult<()> {
        if !self.is_writable() {
            return Err(NbLogError::ReadOnly);
        }
        self.writer_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| NbLogError::WriterAttached)
    }

    /// Release the writer slot
    pub(crate) fn release_writer(&self) {
        self.writer_attached.store(false, Ordering::Release);
    }

    /// Lock the region into RAM so the writer never takes a page fault
    pub fn lock_memory(&self) -> NbLogResult<()> {
        platform::lock_region(self.base_ptr(), self.shared_size())
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backing = match &self.backing {
            Backing::Heap(_) => "heap",
            Backing::Mapped { .. } => "mapped",
            Backing::ReadOnly(_) => "read-only",
        };
        f.debug_struct("SharedBuffer")
            .field("backing", &backing)
            .field("capacity", &self.capacity)
            .field("rear", &self.rear())
            .finish()
    }
}

impl Drop for SharedBuffer {
    fn drop(&mut self) {
        if let Backing::Mapped {
            owned: Some(path), ..
        } = &self.backing
        {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed log segment {}", path.display()),
                Err(e) => debug!("Log segment {} already gone: {}", path.display(), e),
            }
        }
    }
}
