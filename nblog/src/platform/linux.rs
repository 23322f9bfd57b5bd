//! Linux-specific shared memory operations

use crate::error::{NbLogError, NbLogResult};
use memmap2::{Mmap, MmapMut, MmapOptions};
use nblog_common::consts::CURSOR_SIZE;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Create a new segment file and map it read-write.
///
/// Fails if the file already exists. With `populate` every page is
/// pre-faulted so the first write from a real-time thread does not fault.
pub fn create_segment_mmap(path: &Path, size: usize, populate: bool) -> NbLogResult<MmapMut> {
    let file = OpenOptions::new()
        .create_new(true)
        .read(true)
        .write(true)
        .mode(0o600) // Owner read/write only
        .open(path)?;

    file.set_len(size as u64)?;

    let mut options = MmapOptions::new();
    if populate {
        options.populate();
    }

    let mmap = unsafe { options.map_mut(&file)? };
    Ok(mmap)
}

/// Map an existing segment read-only
pub fn attach_segment_mmap(path: &Path) -> NbLogResult<Mmap> {
    let file = OpenOptions::new().read(true).open(path)?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    Ok(mmap)
}

/// Lock a region into RAM with `mlock`
pub fn lock_region(addr: *const u8, len: usize) -> NbLogResult<()> {
    let result = unsafe { libc::mlock(addr as *const libc::c_void, len) };
    if result == 0 {
        Ok(())
    } else {
        Err(NbLogError::Io {
            source: std::io::Error::last_os_error(),
        })
    }
}

/// The cursor word must be naturally aligned for atomic access
pub fn validate_alignment(addr: *const u8) -> NbLogResult<()> {
    if (addr as usize) % CURSOR_SIZE != 0 {
        return Err(NbLogError::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("mapping at {:#x} not aligned to {}", addr as usize, CURSOR_SIZE),
            ),
        });
    }
    Ok(())
}
