//! Named log segments shared between processes
//!
//! A segment is a file `<dir>/nblog_<name>` sized to
//! [`Timeline::shared_size`]. The producing process creates and owns it; any
//! other process maps it read-only and derives the capacity from the file
//! length.

use crate::error::{NbLogError, NbLogResult};
use crate::platform::{attach_segment_mmap, create_segment_mmap};
use crate::timeline::{SharedBuffer, Timeline};
use nblog_common::consts::{MAX_CAPACITY, SEGMENT_PREFIX, SHM_DIR};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Where and how named segments are mapped
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Directory holding segment files, normally a tmpfs
    pub dir: PathBuf,
    /// Pre-fault pages when creating a segment
    pub populate: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(SHM_DIR),
            populate: true,
        }
    }
}

impl SegmentConfig {
    /// Segments under `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// File path of segment `name`
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{SEGMENT_PREFIX}{name}"))
    }
}

/// Create, attach and enumerate named segments
pub struct LogSegment;

impl LogSegment {
    /// Create segment `name` holding at least `requested` ring bytes.
    ///
    /// The returned buffer unlinks the file when its last handle drops.
    pub fn create(
        name: &str,
        requested: usize,
        config: &SegmentConfig,
    ) -> NbLogResult<Arc<SharedBuffer>> {
        validate_name(name)?;
        if requested == 0 || requested > MAX_CAPACITY {
            return Err(NbLogError::InvalidCapacity { requested });
        }

        let path = config.path_of(name);
        if path.exists() {
            return Err(NbLogError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let size = Timeline::shared_size(requested);
        let map = create_segment_mmap(&path, size, config.populate)?;
        let shared = SharedBuffer::from_mapping(map, Some(path.clone()))?;

        info!(
            "Created log segment '{}' ({} bytes ring) at {}",
            name,
            shared.capacity(),
            path.display()
        );
        Ok(Arc::new(shared))
    }

    /// Map existing segment `name` read-only
    pub fn attach(name: &str, config: &SegmentConfig) -> NbLogResult<Arc<SharedBuffer>> {
        validate_name(name)?;
        let path = config.path_of(name);
        if !path.exists() {
            return Err(NbLogError::NotFound {
                name: name.to_string(),
            });
        }

        let map = attach_segment_mmap(&path)?;
        let shared = SharedBuffer::from_read_only(name, map)?;

        debug!(
            "Attached log segment '{}' ({} bytes ring)",
            name,
            shared.capacity()
        );
        Ok(Arc::new(shared))
    }

    /// Names of all segments in the configured directory, sorted
    pub fn list(config: &SegmentConfig) -> NbLogResult<Vec<String>> {
        let mut names = Vec::new();
        if !config.dir.exists() {
            return Ok(names);
        }

        for entry in std::fs::read_dir(&config.dir)? {
            let entry = entry?;
            if let Ok(file_name) = entry.file_name().into_string() {
                if let Some(name) = file_name.strip_prefix(SEGMENT_PREFIX) {
                    if !name.is_empty() {
                        names.push(name.to_string());
                    }
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Unlink a stale segment left behind by a dead producer
    pub fn remove(name: &str, config: &SegmentConfig) -> NbLogResult<()> {
        validate_name(name)?;
        let path = config.path_of(name);
        std::fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NbLogError::NotFound {
                    name: name.to_string(),
                }
            } else {
                NbLogError::Io { source: e }
            }
        })?;
        info!("Removed stale log segment '{}'", name);
        Ok(())
    }
}

fn validate_name(name: &str) -> NbLogResult<()> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(NbLogError::NotFound {
            name: name.to_string(),
        });
    }
    Ok(())
}
