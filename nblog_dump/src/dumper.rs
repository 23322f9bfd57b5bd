//! Readers over named segments, each printed under its name

use nblog::{DumpSink, DumpSummary, LogSegment, NbLogResult, Reader, SegmentConfig};
use tracing::{debug, warn};

struct SegmentReader {
    name: String,
    reader: Reader,
}

/// One private reader per attached segment
pub struct SegmentDumper {
    segments: Vec<SegmentReader>,
    indent: usize,
}

impl SegmentDumper {
    /// Attach read-only to `names`, or to every segment in the directory when
    /// `names` is empty.
    ///
    /// A named segment that cannot be attached is an error; a discovered one
    /// that vanished in the meantime is skipped.
    pub fn open(config: &SegmentConfig, names: &[String], indent: usize) -> NbLogResult<Self> {
        let mut segments = Vec::new();

        if names.is_empty() {
            for name in LogSegment::list(config)? {
                match LogSegment::attach(&name, config) {
                    Ok(shared) => segments.push(SegmentReader {
                        name,
                        reader: Reader::new(shared),
                    }),
                    Err(e) => warn!("Skipping segment '{}': {}", name, e),
                }
            }
        } else {
            for name in names {
                let shared = LogSegment::attach(name, config)?;
                segments.push(SegmentReader {
                    name: name.clone(),
                    reader: Reader::new(shared),
                });
            }
        }

        debug!("Attached {} segment(s)", segments.len());
        Ok(Self { segments, indent })
    }

    /// Number of attached segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether nothing was attached
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Dump every segment under a `<name>:` header.
    ///
    /// With `only_new` the header is skipped for segments with nothing to show.
    pub fn dump(&mut self, sink: &mut dyn DumpSink, only_new: bool) -> DumpSummary {
        let mut total = DumpSummary::default();
        for segment in &mut self.segments {
            if only_new && segment.reader.available() == 0 {
                continue;
            }
            sink.write_line(&format!("{}:", segment.name));
            let summary = segment.reader.dump(sink, self.indent);
            total.lost_bytes += summary.lost_bytes;
            total.entries += summary.entries;
            total.lines += summary.lines + 1;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nblog::{NbLogError, Timestamp, Writer};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> SegmentConfig {
        SegmentConfig {
            dir: dir.path().to_path_buf(),
            populate: false,
        }
    }

    #[test]
    fn test_dumps_discovered_segments_in_name_order() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut mixer = Writer::new(LogSegment::create("mixer", 256, &config).unwrap()).unwrap();
        let mut capture =
            Writer::new(LogSegment::create("capture", 256, &config).unwrap()).unwrap();

        mixer.log_timestamp_at(Timestamp::new(5, 20_000_000));
        mixer.log("write blocked");
        capture.log("overrun");

        let mut dumper = SegmentDumper::open(&config, &[], 2).unwrap();
        assert_eq!(dumper.len(), 2);

        let mut lines: Vec<String> = Vec::new();
        let summary = dumper.dump(&mut lines, false);
        assert_eq!(
            lines,
            vec![
                "capture:",
                "  overrun",
                "mixer:",
                "  [5.020] write blocked",
            ]
        );
        assert_eq!(summary.entries, 3);
    }

    #[test]
    fn test_watch_prints_only_new_records() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut mixer = Writer::new(LogSegment::create("mixer", 256, &config).unwrap()).unwrap();
        let _idle = Writer::new(LogSegment::create("idle", 256, &config).unwrap()).unwrap();

        let names = vec!["mixer".to_string(), "idle".to_string()];
        let mut dumper = SegmentDumper::open(&config, &names, 0).unwrap();

        mixer.log("first");
        let mut lines: Vec<String> = Vec::new();
        dumper.dump(&mut lines, true);
        assert_eq!(lines, vec!["mixer:", "first"]);

        lines.clear();
        assert_eq!(dumper.dump(&mut lines, true), DumpSummary::default());
        assert!(lines.is_empty());

        mixer.log("second");
        dumper.dump(&mut lines, true);
        assert_eq!(lines, vec!["mixer:", "second"]);
    }

    #[test]
    fn test_missing_named_segment_is_an_error() {
        let dir = TempDir::new().unwrap();
        let names = vec!["absent".to_string()];
        assert!(matches!(
            SegmentDumper::open(&config(&dir), &names, 0),
            Err(NbLogError::NotFound { .. })
        ));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let dumper = SegmentDumper::open(&config(&dir), &[], 0).unwrap();
        assert!(dumper.is_empty());
    }
}
