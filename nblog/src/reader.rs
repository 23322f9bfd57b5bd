//! Reader: drains new records and renders them on demand
//!
//! A reader never writes to the shared region. It keeps a private front
//! cursor, takes one acquire load of the rear cursor per dump, copies the
//! new bytes into a private snapshot and decodes only the snapshot, so a
//! writer running concurrently cannot tear a record under it. Anything it
//! cannot trust is reported as lost bytes.

use crate::entry::Event;
use crate::render;
use crate::timeline::SharedBuffer;
use nblog_common::consts::{ENTRY_OVERHEAD, TIMESTAMP_PAYLOAD_LEN};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info};

/// Destination for rendered dump lines
pub trait DumpSink {
    /// Accept one line, without trailing newline
    fn write_line(&mut self, line: &str);
}

impl DumpSink for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Writes each line plus `\n` to an `io::Write`; write errors are ignored
pub struct WriteSink<W: io::Write>(pub W);

impl<W: io::Write> DumpSink for WriteSink<W> {
    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.0, "{line}");
    }
}

/// Sends each line to the `tracing` subscriber at INFO
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DumpSink for TracingSink {
    fn write_line(&mut self, line: &str) {
        info!(target: "nblog", "{}", line);
    }
}

/// What one dump consumed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpSummary {
    /// Bytes overwritten before being read, plus unparseable bytes
    pub lost_bytes: usize,
    /// Records decoded
    pub entries: usize,
    /// Lines written to the sink
    pub lines: usize,
}

/// Walk a snapshot backward from its end to the oldest intact record.
///
/// Returns `(start, lost)`: records in `snapshot[start..]` are well framed and
/// the `lost` bytes before them are not. Both length bytes of every record
/// must agree, the record must fit in what remains, and a TIMESTAMP must
/// carry a full timestamp payload.
pub fn scan_valid_start(snapshot: &[u8]) -> (usize, usize) {
    let mut i = snapshot.len();
    while i >= ENTRY_OVERHEAD {
        let length = snapshot[i - 1] as usize;
        if length + ENTRY_OVERHEAD > i {
            break;
        }
        let start = i - length - ENTRY_OVERHEAD;
        if snapshot[start + 1] as usize != length {
            break;
        }
        if snapshot[start] == Event::Timestamp as u8 && length != TIMESTAMP_PAYLOAD_LEN {
            break;
        }
        i = start;
    }
    (i, i)
}

/// Independent consumer of one shared buffer
pub struct Reader {
    shared: Arc<SharedBuffer>,
    /// Total bytes consumed; only ever advances
    front: usize,
    snapshot: Vec<u8>,
}

impl Reader {
    /// Attach to `shared`, starting from the oldest byte ever written
    pub fn new(shared: Arc<SharedBuffer>) -> Self {
        let snapshot = vec![0u8; shared.capacity()];
        Self {
            shared,
            front: 0,
            snapshot,
        }
    }

    /// Bytes consumed so far
    pub fn front(&self) -> usize {
        self.front
    }

    /// Buffer this reader drains
    pub fn shared(&self) -> &Arc<SharedBuffer> {
        &self.shared
    }

    /// Bytes written since the last dump, capped at the capacity
    pub fn available(&self) -> usize {
        self.shared
            .rear()
            .wrapping_sub(self.front)
            .min(self.shared.capacity())
    }

    /// Render everything written since the previous dump into `sink`
    pub fn dump(&mut self, sink: &mut dyn DumpSink, indent: usize) -> DumpSummary {
        let rear = self.shared.rear();
        let mut avail = rear.wrapping_sub(self.front);
        if avail == 0 {
            return DumpSummary::default();
        }

        let capacity = self.shared.capacity();
        let mut lost = 0;
        if avail > capacity {
            lost = avail - capacity;
            self.front = self.front.wrapping_add(lost);
            avail = capacity;
        }

        let snapshot = &mut self.snapshot[..avail];
        self.shared.read_range(self.front, snapshot);
        self.front = self.front.wrapping_add(avail);

        let (start, unparsed) = scan_valid_start(snapshot);
        lost += unparsed;
        if lost > 0 {
            debug!(lost, avail, "Log reader lost bytes");
        }

        render::render(&snapshot[start..], lost, indent, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;
    use crate::writer::Writer;

    fn pair(capacity: usize) -> (Writer, Reader) {
        let shared = SharedBuffer::new(capacity).unwrap();
        (Writer::new(shared.clone()).unwrap(), Reader::new(shared))
    }

    #[test]
    fn test_scan_all_valid() {
        let bytes = [1, 2, b'h', b'i', 2, 1, 0, 0];
        assert_eq!(scan_valid_start(&bytes), (0, 0));
        assert_eq!(scan_valid_start(&[]), (0, 0));
    }

    #[test]
    fn test_scan_stops_at_partial_record() {
        // Tail of an overwritten record, then "hi"
        let bytes = [b'x', b'y', 7, 1, 2, b'h', b'i', 2];
        assert_eq!(scan_valid_start(&bytes), (3, 3));
    }

    #[test]
    fn test_scan_stops_at_length_mismatch() {
        let bytes = [1, 3, b'a', b'b', 2, 1, 1, b'c', 1];
        assert_eq!(scan_valid_start(&bytes), (5, 5));
    }

    #[test]
    fn test_scan_rejects_short_timestamp() {
        let bytes = [2, 1, 0, 1];
        assert_eq!(scan_valid_start(&bytes), (4, 4));
    }

    #[test]
    fn test_dump_small_log() {
        let (mut writer, mut reader) = pair(64);
        writer.log("hi");

        let mut lines: Vec<String> = Vec::new();
        let summary = reader.dump(&mut lines, 0);
        assert_eq!(lines, vec!["hi"]);
        assert_eq!(summary.lost_bytes, 0);
        assert_eq!(summary.entries, 1);
        assert_eq!(reader.front(), 5);
    }

    #[test]
    fn test_dump_is_incremental() {
        let (mut writer, mut reader) = pair(64);
        writer.log("one");

        let mut lines: Vec<String> = Vec::new();
        reader.dump(&mut lines, 0);
        assert_eq!(reader.dump(&mut lines, 0), DumpSummary::default());

        writer.log("two");
        reader.dump(&mut lines, 0);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_nine_records_fit() {
        let (mut writer, mut reader) = pair(64);
        for i in 0..9 {
            writer.log(&format!("s{i}"));
        }

        let mut lines: Vec<String> = Vec::new();
        let summary = reader.dump(&mut lines, 0);
        assert_eq!(summary.lost_bytes, 0);
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "s0");
        assert_eq!(lines[8], "s8");
    }

    #[test]
    fn test_overflow_reports_loss() {
        let (mut writer, mut reader) = pair(64);
        // 13 records of 5 bytes = 65 bytes, one past the capacity
        for i in 0..13 {
            writer.log(&format!("{:02}", i));
        }

        let mut lines: Vec<String> = Vec::new();
        let summary = reader.dump(&mut lines, 0);
        // 1 byte overwritten, then 4 bytes of the broken oldest record
        assert_eq!(summary.lost_bytes, 5);
        assert_eq!(lines[0], "warning: lost 5 bytes worth of events");
        assert_eq!(lines[1], "01");
        assert_eq!(lines.len(), 13);
        assert_eq!(summary.entries, 12);
    }

    #[test]
    fn test_independent_readers() {
        let shared = SharedBuffer::new(64).unwrap();
        let mut writer = Writer::new(shared.clone()).unwrap();
        let mut first = Reader::new(shared.clone());
        let mut second = Reader::new(shared);

        writer.log("a");
        let mut lines: Vec<String> = Vec::new();
        first.dump(&mut lines, 0);
        writer.log("b");
        first.dump(&mut lines, 0);
        second.dump(&mut lines, 0);
        assert_eq!(lines, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_available() {
        let (mut writer, reader) = pair(16);
        assert_eq!(reader.available(), 0);
        writer.log("abc");
        assert_eq!(reader.available(), 6);
        writer.log("defghi");
        assert_eq!(reader.available(), 15);
        writer.log("j");
        assert_eq!(reader.available(), 16);
    }

    #[test]
    fn test_timestamps_and_text() {
        let (mut writer, mut reader) = pair(256);
        writer.log_timestamp_at(Timestamp::new(100, 5_000_000));
        writer.log("underrun");

        let mut lines: Vec<String> = Vec::new();
        reader.dump(&mut lines, 4);
        assert_eq!(lines, vec!["    [100.005] underrun"]);
    }

    #[test]
    fn test_write_sink() {
        let (mut writer, mut reader) = pair(64);
        writer.log("to io");

        let mut sink = WriteSink(Vec::new());
        reader.dump(&mut sink, 2);
        assert_eq!(String::from_utf8(sink.0).unwrap(), "  to io\n");
    }

    #[test]
    fn test_garbage_rear_cannot_crash() {
        let shared = SharedBuffer::new(64).unwrap();
        shared.write_range(0, &[0xFF; 64]);
        shared.publish_rear(usize::MAX - 3);

        let mut reader = Reader::new(shared);
        let mut lines: Vec<String> = Vec::new();
        let summary = reader.dump(&mut lines, 0);
        assert_eq!(summary.entries, 0);
        assert!(summary.lost_bytes > 0);
    }
}
