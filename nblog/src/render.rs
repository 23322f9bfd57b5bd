//! Human-readable rendering of validated records
//!
//! Output lines have the form `<indent><prefix> <body>`. A TIMESTAMP record
//! does not print by itself: it becomes the prefix of the next STRING line
//! and is flushed on its own only when another TIMESTAMP, or the end of the
//! dump, comes first. Runs of closely spaced timestamps collapse into one
//! `[sec.mmm to .mmm by .mmm to .mmm]` prefix.

use crate::entry::{Event, RecordView};
use crate::reader::{DumpSink, DumpSummary};
use crate::timestamp::Timestamp;
use nblog_common::consts::{ENTRY_OVERHEAD, SQUASH_TIMESTAMP, TIMESTAMP_PAYLOAD_LEN};

const NS_PER_MS: i64 = 1_000_000;
const TIMESTAMP_RECORD_LEN: usize = TIMESTAMP_PAYLOAD_LEN + ENTRY_OVERHEAD;

/// Consecutive TIMESTAMP records in one second with non-negative spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimestampRun {
    /// Records in the run, including the first
    pub count: usize,
    /// Sum of the deltas, so `first + total` is the last time
    pub total_delta: i64,
    /// Smallest delta in nanoseconds
    pub min_delta: i64,
    /// Largest delta in nanoseconds
    pub max_delta: i64,
}

/// Measure the timestamp run starting with the record at `records[0]`
pub(crate) fn timestamp_run(records: &[u8], first: Timestamp) -> TimestampRun {
    let mut run = TimestampRun {
        count: 1,
        total_delta: 0,
        min_delta: i64::MAX,
        max_delta: -1,
    };
    let mut prev = first.nsec;
    let mut pos = TIMESTAMP_RECORD_LEN;

    while let Some(view) = records.get(pos..).and_then(RecordView::decode) {
        if view.event() != Some(Event::Timestamp) {
            break;
        }
        let Some(next) = Timestamp::from_bytes(view.payload) else {
            break;
        };
        if next.sec != first.sec {
            break;
        }
        // Overwritten data can hold any value
        let Some(delta) = next.nsec.checked_sub(prev).filter(|d| *d >= 0) else {
            break;
        };
        run.min_delta = run.min_delta.min(delta);
        run.max_delta = run.max_delta.max(delta);
        run.total_delta = run.total_delta.saturating_add(delta);
        run.count += 1;
        prev = next.nsec;
        pos += TIMESTAMP_RECORD_LEN;
    }
    run
}

fn max_timestamp_sec(records: &[u8]) -> Option<i64> {
    let mut pos = 0;
    let mut max_sec = None;
    while let Some(view) = records.get(pos..).and_then(RecordView::decode) {
        if view.event() == Some(Event::Timestamp) {
            if let Some(ts) = Timestamp::from_bytes(view.payload) {
                max_sec = max_sec.max(Some(ts.sec));
            }
        }
        pos += view.encoded_len();
    }
    max_sec
}

struct LineWriter<'a> {
    sink: &'a mut dyn DumpSink,
    indent: usize,
    lines: usize,
}

impl LineWriter<'_> {
    fn emit(&mut self, prefix: &str, body: &str) {
        let line = match (prefix.is_empty(), body.is_empty()) {
            (true, _) => format!("{:indent$}{}", "", body, indent = self.indent),
            (false, true) => format!("{:indent$}{}", "", prefix, indent = self.indent),
            (false, false) => format!("{:indent$}{} {}", "", prefix, body, indent = self.indent),
        };
        self.sink.write_line(&line);
        self.lines += 1;
    }
}

/// Render `records` (already validated back to front) into `sink`.
///
/// `lost` is reported once, before any record.
pub(crate) fn render(
    records: &[u8],
    lost: usize,
    indent: usize,
    sink: &mut dyn DumpSink,
) -> DumpSummary {
    let mut out = LineWriter {
        sink,
        indent,
        lines: 0,
    };
    let mut entries = 0;

    // Blank field as wide as the widest timestamp until the first one arrives
    let mut prefix = match max_timestamp_sec(records) {
        Some(max_sec) => {
            let width = max_sec.max(0).to_string().len();
            format!("[{:width$}]", "", width = width + 4)
        }
        None => String::new(),
    };

    if lost > 0 {
        out.emit(&prefix, &format!("warning: lost {lost} bytes worth of events"));
    }

    let mut deferred = false;
    let mut pos = 0;
    while let Some(view) = records.get(pos..).and_then(RecordView::decode) {
        let mut advance = view.encoded_len();
        entries += 1;

        let body = match (view.event(), Timestamp::from_bytes(view.payload)) {
            (Some(Event::String), _) => Some(String::from_utf8_lossy(view.payload).into_owned()),
            (Some(Event::Timestamp), Some(ts)) => {
                if deferred {
                    out.emit(&prefix, "");
                }
                let run = timestamp_run(&records[pos..], ts);
                prefix = if run.count >= SQUASH_TIMESTAMP {
                    advance = run.count * TIMESTAMP_RECORD_LEN;
                    entries += run.count - 1;
                    format!(
                        "[{}.{:03} to .{:03} by .{:03} to .{:03}]",
                        ts.sec,
                        ts.millis(),
                        ts.nsec.saturating_add(run.total_delta) / NS_PER_MS,
                        run.min_delta / NS_PER_MS,
                        run.max_delta / NS_PER_MS
                    )
                } else {
                    format!("[{}.{:03}]", ts.sec, ts.millis())
                };
                deferred = true;
                None
            }
            _ => Some(format!("warning: unknown event {}", view.kind)),
        };

        if let Some(body) = body {
            out.emit(&prefix, &body);
            deferred = false;
        }
        pos += advance;
    }

    if deferred {
        out.emit(&prefix, "");
    }

    DumpSummary {
        lost_bytes: lost,
        entries,
        lines: out.lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;

    fn encode(records: &[(Event, Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        for (event, data) in records {
            let entry = Entry::new(*event, data).unwrap();
            let start = out.len();
            out.resize(start + entry.encoded_len(), 0);
            entry.encode_into(&mut out[start..]).unwrap();
        }
        out
    }

    fn text(s: &str) -> (Event, Vec<u8>) {
        (Event::String, s.as_bytes().to_vec())
    }

    fn at(sec: i64, ms: i64) -> (Event, Vec<u8>) {
        (
            Event::Timestamp,
            Timestamp::new(sec, ms * NS_PER_MS).to_bytes().to_vec(),
        )
    }

    fn render_lines(records: &[u8], lost: usize, indent: usize) -> (Vec<String>, DumpSummary) {
        let mut lines: Vec<String> = Vec::new();
        let summary = render(records, lost, indent, &mut lines);
        (lines, summary)
    }

    #[test]
    fn test_strings_without_timestamps() {
        let bytes = encode(&[text("hello"), text("world")]);
        let (lines, summary) = render_lines(&bytes, 0, 0);
        assert_eq!(lines, vec!["hello", "world"]);
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.lines, 2);
    }

    #[test]
    fn test_timestamp_prefixes_next_line() {
        let bytes = encode(&[at(12, 345), text("mix"), text("again")]);
        let (lines, _) = render_lines(&bytes, 0, 2);
        assert_eq!(lines, vec!["  [12.345] mix", "  [12.345] again"]);
    }

    #[test]
    fn test_consecutive_timestamps_flush_deferred() {
        let bytes = encode(&[at(1, 100), at(2, 200), text("x")]);
        let (lines, summary) = render_lines(&bytes, 0, 0);
        assert_eq!(lines, vec!["[1.100]", "[2.200] x"]);
        assert_eq!(summary.entries, 3);
    }

    #[test]
    fn test_trailing_timestamp_printed() {
        let bytes = encode(&[text("x"), at(3, 7)]);
        let (lines, _) = render_lines(&bytes, 0, 0);
        assert_eq!(lines, vec!["[     ] x", "[3.007]"]);
    }

    #[test]
    fn test_lost_warning_first() {
        let bytes = encode(&[text("tail")]);
        let (lines, summary) = render_lines(&bytes, 17, 0);
        assert_eq!(
            lines,
            vec!["warning: lost 17 bytes worth of events", "tail"]
        );
        assert_eq!(summary.lost_bytes, 17);
    }

    #[test]
    fn test_unknown_event_keeps_going() {
        let mut bytes = vec![9, 1, b'z', 1];
        bytes.extend(encode(&[text("after")]));
        let (lines, summary) = render_lines(&bytes, 0, 0);
        assert_eq!(lines, vec!["warning: unknown event 9", "after"]);
        assert_eq!(summary.entries, 2);
    }

    #[test]
    fn test_empty_string_still_prints() {
        let bytes = encode(&[text(""), text("b")]);
        let (lines, _) = render_lines(&bytes, 0, 1);
        assert_eq!(lines, vec![" ", " b"]);
    }

    #[test]
    fn test_squash_run() {
        let bytes = encode(&[
            at(5, 0),
            at(5, 10),
            at(5, 30),
            at(5, 40),
            text("burst done"),
        ]);
        let (lines, summary) = render_lines(&bytes, 0, 0);
        assert_eq!(lines, vec!["[5.000 to .040 by .010 to .020] burst done"]);
        assert_eq!(summary.entries, 5);
    }

    #[test]
    fn test_short_run_not_squashed() {
        let bytes = encode(&[at(5, 0), at(5, 10), at(5, 20)]);
        let (lines, _) = render_lines(&bytes, 0, 0);
        assert_eq!(lines, vec!["[5.000]", "[5.010]", "[5.020]"]);
    }

    #[test]
    fn test_run_breaks_on_second_change_and_backwards_time() {
        let run_bytes = encode(&[at(5, 0), at(5, 10), at(6, 20), at(6, 30)]);
        let first = Timestamp::new(5, 0);
        assert_eq!(timestamp_run(&run_bytes, first).count, 2);

        let back = encode(&[at(5, 50), at(5, 60), at(5, 10), at(5, 70)]);
        assert_eq!(timestamp_run(&back, Timestamp::new(5, 50 * NS_PER_MS)).count, 2);
    }
}
