//! Real-time cycle loop logging to a named segment
//!
//! A periodic thread logs a timestamp and a status line every cycle while the
//! main thread dumps the log twice a second. Run `nblog_dump --segment
//! rt_cycle --watch 200` in another terminal to follow it from outside.

use nblog::{LogSegment, Reader, SegmentConfig, TracingSink, Writer, init_tracing, nblog};
use nblog_common::consts::FAST_LOG_SIZE;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const CYCLE: Duration = Duration::from_millis(5);
const RUN_FOR: Duration = Duration::from_secs(2);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let shared = LogSegment::create("rt_cycle", FAST_LOG_SIZE, &SegmentConfig::default())?;
    if let Err(e) = shared.lock_memory() {
        info!("Running without locked log memory: {}", e);
    }

    let running = Arc::new(AtomicBool::new(true));
    let rt = {
        let mut writer = Writer::new(shared.clone())?;
        let running = running.clone();
        thread::spawn(move || {
            let mut next = Instant::now();
            let mut cycle = 0u64;
            while running.load(Ordering::Relaxed) {
                let start = Instant::now();
                writer.log_timestamp();
                if cycle % 50 == 0 {
                    nblog!(writer, "cycle {} ok", cycle);
                }
                let busy = start.elapsed();
                if busy > CYCLE / 2 {
                    nblog!(writer, "cycle {} slow: {}us", cycle, busy.as_micros());
                }

                cycle += 1;
                next += CYCLE;
                if let Some(wait) = next.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }
            }
            writer.dropped()
        })
    };

    let mut reader = Reader::new(shared);
    let started = Instant::now();
    while started.elapsed() < RUN_FOR {
        thread::sleep(Duration::from_millis(500));
        let summary = reader.dump(&mut TracingSink, 2);
        info!(
            "Dumped {} events, {} bytes lost",
            summary.entries, summary.lost_bytes
        );
    }

    running.store(false, Ordering::Relaxed);
    let dropped = rt.join().map_err(|_| "cycle thread panicked")?;
    info!("Cycle thread done, {} records dropped", dropped);
    Ok(())
}
