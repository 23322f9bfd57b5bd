//! # Non-Blocking Log Dumper
//!
//! Attaches read-only to named log segments created by other processes and
//! prints their events to stdout. Diagnostics go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Dump every segment under /dev/shm once
//! nblog_dump
//!
//! # List segment names
//! nblog_dump --list
//!
//! # Follow two segments, printing new events every 200 ms
//! nblog_dump --segment mixer --segment fast_mixer --indent 2 --watch 200
//!
//! # Settings from a file, overridden by flags
//! nblog_dump --config nblog_dump.toml -v
//! ```

#![deny(warnings)]

mod dumper;

use clap::Parser;
use dumper::SegmentDumper;
use nblog::{LogSegment, SegmentConfig, WriteSink};
use nblog_common::config::{ConfigError, ConfigLoader, DumpConfig, LogLevel};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

/// Dump non-blocking event logs from shared memory
#[derive(Parser, Debug)]
#[command(name = "nblog_dump")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Dump non-blocking event logs from shared memory segments")]
#[command(long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the segments (overrides config)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Segment to dump (can be specified multiple times; default: all)
    #[arg(short, long = "segment", action = clap::ArgAction::Append)]
    segments: Vec<String>,

    /// Leading spaces on every event line (overrides config)
    #[arg(short, long)]
    indent: Option<usize>,

    /// Keep dumping new events every MS milliseconds until Ctrl-C
    #[arg(short, long, value_name = "MS")]
    watch: Option<u64>,

    /// Print segment names and exit
    #[arg(short, long)]
    list: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Dump failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(&args);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);
    let config = config?;

    let segment_config = SegmentConfig {
        dir: config.dump.shm_dir.clone(),
        populate: false,
    };

    if args.list {
        for name in LogSegment::list(&segment_config)? {
            println!("{name}");
        }
        return Ok(());
    }

    let mut dumper =
        SegmentDumper::open(&segment_config, &config.dump.segments, config.dump.indent)?;
    if dumper.is_empty() {
        info!("No log segments in {}", segment_config.dir.display());
        return Ok(());
    }

    let mut sink = WriteSink(std::io::stdout().lock());
    let Some(interval_ms) = config.dump.interval_ms else {
        dumper.dump(&mut sink, false);
        return Ok(());
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    info!(
        "Watching {} segment(s) every {} ms",
        dumper.len(),
        interval_ms
    );
    let interval = Duration::from_millis(interval_ms);
    dumper.dump(&mut sink, false);
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(interval);
        let summary = dumper.dump(&mut sink, true);
        if summary.lost_bytes > 0 {
            debug!("Lost {} bytes since last dump", summary.lost_bytes);
        }
    }

    info!("Received shutdown signal");
    Ok(())
}

/// Load the config file (or defaults) and apply CLI overrides.
fn resolve_config(args: &Args) -> Result<DumpConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => DumpConfig::load(path)?,
        None => DumpConfig::with_service_name("nblog-dump"),
    };

    if let Some(dir) = &args.dir {
        config.dump.shm_dir = dir.clone();
    }
    if !args.segments.is_empty() {
        config.dump.segments = args.segments.clone();
    }
    if let Some(indent) = args.indent {
        config.dump.indent = indent;
    }
    if args.watch.is_some() {
        config.dump.interval_ms = args.watch;
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber on stderr based on CLI arguments.
fn setup_tracing(args: &Args, level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
