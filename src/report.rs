//! # Event Reporting Module
//!
//! Explicit reporting sink threaded through the pipeline and sync engine.
//! The core never owns process-wide log state; whoever builds the pipeline
//! decides where events go.
//!
//! `RunLog` is the on-disk implementation: append-mode text, one
//! self-contained line per event, recreated with a "Starting execution."
//! marker at the start of every run. Events are mirrored to `tracing` so
//! console output stays useful alongside the file ledger.

use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// One-method reporting interface: record an event line.
pub trait EventSink {
    fn record(&self, message: &str);
}

/// File-backed run ledger.
pub struct RunLog {
    file: Mutex<File>,
}

impl RunLog {
    /// Truncate (or create) the log file and write the run marker.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        writeln!(file, "Starting execution.")?;

        Ok(Self { file: Mutex::new(file) })
    }
}

impl EventSink for RunLog {
    fn record(&self, message: &str) {
        info!("{}", message);
        if let Ok(mut file) = self.file.lock() {
            // A failed log write should not abort the batch.
            let _ = writeln!(file, "{}", message);
        }
    }
}

/// Console-only sink for runs where no log file was requested.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn record(&self, message: &str) {
        info!("{}", message);
    }
}

/// In-memory sink for tests.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl EventSink for MemorySink {
    fn record(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}
