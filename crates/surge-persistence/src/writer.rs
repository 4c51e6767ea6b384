//! JSON Lines writer for committed decisions.
//!
//! One file per UTC day (`decisions_YYYY-MM-DD.jsonl`), opened in append
//! mode. Each line is a complete JSON object, so an interrupted write only
//! loses the last line.

use crate::error::PersistenceResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One committed decision.
///
/// Prices are kept as decimal strings so the log is exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp_ms: i64,
    pub signal_id: String,
    pub signal_type: String,
    pub signal_value: String,
    pub source: String,
    pub previous_price: String,
    pub new_price: String,
    pub decision: String,
    pub reasoning: String,
    /// Oracle name, or `fallback`.
    pub priced_by: String,
    /// Validation adjustments applied to the proposal.
    #[serde(default)]
    pub adjustments: Vec<String>,
}

/// Active writer state for the current day.
struct ActiveWriter {
    writer: BufWriter<File>,
    date: String,
    records_written: usize,
}

/// Buffered, day-rotating decision log.
pub struct DecisionLog {
    base_dir: PathBuf,
    buffer: Vec<DecisionRecord>,
    max_buffer_size: usize,
    active_writer: Option<ActiveWriter>,
}

impl DecisionLog {
    /// Create a log under `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>, max_buffer_size: usize) -> Self {
        let base_dir = base_dir.into();
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            warn!(?e, dir = %base_dir.display(), "Failed to create audit log directory");
        }

        Self {
            base_dir,
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size: max_buffer_size.max(1),
            active_writer: None,
        }
    }

    /// Buffer a record, flushing when the buffer is full.
    pub fn append(&mut self, record: DecisionRecord) -> PersistenceResult<()> {
        self.buffer.push(record);

        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    /// Records buffered but not yet on disk.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn close_active_writer(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush audit log on close");
            }
            info!(
                date = %active.date,
                records = active.records_written,
                "Closed decision log"
            );
        }
    }

    fn open_writer(&mut self, date: &str) -> PersistenceResult<&mut ActiveWriter> {
        let path = self.base_dir.join(format!("decisions_{date}.jsonl"));
        info!(path = %path.display(), "Opening decision log (append mode)");

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(self.active_writer.insert(ActiveWriter {
            writer: BufWriter::new(file),
            date: date.to_string(),
            records_written: 0,
        }))
    }

    /// Write buffered records to today's file.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();

        if self
            .active_writer
            .as_ref()
            .is_some_and(|w| w.date != today)
        {
            self.close_active_writer();
        }

        let records = std::mem::take(&mut self.buffer);
        let active = match self.active_writer {
            Some(ref mut active) => active,
            None => self.open_writer(&today)?,
        };

        for record in &records {
            let json = serde_json::to_string(record)?;
            writeln!(active.writer, "{json}")?;
        }
        active.writer.flush()?;
        active.records_written += records.len();

        debug!(date = %today, records = records.len(), "Flushed decisions");
        Ok(())
    }

    /// Flush and close.
    pub fn close(&mut self) -> PersistenceResult<()> {
        self.flush()?;
        self.close_active_writer();
        Ok(())
    }
}

impl Drop for DecisionLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(?e, "Failed to flush decision log on drop");
        }
        self.close_active_writer();
    }
}
