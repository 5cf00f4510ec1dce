//! # Telemetry Module
//!
//! Records every dispatched report to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting tick reports as JSONL (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files
//!
//! Records are buffered and reach the disk on rotation, once per flush
//! interval, or on an explicit [`ActuationLog::flush`].
//!
//! ## Record Format
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.000Z","controller":1,"steering":"no_change","drive":{"command":{"command":"forward","duty":1600}},"powered":true}
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::host::ControllerId;
use crate::motor::Actuation;
use crate::vehicle::TickReport;

/// File name prefix of telemetry logs.
const FILE_PREFIX: &str = "actuation_";

/// File name extension of telemetry logs.
const FILE_EXTENSION: &str = "jsonl";

/// Default upper bound on how long a record may sit in the buffer.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// One JSONL line.
#[derive(Debug, Serialize)]
pub struct ActuationRecord {
    pub timestamp: DateTime<Utc>,
    pub controller: ControllerId,
    pub steering: Actuation,
    pub drive: Actuation,
    pub powered: bool,
}

impl ActuationRecord {
    /// Record of `report` stamped with the current time.
    #[must_use]
    pub fn now(controller: ControllerId, report: &TickReport) -> Self {
        Self {
            timestamp: Utc::now(),
            controller,
            steering: report.steering,
            drive: report.drive,
            powered: report.powered,
        }
    }
}

/// Rotating JSONL writer.
pub struct ActuationLog {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    sequence: u64,
    flush_interval: Duration,
    last_flush: Instant,
}

impl std::fmt::Debug for ActuationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuationLog")
            .field("dir", &self.dir)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl ActuationLog {
    /// Creates the log directory if needed. No file is opened until the
    /// first record.
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Actuation telemetry enabled in {}", dir.display());
        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            sequence: 0,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            last_flush: Instant::now(),
        })
    }

    /// Overrides how often buffered records are written out.
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Appends one record, rotating first if the current file is full.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Telemetry` error if writing fails.
    pub fn append(&mut self, record: &ActuationRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            self.records_in_file += 1;
        }

        if self.last_flush.elapsed() >= self.flush_interval {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes buffered records to disk.
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the write fails.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        self.last_flush = Instant::now();
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.last_flush = Instant::now();

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence += 1;

        let path = self.dir.join(name);
        debug!("Opening telemetry file {}", path.display());
        self.writer = Some(BufWriter::new(File::create(&path)?));
        self.records_in_file = 0;

        self.prune();
        Ok(())
    }

    /// Deletes the oldest files beyond the retention limit.
    fn prune(&self) {
        let mut files = match self.log_files() {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list telemetry files: {}", e);
                return;
            }
        };
        if files.len() <= self.max_files_to_keep {
            return;
        }

        // Names sort chronologically
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }

    /// Telemetry files currently in the log directory.
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with(FILE_PREFIX))
                .unwrap_or(false)
                && path.extension().map_or(false, |e| e == FILE_EXTENSION);
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}
