//! Time-bucketed CSV log files with retention-based pruning.
//!
//! Samples land in `<root>/<YYYYMMDD_HHMM>/metrics_<YYYYMMDD_HHMM>.csv`,
//! with the directory keyed by 30-minute windows and the file by 5-minute
//! windows. Expired files are pruned opportunistically on every bucket
//! recomputation rather than on a separate timer.

use chrono::{DateTime, Duration, Local, Timelike};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

use crate::storage::model::{CSV_HEADER, Sample};

/// Configuration for automatic log retention.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Files older than this many hours are removed. Default: 36.
    pub retention_hours: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { retention_hours: 36 }
    }
}

impl RotationConfig {
    pub fn new(retention_hours: u32) -> Self {
        Self { retention_hours }
    }
}

/// A rotation time window, derived purely from a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBucket {
    /// Directory keyed by the half-hour floor: `YYYYMMDD_HH{00|30}`.
    pub dir: PathBuf,
    /// File keyed by the 5-minute floor: `metrics_YYYYMMDD_HHMM.csv`.
    pub file: PathBuf,
}

impl LogBucket {
    /// Computes the bucket a timestamp belongs to. Idempotent.
    pub fn for_timestamp(root: &Path, ts: &DateTime<Local>) -> Self {
        let date = ts.format("%Y%m%d").to_string();
        let hour = ts.format("%H").to_string();

        let half = if ts.minute() >= 30 { 30 } else { 0 };
        let dir = root.join(format!("{}_{}{:02}", date, hour, half));

        let five = ts.minute() / 5 * 5;
        let file = dir.join(format!("metrics_{}_{}{:02}.csv", date, hour, five));

        Self { dir, file }
    }
}

/// Appends samples to the active bucket and prunes expired buckets.
///
/// The file handle is opened and closed within each append; nothing is
/// held across ticks except the last file path, used to detect bucket
/// switches.
pub struct CsvStorage {
    root: PathBuf,
    current_file: Option<PathBuf>,
}

impl CsvStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            current_file: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Appends one sample row to the bucket `now` falls into.
    ///
    /// Switching buckets creates the directory and writes the fixed header
    /// before any data row.
    pub fn append(&mut self, sample: &Sample, now: &DateTime<Local>) -> std::io::Result<()> {
        let bucket = LogBucket::for_timestamp(&self.root, now);

        if self.current_file.as_ref() != Some(&bucket.file) {
            fs::create_dir_all(&bucket.dir)?;
            if !bucket.file.exists() {
                fs::write(&bucket.file, format!("{}\n", CSV_HEADER))?;
            }
            self.current_file = Some(bucket.file.clone());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&bucket.file)?;
        writeln!(file, "{}", sample.csv_row())
    }

    /// Removes files older than the retention window, then any directory
    /// left empty (the root included; the next append recreates it).
    ///
    /// Filesystem errors are reported and skipped; pruning must never
    /// stop sampling.
    pub fn prune(&self, now: &DateTime<Local>, config: &RotationConfig) {
        if !self.root.exists() {
            return;
        }

        let cutoff: SystemTime = (*now - Duration::hours(config.retention_hours as i64)).into();
        if prune_dir(&self.root, cutoff) {
            let _ = fs::remove_dir(&self.root);
        }
    }
}

/// Recursively prunes a directory; returns whether it ended up empty.
fn prune_dir(dir: &Path, cutoff: SystemTime) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to scan {} for pruning: {}", dir.display(), e);
            return false;
        }
    };

    let mut empty = true;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            if prune_dir(&path, cutoff) && fs::remove_dir(&path).is_ok() {
                continue;
            }
            empty = false;
        } else {
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|mtime| mtime < cutoff)
                .unwrap_or(false);

            if expired {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("Failed to remove expired {}: {}", path.display(), e);
                    empty = false;
                }
            } else {
                empty = false;
            }
        }
    }
    empty
}
