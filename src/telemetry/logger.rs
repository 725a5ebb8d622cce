//! JSON Lines calibration log with file rotation.
//!
//! Each record captures one tick: the raw axis readings, the normalized values
//! they produced and the motion state. Files are named
//! `calibration_<UTC timestamp>_<sequence>.jsonl` so a lexical sort is also a
//! chronological one, which is what retention relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::{Result, StickNavError};
use crate::motion::MotionState;
use crate::sticks::axis::{NormalizedAxes, RawSample, NUM_AXES};

const FILE_PREFIX: &str = "calibration_";
const FILE_EXTENSION: &str = "jsonl";

/// One line of the calibration log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub timestamp: DateTime<Utc>,
    pub raw: [i32; NUM_AXES],
    pub normalized: [f32; NUM_AXES],
    /// `idle`, `pan` or `orbit`
    pub state: String,
}

impl CalibrationRecord {
    pub fn new(raw: &RawSample, normalized: &NormalizedAxes, state: MotionState) -> Self {
        Self {
            timestamp: Utc::now(),
            raw: raw.0,
            normalized: normalized.values(),
            state: state.to_string(),
        }
    }
}

/// Rotating JSONL writer for [`CalibrationRecord`]s.
pub struct TelemetryLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    log_interval: Duration,
    writer: Option<BufWriter<File>>,
    current_file: Option<PathBuf>,
    records_in_file: usize,
    sequence: u64,
    last_logged: Option<Instant>,
}

impl std::fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("log_dir", &self.log_dir)
            .field("current_file", &self.current_file)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

fn telemetry_error(context: &str, path: &Path, e: impl std::fmt::Display) -> StickNavError {
    StickNavError::Telemetry(format!("{} {}: {}", context, path.display(), e))
}

impl TelemetryLogger {
    /// Creates the log directory if needed. No file is opened until the first record.
    ///
    /// # Errors
    ///
    /// Returns `Telemetry` if the log directory cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&log_dir)
            .map_err(|e| telemetry_error("Failed to create log directory", &log_dir, e))?;

        info!("Calibration log enabled in {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            log_interval: Duration::from_millis(config.log_interval_ms),
            writer: None,
            current_file: None,
            records_in_file: 0,
            sequence: 0,
            last_logged: None,
        })
    }

    /// Whether enough time has passed since the last logged record.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_logged
            .map_or(true, |last| now.saturating_duration_since(last) >= self.log_interval)
    }

    /// Writes `record` if the log interval has elapsed. Returns whether it was written.
    pub fn log(&mut self, record: &CalibrationRecord, now: Instant) -> Result<bool> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.write_record(record)?;
        self.last_logged = Some(now);
        Ok(true)
    }

    /// Writes `record` unconditionally, rotating first if the current file is full.
    pub fn write_record(&mut self, record: &CalibrationRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let path = self.current_file.clone().unwrap_or_default();
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StickNavError::Telemetry("no open log file".to_string()))?;

        serde_json::to_writer(&mut *writer, record)
            .map_err(|e| telemetry_error("Failed to encode record for", &path, e))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| telemetry_error("Failed to write", &path, e))?;

        self.records_in_file += 1;
        Ok(())
    }

    /// Path of the file currently being written, if any.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush calibration log: {}", e);
            }
        }

        let name = format!(
            "{}{}_{:06}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence += 1;

        let path = self.log_dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| telemetry_error("Failed to open", &path, e))?;

        debug!("Calibration log rotated to {}", path.display());
        self.writer = Some(BufWriter::new(file));
        self.current_file = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Deletes the oldest log files beyond the retention limit.
    fn prune(&self) -> Result<()> {
        let mut files = log_files(&self.log_dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = files.len() - self.max_files_to_keep;
        for path in files.drain(..excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old calibration log {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

/// Calibration log files in `dir`, oldest first.
pub fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| telemetry_error("Failed to read", dir, e))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            let is_log = path.extension().map_or(false, |ext| ext == FILE_EXTENSION);
            let has_prefix = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with(FILE_PREFIX));
            is_log && has_prefix
        })
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sticks::axis::Stick;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, max_records: usize, max_files: usize) -> TelemetryConfig {
        TelemetryConfig {
            enabled: true,
            log_dir: dir.path().to_string_lossy().to_string(),
            max_records_per_file: max_records,
            max_files_to_keep: max_files,
            log_interval_ms: 100,
        }
    }

    fn record(state: MotionState) -> CalibrationRecord {
        CalibrationRecord::new(
            &RawSample([3, 520, 1021, 513]),
            &NormalizedAxes::new([1.0, 0.0, -1.0, 0.0]),
            state,
        )
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir, 10, 10);
        config.log_dir = dir.path().join("nested/logs").to_string_lossy().to_string();

        let logger = TelemetryLogger::new(&config).unwrap();
        assert!(dir.path().join("nested/logs").is_dir());
        assert!(logger.current_file().is_none());
    }

    #[test]
    fn test_record_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = TelemetryLogger::new(&config_in(&dir, 10, 10)).unwrap();

        logger
            .write_record(&record(MotionState::Active(Stick::Orbit)))
            .unwrap();

        let path = logger.current_file().unwrap().to_path_buf();
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["raw"], serde_json::json!([3, 520, 1021, 513]));
        assert_eq!(value["normalized"], serde_json::json!([1.0, 0.0, -1.0, 0.0]));
        assert_eq!(value["state"], "orbit");
        assert!(value["timestamp"].is_string());

        let parsed: CalibrationRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed.raw, [3, 520, 1021, 513]);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(record(MotionState::Idle).state, "idle");
        assert_eq!(record(MotionState::Active(Stick::Pan)).state, "pan");
    }

    #[test]
    fn test_log_interval_throttles() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = TelemetryLogger::new(&config_in(&dir, 10, 10)).unwrap();
        let t0 = Instant::now();

        assert!(logger.log(&record(MotionState::Idle), t0).unwrap());
        assert!(!logger.log(&record(MotionState::Idle), t0 + Duration::from_millis(50)).unwrap());
        assert!(logger.log(&record(MotionState::Idle), t0 + Duration::from_millis(100)).unwrap());

        let path = logger.current_file().unwrap().to_path_buf();
        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_rotation_after_max_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = TelemetryLogger::new(&config_in(&dir, 3, 10)).unwrap();

        for _ in 0..7 {
            logger.write_record(&record(MotionState::Idle)).unwrap();
        }

        let files = log_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(read_lines(&files[0]).len(), 3);
        assert_eq!(read_lines(&files[1]).len(), 3);
        assert_eq!(read_lines(&files[2]).len(), 1);
        assert_eq!(logger.current_file(), Some(files[2].as_path()));
    }

    #[test]
    fn test_retention_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = TelemetryLogger::new(&config_in(&dir, 1, 2)).unwrap();

        for _ in 0..5 {
            logger.write_record(&record(MotionState::Idle)).unwrap();
        }

        let files = log_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(logger.current_file(), Some(files[1].as_path()));
        assert!(files[1]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_000004.jsonl"));
    }

    #[test]
    fn test_foreign_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        fs::write(dir.path().join("other.jsonl"), b"{}").unwrap();

        let mut logger = TelemetryLogger::new(&config_in(&dir, 1, 1)).unwrap();
        for _ in 0..3 {
            logger.write_record(&record(MotionState::Idle)).unwrap();
        }

        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("other.jsonl").exists());
        assert_eq!(log_files(dir.path()).unwrap().len(), 1);
    }
}
