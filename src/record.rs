//! Append-only prediction log
//!
//! Every successful prediction appends one CSV row: the parsed feature
//! values, the predicted label, the probability (empty when absent), and
//! the UTC timestamp in ISO-8601 form. The header row is written exactly
//! once, when the file is created. A mutex serializes the header check and
//! the append so concurrent requests never interleave a partial row.
//!
//! Logging failures are the caller's to swallow; they must never affect
//! the response.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;

use crate::error::{PredecirError, Result};
use crate::features::FeatureSpec;

/// Default log location, relative to the working directory
pub const DEFAULT_LOG_PATH: &str = "logs/predictions.csv";

/// Append-only CSV log of prediction records
#[derive(Debug)]
pub struct PredictionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PredictionLog {
    /// Create a log handle; the file is created lazily on first append
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path the log writes to
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one prediction record
    ///
    /// Creates the parent directory and the header row on first use.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the directory, header, or row cannot be
    /// written.
    pub fn append(
        &self,
        specs: &[FeatureSpec],
        features: &[f32],
        prediction: i64,
        probability: Option<f32>,
    ) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| PredecirError::IoError {
            message: "prediction log lock poisoned".to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PredecirError::IoError {
                    message: format!("failed to create log directory {}: {e}", parent.display()),
                })?;
            }
        }

        let new_file = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PredecirError::IoError {
                message: format!("failed to open log {}: {e}", self.path.display()),
            })?;

        if new_file {
            let keys: Vec<&str> = specs.iter().map(|s| s.key).collect();
            writeln!(file, "{},prediction,probability,timestamp", keys.join(",")).map_err(
                |e| PredecirError::IoError {
                    message: format!("failed to write log header: {e}"),
                },
            )?;
        }

        let row: Vec<String> = features.iter().map(ToString::to_string).collect();
        let probability = probability.map(|p| p.to_string()).unwrap_or_default();
        let timestamp = Utc::now().to_rfc3339();
        writeln!(
            file,
            "{},{prediction},{probability},{timestamp}",
            row.join(",")
        )
        .map_err(|e| PredecirError::IoError {
            message: format!("failed to append log row: {e}"),
        })?;
        Ok(())
    }
}
