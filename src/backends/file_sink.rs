// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::errors::ServiceError;
use crate::traits::RecordSink;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Writes each record as pretty JSON to `<dir>/<hint>_<timestamp>.json`.
///
/// The directory is created on first use. A second record within the same
/// second gets a numeric suffix rather than overwriting the first.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target_path(&self, hint: &str, timestamp: &str) -> PathBuf {
        let stem = if hint.is_empty() {
            timestamp.to_string()
        } else {
            format!("{}_{}", hint, timestamp)
        };

        let mut candidate = self.dir.join(format!("{}.json", stem));
        let mut suffix = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }
        candidate
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ServiceError {
    let path = path.display().to_string();
    move |source| ServiceError::Io { path, source }
}

impl RecordSink for JsonFileSink {
    fn persist(&self, record: &serde_json::Value, hint: &str) -> Result<PathBuf, ServiceError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let path = self.target_path(hint, &timestamp);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(io_error(&path))?;

        Ok(path)
    }
}
