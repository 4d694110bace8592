// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::decode::RawRow;
use crate::validate::{validate, Record, SchemaValidationError};

/// `generated_at` format: UTC to microsecond precision, no offset suffix.
const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Lifecycle of one run's pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Started,
    Accumulating,
    Finished,
}

/// The persisted artifact: every validated record in arrival order, plus the
/// instant the file was generated.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub generated_at: String,
    pub items: Vec<Record>,
}

/// What `close` hands back to the caller after the artifact is on disk.
#[derive(Debug)]
pub struct RunReport {
    pub records: usize,
    pub path: PathBuf,
}

/// Run-scoped aggregator. Opened once per run, fed raw rows one at a time,
/// closed exactly once; `close` consumes the instance, so a finished pipeline
/// cannot be reused.
pub struct Pipeline {
    state: RunState,
    items: Vec<Record>,
    output_path: PathBuf,
}

impl Pipeline {
    /// Enter the Started state: empty collection, output path resolved
    /// against the current working directory.
    pub fn open(config: &ScraperConfig) -> Result<Self> {
        let cwd = env::current_dir().context("resolving current working directory")?;
        Ok(Self::new(cwd.join(&config.output_file)))
    }

    /// Like [`Pipeline::open`] with an explicit output path.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            state: RunState::Started,
            items: Vec::new(),
            output_path: output_path.into(),
        }
    }

    /// Validate one raw row and accumulate it. Returns the validated record
    /// so downstream consumers can keep acting on it. A validation failure
    /// rejects only this row; the pipeline stays usable for the next one.
    pub fn process(&mut self, row: &RawRow) -> Result<Record, SchemaValidationError> {
        if self.state == RunState::Started {
            self.state = RunState::Accumulating;
        }
        let record = validate(row)?;
        self.items.push(record.clone());
        Ok(record)
    }

    /// Enter the terminal Finished state: stamp the run, serialize every
    /// accumulated record to pretty JSON, and overwrite the output path in a
    /// single write.
    pub fn close(mut self) -> Result<RunReport> {
        self.state = RunState::Finished;
        debug!(state = ?self.state, "closing pipeline");

        let result = RunResult {
            generated_at: Utc::now().format(GENERATED_AT_FORMAT).to_string(),
            items: self.items,
        };
        write_result(&result, &self.output_path)?;

        info!(
            records = result.items.len(),
            path = %self.output_path.display(),
            "records written"
        );
        Ok(RunReport {
            records: result.items.len(),
            path: self.output_path,
        })
    }

    /// Records accumulated so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn write_result(result: &RunResult, path: &Path) -> Result<()> {
    // serde_json's pretty printer matches the artifact contract: two-space
    // indent, non-ASCII written literally.
    let json = serde_json::to_string_pretty(result).context("serializing run result")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
