// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the current working directory.
pub const DEFAULT_CONFIG_PATH: &str = "scraper.yaml";

/// Run configuration for a single scrape: where to fetch from and where the
/// JSON artifact lands. `output_file` is resolved against the process's
/// current working directory at pipeline open time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub target_url: String,
    pub output_file: String,
}

impl ScraperConfig {
    /// Load and parse the YAML config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}
