use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ShardMap;

/// Error rate below which a file load counts as successful
pub const NORMAL_ERR_RATE: f64 = 0.01;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot decode configuration: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Immutable loader settings shared by the dispatcher, file workers and insert workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Do everything except the network write
    pub dry_run: bool,
    /// Glob pattern selecting input files
    pub pattern: String,
    pub shards: ShardMap,
    /// Retries after the first write attempt
    pub max_retries: u32,
    /// Per-request backend timeout
    pub timeout: Duration,
    /// Base delay; retry `i` waits `backoff_factor * 2^i`
    pub backoff_factor: Duration,
    /// A shard buffer is flushed once it holds more than this many records
    pub batch_size: usize,
    pub threads_per_worker: usize,
    /// Job queue bound; 0 means unbounded
    pub job_queue_capacity: usize,
    /// How long an idle insert worker waits on the queue between heartbeats
    pub poll_interval: Duration,
    /// Number of concurrent file workers
    pub processes: usize,
    /// Lines containing this marker are headers and are skipped
    pub header_marker: String,
    /// Rename each finished file to `.name`
    pub mark_done: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            pattern: "data/appsinstalled/*.tsv.gz".to_string(),
            shards: ShardMap::default(),
            max_retries: 1,
            timeout: Duration::from_secs(3),
            backoff_factor: Duration::from_millis(300),
            batch_size: 3,
            threads_per_worker: 4,
            job_queue_capacity: 0,
            poll_interval: Duration::from_millis(100),
            processes: default_processes(),
            header_marker: ".tsv".to_string(),
            mark_done: false,
        }
    }
}

impl LoaderConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.threads_per_worker == 0 {
            return Err(ConfigError::Invalid(
                "threads per worker must be at least 1".to_string(),
            ));
        }
        if self.processes == 0 {
            return Err(ConfigError::Invalid("processes must be at least 1".to_string()));
        }
        if self.shards.is_empty() {
            return Err(ConfigError::Invalid("no shard addresses configured".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll interval must be positive".to_string()));
        }
        Ok(self)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(json)?.validate()
    }
}

/// Available cores minus one, never less than one
pub fn default_processes() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}
