use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// Errors while assigning files to workers
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot start worker for {file}: {source}")]
    Spawn {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Worker for {file} exited with {status}")]
    WorkerFailed { file: PathBuf, status: String },

    #[error("Worker for {file} returned no outcome")]
    MissingOutcome { file: PathBuf },

    #[error("Worker returned an unreadable outcome: {0}")]
    InvalidOutcome(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot mark {file} as done: {source}")]
    MarkDone {
        file: PathBuf,
        #[source]
        source: io::Error,
    },
}
