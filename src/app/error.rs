use std::io;
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::dispatch::DispatchError;
use crate::domain::DomainError;
use crate::io::{IoError, ParseError};
use crate::pipeline::PipelineError;

/// Top-level application errors unifying all layer errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Log file error: {0}")]
    LogFile(#[from] IoError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Cannot initialise logging: {0}")]
    Logging(String),

    #[error("Cannot encode worker outcome: {0}")]
    Outcome(#[from] serde_json::Error),

    #[error("{0} file worker(s) failed")]
    WorkersFailed(usize),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
