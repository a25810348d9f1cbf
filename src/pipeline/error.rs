use thiserror::Error;

use crate::io::IoError;

/// Errors that abort processing of a single file
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot read log file: {0}")]
    Io(#[from] IoError),

    #[error("File reader task failed: {0}")]
    Reader(#[from] tokio::task::JoinError),
}
