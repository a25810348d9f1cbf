use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors turning a single log line into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected 5 tab-separated fields, found {0}")]
    TooFewFields(usize),

    #[error("Expected 5 tab-separated fields, found {0}")]
    TooManyFields(usize),

    #[error("Missing device type")]
    MissingDeviceType,

    #[error("Missing device id")]
    MissingDeviceId,
}

/// IO-level errors while reading compressed log files
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
