use thiserror::Error;

use crate::backend::BackendError;

/// Engine-level errors while writing a batch
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Cannot write to {shard} after {attempts} attempts: {source}")]
    RetriesExhausted {
        shard: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}
