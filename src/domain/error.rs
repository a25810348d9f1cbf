use thiserror::Error;

/// Domain-level errors raised while routing records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown device type: {0}")]
    UnknownDeviceType(String),

    #[error("Invalid shard route: {0}")]
    InvalidRoute(String),
}
