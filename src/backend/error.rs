use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors talking to a key-value shard
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Request to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("Key {key} not stored: {reply}")]
    NotStored { key: String, reply: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl BackendError {
    /// Whether a retry on a fresh connection may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidKey(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = BackendError::Timeout {
            addr: "127.0.0.1:33013".to_string(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "Request to 127.0.0.1:33013 timed out after 3s");

        let err = BackendError::NotStored {
            key: "idfa:1".to_string(),
            reply: "SERVER_ERROR out of memory".to_string(),
        };
        assert_eq!(err.to_string(), "Key idfa:1 not stored: SERVER_ERROR out of memory");
    }

    #[test]
    fn invalid_key_is_not_transient() {
        assert!(!BackendError::InvalidKey("a b".to_string()).is_transient());
        assert!(BackendError::Protocol("eof".to_string()).is_transient());
    }

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        match BackendError::from(io_err) {
            BackendError::Io(_) => {}
            _ => panic!("Expected Io error variant"),
        }
    }
}
