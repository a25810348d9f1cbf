use thiserror::Error;

/// Errors decoding a stored payload
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Round-trip mismatch for {0}")]
    Mismatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_names_the_key() {
        assert_eq!(
            CodecError::Mismatch("idfa:1".to_string()).to_string(),
            "Round-trip mismatch for idfa:1"
        );
    }
}
