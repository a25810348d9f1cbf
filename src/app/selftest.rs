use tracing::info;

use super::error::AppError;
use crate::codec::PayloadCodec;
use crate::io::parse_line;

const SAMPLE: &str = "idfa\t1rfw452y52g2gq4g\t55.55\t42.42\t1423,43,567,3,7,23\n\
gaid\t7rfw452y52g2gq4g\t55.55\t42.42\t7423,424";

/// Parse the sample lines and round-trip each record through `codec`
///
/// Returns the number of records checked.
pub fn run_selftest(codec: &dyn PayloadCodec) -> Result<usize, AppError> {
    let mut checked = 0;
    for line in SAMPLE.lines() {
        let record = parse_line(line)?;
        codec.verify_round_trip(&record)?;
        checked += 1;
    }
    info!(records = checked, "Payload codec self-test passed");
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, ProtobufCodec, UserApps};
    use crate::domain::AppsInstalled;

    #[test]
    fn protobuf_codec_passes() {
        assert_eq!(run_selftest(&ProtobufCodec).unwrap(), 2);
    }

    #[test]
    fn lossy_codec_fails() {
        /// Drops every app id
        struct LossyCodec;

        impl PayloadCodec for LossyCodec {
            fn encode(&self, _record: &AppsInstalled) -> Vec<u8> {
                Vec::new()
            }

            fn decode(&self, _payload: &[u8]) -> Result<UserApps, CodecError> {
                Ok(UserApps::default())
            }
        }

        assert!(matches!(
            run_selftest(&LossyCodec),
            Err(AppError::Codec(CodecError::Mismatch(_)))
        ));
    }
}
