use prost::Message;

use super::error::CodecError;
use crate::domain::AppsInstalled;

/// Stored payload for one device: `message UserApps { repeated uint32 apps = 1; optional double lat = 2; optional double lon = 3; }`
#[derive(Clone, PartialEq, Message)]
pub struct UserApps {
    #[prost(uint32, repeated, tag = "1")]
    pub apps: Vec<u32>,
    #[prost(double, optional, tag = "2")]
    pub lat: Option<f64>,
    #[prost(double, optional, tag = "3")]
    pub lon: Option<f64>,
}

impl From<&AppsInstalled> for UserApps {
    fn from(record: &AppsInstalled) -> Self {
        Self {
            apps: record.apps.clone(),
            lat: record.lat,
            lon: record.lon,
        }
    }
}

/// Converts records into backend payload bytes and back
pub trait PayloadCodec: Send + Sync + 'static {
    fn encode(&self, record: &AppsInstalled) -> Vec<u8>;

    fn decode(&self, payload: &[u8]) -> Result<UserApps, CodecError>;

    /// Encode, decode and compare against the source record
    fn verify_round_trip(&self, record: &AppsInstalled) -> Result<(), CodecError> {
        let decoded = self.decode(&self.encode(record))?;
        if decoded != UserApps::from(record) {
            return Err(CodecError::Mismatch(record.key().into_string()));
        }
        Ok(())
    }
}

/// Protobuf encoding of [`UserApps`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

impl PayloadCodec for ProtobufCodec {
    fn encode(&self, record: &AppsInstalled) -> Vec<u8> {
        UserApps::from(record).encode_to_vec()
    }

    fn decode(&self, payload: &[u8]) -> Result<UserApps, CodecError> {
        Ok(UserApps::decode(payload)?)
    }
}
