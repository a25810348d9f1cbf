pub mod error;
pub mod user_apps;

// Re-export commonly used types
pub use error::CodecError;
pub use user_apps::{PayloadCodec, ProtobufCodec, UserApps};
