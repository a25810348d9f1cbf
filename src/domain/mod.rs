pub mod batch;
pub mod error;
pub mod record;
pub mod shard;

// Re-export commonly used types
pub use batch::{Batch, BatchAccumulator};
pub use error::DomainError;
pub use record::{AppsInstalled, ShardKey};
pub use shard::{ShardMap, parse_route};
