pub mod error;
pub mod memcache;
pub mod pool;
pub mod traits;

// Re-export commonly used types
pub use error::BackendError;
pub use memcache::{MemcacheClient, MemcacheConnector, validate_key};
pub use pool::{ConnectionPool, PooledConnection};
pub use traits::{Connector, KvClient};
