use async_trait::async_trait;

use super::error::BackendError;

/// Client handle bound to one shard address
#[async_trait]
pub trait KvClient: Send + Sync + 'static {
    /// Address this client writes to
    fn addr(&self) -> &str;

    /// Store every `key -> payload` pair; fails if any pair was not stored
    async fn set_multi(&mut self, items: &[(String, Vec<u8>)]) -> Result<(), BackendError>;
}

/// Factory for shard clients
///
/// Construction is infallible; clients connect lazily on first use.
pub trait Connector: Send + Sync + 'static {
    type Client: KvClient;

    fn connect(&self, addr: &str) -> Self::Client;
}
