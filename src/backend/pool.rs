use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::traits::{Connector, KvClient};

/// Process-local pool of reusable shard clients, keyed by shard address
///
/// Entries are created lazily on first use. There is no capacity ceiling:
/// a miss constructs a new client, and every client goes back to the pool
/// when its [`PooledConnection`] is dropped, so the pool grows to at most
/// the number of concurrent users per shard.
pub struct ConnectionPool<C: Connector> {
    connector: C,
    idle: DashMap<String, Vec<C::Client>>,
}

impl<C: Connector> ConnectionPool<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            idle: DashMap::new(),
        }
    }

    /// Take an idle client for `addr`, or build a new one on a miss
    pub fn acquire(self: &Arc<Self>, addr: &str) -> PooledConnection<C> {
        let reused = self.idle.get_mut(addr).and_then(|mut idle| idle.pop());

        let client = match reused {
            Some(client) => client,
            None => {
                debug!(shard = addr, "Creating backend client");
                self.connector.connect(addr)
            }
        };

        PooledConnection {
            pool: Arc::clone(self),
            client: Some(client),
        }
    }

    /// Number of idle clients currently parked for `addr`
    pub fn idle_count(&self, addr: &str) -> usize {
        self.idle.get(addr).map(|idle| idle.len()).unwrap_or(0)
    }

    fn release(&self, client: C::Client) {
        self.idle
            .entry(client.addr().to_string())
            .or_default()
            .push(client);
    }
}

/// Client borrowed from a [`ConnectionPool`]; returned to the pool on drop
pub struct PooledConnection<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
    client: Option<C::Client>,
}

impl<C: Connector> Deref for PooledConnection<C> {
    type Target = C::Client;

    fn deref(&self) -> &Self::Target {
        // Only `drop` empties the slot
        self.client.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<C: Connector> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.client.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}
