use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Static routing table from device type to backend shard address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardMap {
    routes: BTreeMap<String, String>,
}

impl ShardMap {
    /// Create a routing table from explicit `dev_type -> address` pairs
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self { routes }
    }

    /// Add or replace the route for one device type
    pub fn with_route(mut self, dev_type: impl Into<String>, addr: impl Into<String>) -> Self {
        self.routes.insert(dev_type.into(), addr.into());
        self
    }

    /// Resolve the shard address for a device type
    pub fn resolve(&self, dev_type: &str) -> Result<&str, DomainError> {
        self.routes
            .get(dev_type)
            .map(String::as_str)
            .ok_or_else(|| DomainError::UnknownDeviceType(dev_type.to_string()))
    }

    /// All distinct shard addresses
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.routes.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for ShardMap {
    fn default() -> Self {
        Self::new(BTreeMap::new())
            .with_route("idfa", "127.0.0.1:33013")
            .with_route("gaid", "127.0.0.1:33014")
            .with_route("adid", "127.0.0.1:33015")
            .with_route("dvid", "127.0.0.1:33016")
    }
}

/// Parse a `dev_type=host:port` route specification
pub fn parse_route(spec: &str) -> Result<(String, String), DomainError> {
    let (dev_type, addr) = spec
        .split_once('=')
        .ok_or_else(|| DomainError::InvalidRoute(spec.to_string()))?;
    let (dev_type, addr) = (dev_type.trim(), addr.trim());
    if dev_type.is_empty() || addr.is_empty() {
        return Err(DomainError::InvalidRoute(spec.to_string()));
    }
    Ok((dev_type.to_string(), addr.to_string()))
}
