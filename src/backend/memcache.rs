use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;

use super::error::BackendError;
use super::traits::{Connector, KvClient};

/// Longest key memcached accepts
pub const MAX_KEY_LEN: usize = 250;

/// Creates [`MemcacheClient`]s sharing one request timeout
#[derive(Debug, Clone)]
pub struct MemcacheConnector {
    timeout: Duration,
}

impl MemcacheConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for MemcacheConnector {
    type Client = MemcacheClient;

    fn connect(&self, addr: &str) -> MemcacheClient {
        MemcacheClient::new(addr, self.timeout)
    }
}

/// Memcached text-protocol client for a single server
///
/// The TCP connection is opened on first use and discarded after any
/// failure, so the next request reconnects.
pub struct MemcacheClient {
    addr: String,
    timeout: Duration,
    stream: Option<BufStream<TcpStream>>,
}

impl MemcacheClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn open(addr: &str) -> Result<BufStream<TcpStream>, BackendError> {
        debug!(shard = addr, "Connecting to memcached");
        let tcp = TcpStream::connect(addr).await?;
        tcp.set_nodelay(true)?;
        Ok(BufStream::new(tcp))
    }

    /// Pipeline all `set` commands, then read one reply per key
    async fn pipeline(&mut self, items: &[(String, Vec<u8>)]) -> Result<(), BackendError> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => Self::open(&self.addr).await?,
        };
        let stream = self.stream.insert(stream);

        for (key, value) in items {
            let header = format!("set {key} 0 0 {}\r\n", value.len());
            stream.write_all(header.as_bytes()).await?;
            stream.write_all(value).await?;
            stream.write_all(b"\r\n").await?;
        }
        stream.flush().await?;

        let mut reply = String::new();
        for (key, _) in items {
            reply.clear();
            if stream.read_line(&mut reply).await? == 0 {
                return Err(BackendError::Protocol(format!(
                    "connection to {} closed before reply",
                    self.addr
                )));
            }
            let reply = reply.trim_end();
            if reply != "STORED" {
                return Err(BackendError::NotStored {
                    key: key.clone(),
                    reply: reply.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl KvClient for MemcacheClient {
    fn addr(&self) -> &str {
        &self.addr
    }

    async fn set_multi(&mut self, items: &[(String, Vec<u8>)]) -> Result<(), BackendError> {
        for (key, _) in items {
            validate_key(key)?;
        }
        if items.is_empty() {
            return Ok(());
        }

        let result = match tokio::time::timeout(self.timeout, self.pipeline(items)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                addr: self.addr.clone(),
                timeout: self.timeout,
            }),
        };

        if result.is_err() {
            // Replies may be left unread; never reuse a desynchronised stream
            self.stream = None;
        }
        result
    }
}

/// Check a key against memcached's rules: 1..=250 bytes, no whitespace or control characters
pub fn validate_key(key: &str) -> Result<(), BackendError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key.bytes().all(|b| b > b' ' && b != 0x7f);
    if valid {
        Ok(())
    } else {
        Err(BackendError::InvalidKey(key.to_string()))
    }
}
