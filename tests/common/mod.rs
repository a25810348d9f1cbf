#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use memcload::prelude::*;

/// In-memory backend: fails the first `failures` calls, optionally delays each call
#[derive(Default)]
pub struct ScriptedBackend {
    pub failures: u32,
    pub delay: Duration,
    pub calls: AtomicU32,
    pub stored: Mutex<HashMap<String, Vec<u8>>>,
    pub writes: AtomicU32,
}

impl ScriptedBackend {
    pub fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            ..Default::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Default::default()
        })
    }

    pub fn stored_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.stored.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Total key writes, counting rewrites
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

pub struct ScriptedConnector(pub Arc<ScriptedBackend>);

pub struct ScriptedClient {
    addr: String,
    backend: Arc<ScriptedBackend>,
}

#[async_trait]
impl KvClient for ScriptedClient {
    fn addr(&self) -> &str {
        &self.addr
    }

    async fn set_multi(&mut self, items: &[(String, Vec<u8>)]) -> Result<(), BackendError> {
        if !self.backend.delay.is_zero() {
            tokio::time::sleep(self.backend.delay).await;
        }
        let call = self.backend.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.backend.failures {
            return Err(BackendError::Protocol("connection reset by peer".to_string()));
        }

        let mut stored = self.backend.stored.lock().unwrap();
        for (key, value) in items {
            stored.insert(key.clone(), value.clone());
        }
        self.backend
            .writes
            .fetch_add(items.len() as u32, Ordering::SeqCst);
        Ok(())
    }
}

impl Connector for ScriptedConnector {
    type Client = ScriptedClient;

    fn connect(&self, addr: &str) -> ScriptedClient {
        ScriptedClient {
            addr: addr.to_string(),
            backend: Arc::clone(&self.0),
        }
    }
}

pub fn shard_map() -> ShardMap {
    ShardMap::new(BTreeMap::new())
        .with_route("idfa", "127.0.0.1:33013")
        .with_route("gaid", "127.0.0.1:33014")
        .with_route("adid", "127.0.0.1:33015")
        .with_route("dvid", "127.0.0.1:33016")
}

pub fn test_config(dir: &Path) -> LoaderConfig {
    LoaderConfig {
        pattern: format!("{}/*.tsv.gz", dir.display()),
        shards: shard_map(),
        max_retries: 1,
        backoff_factor: Duration::from_millis(1),
        threads_per_worker: 4,
        poll_interval: Duration::from_millis(10),
        processes: 2,
        ..LoaderConfig::default()
    }
}

pub fn file_worker(config: LoaderConfig, backend: &Arc<ScriptedBackend>) -> FileWorker<ScriptedConnector> {
    FileWorker::new(
        Arc::new(config),
        Arc::new(ConnectionPool::new(ScriptedConnector(Arc::clone(backend)))),
        Arc::new(ProtobufCodec),
    )
}

pub fn write_gz(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::fast());
    for line in lines {
        writeln!(encoder, "{line}").unwrap();
    }
    encoder.finish().unwrap();
    path
}

/// `count` well-formed lines spread across the four device types
pub fn valid_lines(count: usize) -> Vec<String> {
    const TYPES: [&str; 4] = ["idfa", "gaid", "adid", "dvid"];
    (0..count)
        .map(|i| format!("{}\tdev{i:05}\t55.55\t42.42\t{},{},{}", TYPES[i % 4], i, i + 1, i * 7))
        .collect()
}
