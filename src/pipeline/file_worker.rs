use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info};

use super::error::PipelineError;
use super::feeder::Feeder;
use super::outcome::FileOutcome;
use crate::backend::{ConnectionPool, Connector, MemcacheConnector};
use crate::codec::{PayloadCodec, ProtobufCodec};
use crate::config::LoaderConfig;
use crate::engine::{InsertWorker, RetryPolicy, WorkerResult, job_queue};
use crate::io::LogFileReader;

/// Loads one file end to end: read, batch, insert, tally
///
/// Each call to [`FileWorker::run`] owns a fresh job queue and insert worker
/// group; the connection pool is shared by every file this worker loads.
pub struct FileWorker<C: Connector> {
    config: Arc<LoaderConfig>,
    pools: Arc<ConnectionPool<C>>,
    codec: Arc<dyn PayloadCodec>,
}

impl FileWorker<MemcacheConnector> {
    /// File worker writing to memcached with the protobuf payload codec
    pub fn memcache(config: Arc<LoaderConfig>) -> Self {
        let pools = Arc::new(ConnectionPool::new(MemcacheConnector::new(config.timeout)));
        Self::new(config, pools, Arc::new(ProtobufCodec))
    }
}

impl<C: Connector> FileWorker<C> {
    pub fn new(
        config: Arc<LoaderConfig>,
        pools: Arc<ConnectionPool<C>>,
        codec: Arc<dyn PayloadCodec>,
    ) -> Self {
        Self {
            config,
            pools,
            codec,
        }
    }

    pub fn pools(&self) -> &Arc<ConnectionPool<C>> {
        &self.pools
    }

    pub async fn run(&self, path: &Path) -> Result<FileOutcome, PipelineError> {
        info!(file = %path.display(), "Processing file");
        let reader = LogFileReader::open(path)?;

        let (jobs, queue) = job_queue(self.config.job_queue_capacity);
        let retry = RetryPolicy::new(self.config.max_retries, self.config.backoff_factor);

        let mut workers = JoinSet::new();
        for id in 0..self.config.threads_per_worker {
            let worker = InsertWorker::new(
                id,
                queue.clone(),
                Arc::clone(&self.codec),
                retry,
                self.config.poll_interval,
            );
            workers.spawn(worker.run());
        }
        drop(queue);

        let feeder = Feeder::new(
            path.to_path_buf(),
            self.config.shards.clone(),
            self.config.header_marker.clone(),
            self.config.batch_size,
            self.config.dry_run,
            Arc::clone(&self.pools),
        );
        let fed = tokio::task::spawn_blocking(move || feeder.feed(reader, jobs)).await;

        // The sender is gone either way, so every worker drains and exits
        let mut written = WorkerResult::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => written += result,
                Err(e) => error!(file = %path.display(), error = %e, "Insert worker task failed"),
            }
        }

        let summary = fed??;
        let outcome = FileOutcome {
            file: path.to_path_buf(),
            processed: written.processed,
            errors: summary.errors() + written.errors,
            failed_jobs: written.jobs_failed,
        };
        outcome.log_verdict();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, KvClient};
    use crate::domain::ShardMap;
    use async_trait::async_trait;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::collections::{BTreeMap, HashSet};
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records written keys; rejects writes to `down` shards
    #[derive(Default)]
    struct RecordingBackend {
        down: HashSet<String>,
        keys: Mutex<Vec<String>>,
    }

    struct RecordingConnector(Arc<RecordingBackend>);

    struct RecordingClient {
        addr: String,
        backend: Arc<RecordingBackend>,
    }

    #[async_trait]
    impl KvClient for RecordingClient {
        fn addr(&self) -> &str {
            &self.addr
        }

        async fn set_multi(&mut self, items: &[(String, Vec<u8>)]) -> Result<(), BackendError> {
            if self.backend.down.contains(&self.addr) {
                return Err(BackendError::Protocol("server down".to_string()));
            }
            let mut keys = self.backend.keys.lock().unwrap();
            keys.extend(items.iter().map(|(key, _)| key.clone()));
            Ok(())
        }
    }

    impl Connector for RecordingConnector {
        type Client = RecordingClient;

        fn connect(&self, addr: &str) -> RecordingClient {
            RecordingClient {
                addr: addr.to_string(),
                backend: Arc::clone(&self.0),
            }
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig {
            shards: ShardMap::new(BTreeMap::new())
                .with_route("idfa", "idfa:1")
                .with_route("gaid", "gaid:1"),
            max_retries: 1,
            backoff_factor: Duration::from_millis(1),
            threads_per_worker: 3,
            poll_interval: Duration::from_millis(10),
            ..LoaderConfig::default()
        }
    }

    fn write_gz(dir: &TempDir, name: &str, lines: &[String]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::fast());
        for line in lines {
            writeln!(encoder, "{line}").unwrap();
        }
        encoder.finish().unwrap();
        path
    }

    fn worker(config: LoaderConfig, backend: &Arc<RecordingBackend>) -> FileWorker<RecordingConnector> {
        FileWorker::new(
            Arc::new(config),
            Arc::new(ConnectionPool::new(RecordingConnector(Arc::clone(backend)))),
            Arc::new(ProtobufCodec),
        )
    }

    fn sample_lines(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let dev_type = if i % 2 == 0 { "idfa" } else { "gaid" };
                format!("{dev_type}\tdev{i}\t55.5\t42.4\t{i},{}", i + 1)
            })
            .collect()
    }

    #[tokio::test]
    async fn every_record_is_written_once() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(&dir, "clean.tsv.gz", &sample_lines(50));
        let backend = Arc::new(RecordingBackend::default());

        let outcome = worker(config(), &backend).run(&path).await.unwrap();

        assert_eq!(outcome.processed, 50);
        assert_eq!(outcome.errors, 0);
        let keys = backend.keys.lock().unwrap();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), 50);
        assert_eq!(unique.len(), 50);
        assert!(unique.contains(&"idfa:dev0".to_string()));
        assert!(unique.contains(&"gaid:dev1".to_string()));
    }

    #[tokio::test]
    async fn failed_shard_counts_its_records_as_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(&dir, "half.tsv.gz", &sample_lines(20));
        let backend = Arc::new(RecordingBackend {
            down: HashSet::from(["gaid:1".to_string()]),
            ..Default::default()
        });

        let outcome = worker(config(), &backend).run(&path).await.unwrap();

        assert_eq!(outcome.processed, 10);
        assert_eq!(outcome.errors, 10);
        assert!(outcome.failed_jobs > 0);
    }

    #[tokio::test]
    async fn bounded_queue_loads_the_same_totals() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(&dir, "bounded.tsv.gz", &sample_lines(40));
        let backend = Arc::new(RecordingBackend::default());
        let config = LoaderConfig {
            job_queue_capacity: 1,
            threads_per_worker: 1,
            ..config()
        };

        let outcome = worker(config, &backend).run(&path).await.unwrap();
        assert_eq!(outcome.processed, 40);
        assert_eq!(outcome.errors, 0);
    }

    #[tokio::test]
    async fn dry_run_touches_no_backend() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(&dir, "dry.tsv.gz", &sample_lines(9));
        let backend = Arc::new(RecordingBackend::default());
        let config = LoaderConfig {
            dry_run: true,
            ..config()
        };

        let outcome = worker(config, &backend).run(&path).await.unwrap();
        assert_eq!(outcome.processed, 9);
        assert!(backend.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_a_pipeline_error() {
        let backend = Arc::new(RecordingBackend::default());
        let result = worker(config(), &backend)
            .run(Path::new("/nonexistent/file.tsv.gz"))
            .await;
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }
}
