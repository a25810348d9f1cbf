use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, trace};

use super::error::EngineError;
use super::job::{Job, JobOutcome, WorkerResult};
use super::queue::{JobReceiver, Recv};
use super::retry::{RetryPolicy, write_with_retry};
use crate::backend::Connector;
use crate::codec::PayloadCodec;

/// Consumes jobs from a shared queue and writes their batches to the backend
///
/// A worker runs until the queue is closed and drained, then returns its
/// tally. Failures inside a job, panics included, are contained to that job.
pub struct InsertWorker<C: Connector> {
    id: usize,
    queue: JobReceiver<Job<C>>,
    codec: Arc<dyn PayloadCodec>,
    retry: RetryPolicy,
    poll_interval: Duration,
}

impl<C: Connector> InsertWorker<C> {
    pub fn new(
        id: usize,
        queue: JobReceiver<Job<C>>,
        codec: Arc<dyn PayloadCodec>,
        retry: RetryPolicy,
        poll_interval: Duration,
    ) -> Self {
        Self {
            id,
            queue,
            codec,
            retry,
            poll_interval,
        }
    }

    pub async fn run(self) -> WorkerResult {
        let mut result = WorkerResult::default();

        loop {
            match self.queue.recv_timeout(self.poll_interval).await {
                Recv::Item(job) => result.record(self.process(job).await),
                Recv::Idle => trace!(worker = self.id, "Waiting for jobs"),
                Recv::Closed => break,
            }
        }

        debug!(
            worker = self.id,
            processed = result.processed,
            errors = result.errors,
            jobs_failed = result.jobs_failed,
            "Insert worker finished"
        );
        result
    }

    /// Process one job; never panics and never returns an error
    pub async fn process(&self, job: Job<C>) -> JobOutcome {
        let records = job.batch.len();
        let shard = job.batch.shard().to_string();

        match AssertUnwindSafe(self.insert(job)).catch_unwind().await {
            Ok(Ok(())) => JobOutcome::Processed(records),
            Ok(Err(e)) => {
                error!(worker = self.id, shard = %shard, records, error = %e, "Cannot write batch");
                JobOutcome::Failed(records)
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(worker = self.id, shard = %shard, records, reason = %reason, "Insert worker crashed on job");
                JobOutcome::Failed(records)
            }
        }
    }

    async fn insert(&self, job: Job<C>) -> Result<(), EngineError> {
        let Job {
            pools,
            batch,
            dry_run,
        } = job;

        let items: Vec<(String, Vec<u8>)> = batch
            .records()
            .iter()
            .map(|record| (record.key().into_string(), self.codec.encode(record)))
            .collect();

        if dry_run {
            debug!(
                shard = batch.shard(),
                items = items.len(),
                keys = ?items.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
                "Dry run; skipping write"
            );
            return Ok(());
        }

        let mut conn = pools.acquire(batch.shard());
        write_with_retry(&mut *conn, &items, &self.retry).await?;
        Ok(())
    }
}
