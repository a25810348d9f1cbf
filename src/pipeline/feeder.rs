use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::backend::{ConnectionPool, Connector};
use crate::domain::{Batch, BatchAccumulator, ShardMap};
use crate::engine::{Job, JobSender};
use crate::io::parse::excerpt;
use crate::io::{IoError, is_skipped, parse_line};

/// What the reading stage saw in one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Non-blank, non-header lines
    pub lines: usize,
    pub skipped: usize,
    /// Lines rejected by the parser or the shard map
    pub rejected: usize,
    /// Records never handed to a worker because every worker was gone
    pub abandoned: usize,
    pub batches: usize,
}

impl FeedSummary {
    /// Errors attributable to the reading stage
    pub fn errors(&self) -> usize {
        self.rejected + self.abandoned
    }
}

/// Blocking stage of a file worker: lines in, jobs out
pub struct Feeder<C: Connector> {
    file: PathBuf,
    shards: ShardMap,
    header_marker: String,
    batch_size: usize,
    dry_run: bool,
    pools: Arc<ConnectionPool<C>>,
}

impl<C: Connector> Feeder<C> {
    pub fn new(
        file: PathBuf,
        shards: ShardMap,
        header_marker: String,
        batch_size: usize,
        dry_run: bool,
        pools: Arc<ConnectionPool<C>>,
    ) -> Self {
        Self {
            file,
            shards,
            header_marker,
            batch_size,
            dry_run,
            pools,
        }
    }

    /// Drive `lines` through parse, route and batch, enqueueing every full batch
    ///
    /// Consumes the sender, so the queue closes when feeding ends. Once an
    /// enqueue fails every later record is counted as abandoned. Must run on
    /// a blocking thread.
    pub fn feed<I>(self, lines: I, jobs: JobSender<Job<C>>) -> Result<FeedSummary, IoError>
    where
        I: IntoIterator<Item = Result<String, IoError>>,
    {
        let mut summary = FeedSummary::default();
        let mut batches = BatchAccumulator::new(self.batch_size);
        let mut workers_alive = true;

        for line in lines {
            let line = line?;
            if is_skipped(&line, &self.header_marker) {
                summary.skipped += 1;
                continue;
            }
            summary.lines += 1;

            if !workers_alive {
                summary.abandoned += 1;
                continue;
            }

            let record = match parse_line(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(file = %self.file.display(), line = excerpt(&line), error = %e, "Cannot parse line");
                    summary.rejected += 1;
                    continue;
                }
            };

            let shard = match self.shards.resolve(&record.dev_type) {
                Ok(shard) => shard,
                Err(e) => {
                    error!(file = %self.file.display(), error = %e, "Unknown device type");
                    summary.rejected += 1;
                    continue;
                }
            };

            if let Some(batch) = batches.push(shard, record) {
                workers_alive = self.enqueue(&jobs, batch, &mut summary);
            }
        }

        for batch in batches.finish() {
            if workers_alive {
                workers_alive = self.enqueue(&jobs, batch, &mut summary);
            } else {
                summary.abandoned += batch.len();
            }
        }

        debug!(
            file = %self.file.display(),
            lines = summary.lines,
            batches = summary.batches,
            rejected = summary.rejected,
            "Finished reading file"
        );
        Ok(summary)
    }

    /// Returns false if the batch could not be delivered
    fn enqueue(&self, jobs: &JobSender<Job<C>>, batch: Batch, summary: &mut FeedSummary) -> bool {
        let job = Job {
            pools: Arc::clone(&self.pools),
            batch,
            dry_run: self.dry_run,
        };

        match jobs.blocking_send(job) {
            Ok(()) => {
                summary.batches += 1;
                true
            }
            Err(job) => {
                error!(
                    file = %self.file.display(),
                    shard = job.batch.shard(),
                    "All insert workers are gone; abandoning the rest of the file"
                );
                summary.abandoned += job.batch.len();
                false
            }
        }
    }
}
