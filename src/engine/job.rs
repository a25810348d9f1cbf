use std::ops::AddAssign;
use std::sync::Arc;

use crate::backend::{ConnectionPool, Connector};
use crate::domain::Batch;

/// Unit of work handed from a file worker to the insert workers
pub struct Job<C: Connector> {
    pub pools: Arc<ConnectionPool<C>>,
    pub batch: Batch,
    pub dry_run: bool,
}

/// Result of processing one job, carrying the number of records it held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Processed(usize),
    Failed(usize),
}

/// Tally an insert worker reports once, when it terminates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerResult {
    /// Records written (or accepted in dry-run mode)
    pub processed: usize,
    /// Records belonging to jobs that failed
    pub errors: usize,
    pub jobs_processed: usize,
    pub jobs_failed: usize,
}

impl WorkerResult {
    pub fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Processed(records) => {
                self.processed += records;
                self.jobs_processed += 1;
            }
            JobOutcome::Failed(records) => {
                self.errors += records;
                self.jobs_failed += 1;
            }
        }
    }
}

impl AddAssign for WorkerResult {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.errors += other.errors;
        self.jobs_processed += other.jobs_processed;
        self.jobs_failed += other.jobs_failed;
    }
}
