use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::NORMAL_ERR_RATE;

/// Fraction of failed records; a file with nothing processed counts as fully failed
pub fn error_rate(processed: usize, errors: usize) -> f64 {
    if processed == 0 {
        return 1.0;
    }
    errors as f64 / processed as f64
}

/// Admission decision for one loaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Totals for one input file, summed over the parse stage and every insert worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    /// Records written (or accepted in dry-run mode)
    pub processed: usize,
    /// Records lost to parse, routing or write failures
    pub errors: usize,
    /// Jobs whose writes were abandoned after all retries
    pub failed_jobs: usize,
}

impl FileOutcome {
    pub fn error_rate(&self) -> f64 {
        error_rate(self.processed, self.errors)
    }

    pub fn verdict(&self) -> Verdict {
        if self.error_rate() < NORMAL_ERR_RATE {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }

    /// Log the verdict; this is its only effect
    pub fn log_verdict(&self) {
        let rate = self.error_rate();
        match self.verdict() {
            Verdict::Accepted => info!(
                file = %self.file.display(),
                processed = self.processed,
                errors = self.errors,
                error_rate = rate,
                "Acceptable error rate. Successful load"
            ),
            Verdict::Rejected => error!(
                file = %self.file.display(),
                processed = self.processed,
                errors = self.errors,
                failed_jobs = self.failed_jobs,
                error_rate = rate,
                threshold = NORMAL_ERR_RATE,
                "High error rate. Failed load"
            ),
        }
    }
}
