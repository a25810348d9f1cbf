pub mod error;
pub mod job;
pub mod queue;
pub mod retry;
pub mod worker;

// Re-export commonly used types
pub use error::EngineError;
pub use job::{Job, JobOutcome, WorkerResult};
pub use queue::{JobReceiver, JobSender, Recv, job_queue};
pub use retry::{RetryPolicy, write_with_retry};
pub use worker::InsertWorker;
