pub mod error;
pub mod feeder;
pub mod file_worker;
pub mod outcome;

// Re-export commonly used types
pub use error::PipelineError;
pub use feeder::{FeedSummary, Feeder};
pub use file_worker::FileWorker;
pub use outcome::{FileOutcome, Verdict, error_rate};
