pub mod dispatcher;
pub mod error;
pub mod executor;

// Re-export commonly used types
pub use dispatcher::{DispatchReport, Dispatcher, dot_rename, list_files};
pub use error::DispatchError;
pub use executor::{FileExecutor, InProcessExecutor, ProcessExecutor};
