pub mod error;
pub mod log_reader;
pub mod parse;

// Re-export commonly used types
pub use error::{IoError, ParseError};
pub use log_reader::LogFileReader;
pub use parse::{is_skipped, parse_line};
