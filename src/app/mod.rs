pub mod args;
pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod selftest;

// Re-export commonly used types
pub use args::{Cli, Command, LoadArgs, LogArgs, LogFormat};
pub use cli::{CliApp, exit_code};
pub use commands::{check_report, run_load, run_worker, write_outcome};
pub use error::AppError;
pub use logging::init_logging;
pub use selftest::run_selftest;
