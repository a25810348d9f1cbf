use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use super::args::{LogArgs, LogFormat};
use super::error::AppError;

/// Default filter when `RUST_LOG` is unset
pub fn default_directive(dry_run: bool) -> &'static str {
    if dry_run { "debug" } else { "info" }
}

/// Install the global subscriber; stdout is never written to
pub fn init_logging(args: &LogArgs, dry_run: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(dry_run)));

    let writer = match &args.log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(args.log.is_none());

    let installed = match args.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))
}
