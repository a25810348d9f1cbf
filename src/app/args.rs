use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use super::error::AppError;
use crate::config::{LoaderConfig, default_processes};
use crate::domain::{ShardMap, parse_route};

/// Load gzipped device app logs into sharded memcached
#[derive(Parser, Debug)]
#[command(name = "memcload")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub load: LoadArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a single file with the config read from stdin; prints the outcome as JSON
    #[command(hide = true)]
    Worker {
        #[arg(long)]
        file: PathBuf,
    },

    /// Check that the payload codec round-trips sample records
    Selftest,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn as_arg(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Append logs to this file instead of stderr
    #[arg(long, env = "MEMCLOAD_LOG", global = true)]
    pub log: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "MEMCLOAD_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,
}

impl LogArgs {
    /// The same flags, for forwarding to child processes
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(path) = &self.log {
            args.push(OsString::from("--log"));
            args.push(path.clone().into_os_string());
        }
        args.push(OsString::from("--log-format"));
        args.push(OsString::from(self.log_format.as_arg()));
        args
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LoadArgs {
    /// Parse and batch everything but skip the backend writes
    #[arg(long = "dry", env = "MEMCLOAD_DRY")]
    pub dry_run: bool,

    #[arg(long, default_value = "data/appsinstalled/*.tsv.gz", env = "MEMCLOAD_PATTERN")]
    pub pattern: String,

    #[arg(long, default_value = "127.0.0.1:33013", env = "MEMCLOAD_IDFA")]
    pub idfa: String,

    #[arg(long, default_value = "127.0.0.1:33014", env = "MEMCLOAD_GAID")]
    pub gaid: String,

    #[arg(long, default_value = "127.0.0.1:33015", env = "MEMCLOAD_ADID")]
    pub adid: String,

    #[arg(long, default_value = "127.0.0.1:33016", env = "MEMCLOAD_DVID")]
    pub dvid: String,

    /// Extra or overriding route, as `dev_type=host:port` (repeatable)
    #[arg(long = "shard", value_name = "TYPE=ADDR")]
    pub shards: Vec<String>,

    /// Retries after the first write attempt
    #[arg(long, default_value_t = 1, env = "MEMCLOAD_RETRIES")]
    pub retries: u32,

    /// Per-request backend timeout, in seconds
    #[arg(long, default_value_t = 3.0, env = "MEMCLOAD_TIMEOUT")]
    pub timeout: f64,

    /// Base backoff delay, in seconds
    #[arg(long, default_value_t = 0.3, env = "MEMCLOAD_BACKOFF")]
    pub backoff: f64,

    /// Flush a shard batch once it holds more than this many records
    #[arg(long, default_value_t = 3, env = "MEMCLOAD_BATCH_SIZE")]
    pub batch_size: usize,

    /// Insert workers per file
    #[arg(long, default_value_t = 4, env = "MEMCLOAD_THREADS")]
    pub threads: usize,

    /// Job queue bound; 0 is unbounded
    #[arg(long, default_value_t = 0, env = "MEMCLOAD_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Idle worker heartbeat, in milliseconds
    #[arg(long, default_value_t = 100, env = "MEMCLOAD_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Concurrent file workers [default: cores - 1]
    #[arg(long, env = "MEMCLOAD_PROCESSES")]
    pub processes: Option<usize>,

    #[arg(long, default_value = ".tsv", env = "MEMCLOAD_HEADER_MARKER")]
    pub header_marker: String,

    /// Rename each loaded file to `.name`
    #[arg(long, env = "MEMCLOAD_MARK_DONE")]
    pub mark_done: bool,

    /// Run file workers as tasks of this process instead of child processes
    #[arg(long)]
    pub in_process: bool,
}

impl LoadArgs {
    pub fn to_config(&self) -> Result<LoaderConfig, AppError> {
        let mut shards = ShardMap::default()
            .with_route("idfa", &self.idfa)
            .with_route("gaid", &self.gaid)
            .with_route("adid", &self.adid)
            .with_route("dvid", &self.dvid);
        for spec in &self.shards {
            let (dev_type, addr) = parse_route(spec)?;
            shards = shards.with_route(dev_type, addr);
        }

        let config = LoaderConfig {
            dry_run: self.dry_run,
            pattern: self.pattern.clone(),
            shards,
            max_retries: self.retries,
            timeout: seconds("--timeout", self.timeout)?,
            backoff_factor: seconds("--backoff", self.backoff)?,
            batch_size: self.batch_size,
            threads_per_worker: self.threads,
            job_queue_capacity: self.queue_capacity,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            processes: self.processes.unwrap_or_else(default_processes),
            header_marker: self.header_marker.clone(),
            mark_done: self.mark_done,
        };
        Ok(config.validate()?)
    }
}

/// Fractional seconds at millisecond resolution
fn seconds(flag: &str, value: f64) -> Result<Duration, AppError> {
    let millis = (value * 1000.0).round();
    if !millis.is_finite() || millis < 0.0 || millis > u64::MAX as f64 {
        return Err(AppError::InvalidArguments(format!(
            "{flag} must be a non-negative number of seconds, got {value}"
        )));
    }
    Ok(Duration::from_millis(millis as u64))
}
