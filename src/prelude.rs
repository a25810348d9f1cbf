//! Prelude module for convenient imports
//!
//! Import everything you need with: `use memcload::prelude::*;`

// Domain types
pub use crate::domain::{AppsInstalled, Batch, BatchAccumulator, DomainError, ShardKey, ShardMap};

// IO types
pub use crate::io::{IoError, LogFileReader, ParseError, parse_line};

// Codec types
pub use crate::codec::{CodecError, PayloadCodec, ProtobufCodec, UserApps};

// Backend types
pub use crate::backend::{
    BackendError, ConnectionPool, Connector, KvClient, MemcacheClient, MemcacheConnector,
};

// Engine types
pub use crate::engine::{EngineError, InsertWorker, Job, JobOutcome, RetryPolicy, WorkerResult};

// Pipeline types
pub use crate::pipeline::{FileOutcome, FileWorker, PipelineError, Verdict};

// Dispatch types
pub use crate::dispatch::{
    DispatchError, DispatchReport, Dispatcher, FileExecutor, InProcessExecutor, ProcessExecutor,
};

// Config
pub use crate::config::{LoaderConfig, NORMAL_ERR_RATE};

// App types
pub use crate::app::{
    AppError, Cli, CliApp, Command, LogArgs, exit_code, init_logging, run_load, run_selftest,
    run_worker,
};
