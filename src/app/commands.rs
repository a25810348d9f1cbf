use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use super::args::LogArgs;
use super::error::AppError;
use crate::config::LoaderConfig;
use crate::dispatch::{DispatchReport, Dispatcher, FileExecutor, InProcessExecutor, ProcessExecutor};
use crate::pipeline::{FileOutcome, FileWorker};

/// Load every matched file, each in its own child process or in this one
pub async fn run_load(
    config: Arc<LoaderConfig>,
    log: &LogArgs,
    in_process: bool,
) -> Result<DispatchReport, AppError> {
    info!(pattern = %config.pattern, in_process, "Memc loader started");

    let report = if in_process {
        dispatch(Arc::clone(&config), InProcessExecutor::memcache(Arc::clone(&config))).await?
    } else {
        let executor = ProcessExecutor::current_exe(&config)?.with_args(log.to_args());
        dispatch(config, executor).await?
    };

    check_report(report)
}

async fn dispatch<E: FileExecutor>(
    config: Arc<LoaderConfig>,
    executor: E,
) -> Result<DispatchReport, AppError> {
    Ok(Dispatcher::new(config, executor).run().await?)
}

/// Fail the run if any worker crashed; error-rate verdicts never do
pub fn check_report(report: DispatchReport) -> Result<DispatchReport, AppError> {
    if report.all_succeeded() {
        Ok(report)
    } else {
        Err(AppError::WorkersFailed(report.failed.len()))
    }
}

/// Child side of [`ProcessExecutor`]: load `file` and print its outcome as one JSON line
pub async fn run_worker<W>(config: Arc<LoaderConfig>, file: &Path, out: &mut W) -> Result<FileOutcome, AppError>
where
    W: AsyncWrite + Unpin,
{
    let outcome = FileWorker::memcache(config).run(file).await?;
    write_outcome(&outcome, out).await?;
    Ok(outcome)
}

pub async fn write_outcome<W>(outcome: &FileOutcome, out: &mut W) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(outcome)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}
