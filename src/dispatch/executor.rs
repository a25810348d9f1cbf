use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::error::DispatchError;
use crate::backend::{Connector, MemcacheConnector};
use crate::config::LoaderConfig;
use crate::pipeline::{FileOutcome, FileWorker};

/// Runs the complete file worker for one file
#[async_trait]
pub trait FileExecutor: Send + Sync {
    async fn execute(&self, file: &Path) -> Result<FileOutcome, DispatchError>;
}

/// Runs file workers as tasks of the current process
pub struct InProcessExecutor<C: Connector> {
    worker: FileWorker<C>,
}

impl InProcessExecutor<MemcacheConnector> {
    pub fn memcache(config: Arc<LoaderConfig>) -> Self {
        Self::new(FileWorker::memcache(config))
    }
}

impl<C: Connector> InProcessExecutor<C> {
    pub fn new(worker: FileWorker<C>) -> Self {
        Self { worker }
    }
}

#[async_trait]
impl<C: Connector> FileExecutor for InProcessExecutor<C> {
    async fn execute(&self, file: &Path) -> Result<FileOutcome, DispatchError> {
        Ok(self.worker.run(file).await?)
    }
}

/// Runs each file worker in a child process
///
/// The child is invoked as `<program> <args..> worker --file <path>`, reads
/// the JSON-encoded config from stdin and prints its [`FileOutcome`] as a
/// single JSON line on stdout. Dropping the execution kills the child.
pub struct ProcessExecutor {
    program: PathBuf,
    args: Vec<OsString>,
    config_json: String,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>, config: &LoaderConfig) -> Result<Self, DispatchError> {
        Ok(Self {
            program: program.into(),
            args: Vec::new(),
            config_json: config.to_json()?,
        })
    }

    /// Re-execute the running binary
    pub fn current_exe(config: &LoaderConfig) -> Result<Self, DispatchError> {
        Self::new(std::env::current_exe()?, config)
    }

    /// Arguments placed before the `worker` subcommand
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl FileExecutor for ProcessExecutor {
    async fn execute(&self, file: &Path) -> Result<FileOutcome, DispatchError> {
        let spawn_error = |source| DispatchError::Spawn {
            file: file.to_path_buf(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("worker")
            .arg("--file")
            .arg(file)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;
        debug!(file = %file.display(), pid = ?child.id(), "Started file worker process");

        // A child that exits before reading its config is reported by its status
        if let Some(stdin) = child.stdin.take()
            && let Err(e) = write_config(stdin, &self.config_json).await
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(spawn_error(e));
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(DispatchError::WorkerFailed {
                file: file.to_path_buf(),
                status: output.status.to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| DispatchError::MissingOutcome {
                file: file.to_path_buf(),
            })?;
        Ok(serde_json::from_str(line)?)
    }
}

async fn write_config(mut stdin: tokio::process::ChildStdin, json: &str) -> std::io::Result<()> {
    stdin.write_all(json.as_bytes()).await?;
    stdin.shutdown().await
}
