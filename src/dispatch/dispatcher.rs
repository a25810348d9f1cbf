use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{StreamExt, stream};
use glob::MatchOptions;
use tracing::{error, info, warn};

use super::error::DispatchError;
use super::executor::FileExecutor;
use crate::config::LoaderConfig;
use crate::pipeline::FileOutcome;

/// Everything a dispatch run produced, in input order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DispatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Files whose worker crashed or could not be started
    pub failed: Vec<PathBuf>,
}

impl DispatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_processed(&self) -> usize {
        self.outcomes.iter().map(|o| o.processed).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.outcomes.iter().map(|o| o.errors).sum()
    }
}

/// Files matching `pattern`, sorted; dot-files are never matched
pub fn list_files(pattern: &str) -> Result<Vec<PathBuf>, DispatchError> {
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut files = Vec::new();
    for entry in glob::glob_with(pattern, options)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable path"),
        }
    }
    files.sort();
    Ok(files)
}

/// Rename `path` to `.name` in the same directory
pub fn dot_rename(path: &Path) -> Result<PathBuf, DispatchError> {
    let mark_error = |source| DispatchError::MarkDone {
        file: path.to_path_buf(),
        source,
    };

    let name = path.file_name().ok_or_else(|| {
        mark_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no file name",
        ))
    })?;
    let mut hidden = std::ffi::OsString::from(".");
    hidden.push(name);

    let target = path.with_file_name(hidden);
    std::fs::rename(path, &target).map_err(mark_error)?;
    Ok(target)
}

/// Runs one file worker per matched file, at most `processes` at a time
///
/// A free slot takes the next file as soon as any running file finishes;
/// the report is put back in input order. A file whose worker fails is
/// recorded in the report and the remaining files still run.
pub struct Dispatcher<E: FileExecutor> {
    config: Arc<LoaderConfig>,
    executor: Arc<E>,
}

impl<E: FileExecutor> Dispatcher<E> {
    pub fn new(config: Arc<LoaderConfig>, executor: E) -> Self {
        Self {
            config,
            executor: Arc::new(executor),
        }
    }

    pub async fn run(&self) -> Result<DispatchReport, DispatchError> {
        let files = list_files(&self.config.pattern)?;
        if files.is_empty() {
            warn!(pattern = %self.config.pattern, "No files matched");
            return Ok(DispatchReport::default());
        }
        info!(
            files = files.len(),
            processes = self.config.processes,
            dry_run = self.config.dry_run,
            "Dispatching files"
        );

        let mut completions = stream::iter(files.into_iter().enumerate())
            .map(|(index, file)| {
                let executor = Arc::clone(&self.executor);
                async move {
                    let result = executor.execute(&file).await;
                    (index, file, result)
                }
            })
            .buffer_unordered(self.config.processes.max(1));

        let mut outcomes = Vec::new();
        let mut failed = Vec::new();
        while let Some((index, file, result)) = completions.next().await {
            match result {
                Ok(outcome) => {
                    if self.config.mark_done {
                        let target = dot_rename(&file)?;
                        info!(file = %file.display(), done = %target.display(), "Marked file as done");
                    }
                    outcomes.push((index, outcome));
                }
                Err(e) => {
                    error!(file = %file.display(), error = %e, "File worker failed");
                    failed.push((index, file));
                }
            }
        }

        outcomes.sort_by_key(|(index, _)| *index);
        failed.sort_by_key(|(index, _)| *index);
        let report = DispatchReport {
            outcomes: outcomes.into_iter().map(|(_, o)| o).collect(),
            failed: failed.into_iter().map(|(_, f)| f).collect(),
        };

        info!(
            files = report.outcomes.len(),
            failed = report.failed.len(),
            processed = report.total_processed(),
            errors = report.total_errors(),
            "Dispatch finished"
        );
        Ok(report)
    }
}
