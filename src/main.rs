use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::{Builder, Runtime};

use memcload::prelude::*;

fn main() {
    let cli = Cli::parse();

    let code = match cli.command.clone() {
        Some(Command::Worker { file }) => worker_main(&cli.log, file),
        Some(Command::Selftest) => selftest_main(&cli.log),
        None => load_main(&cli),
    };
    std::process::exit(code);
}

/// Dispatch every matched file
fn load_main(cli: &Cli) -> i32 {
    let config = match cli.load.to_config() {
        Ok(config) => Arc::new(config),
        Err(e) => return startup_failure(e),
    };
    if let Err(e) = init_logging(&cli.log, config.dry_run) {
        return startup_failure(e);
    }
    let runtime = match runtime(None) {
        Ok(runtime) => runtime,
        Err(e) => return startup_failure(e),
    };

    let log = cli.log.clone();
    let in_process = cli.load.in_process;
    runtime.block_on(CliApp::new("memcload").run(|_stdout| async move {
        run_load(config, &log, in_process).await.map(|_| ())
    }))
}

/// Child process: config on stdin, outcome on stdout
fn worker_main(log: &LogArgs, file: PathBuf) -> i32 {
    let config = match read_config() {
        Ok(config) => Arc::new(config),
        Err(e) => return startup_failure(e),
    };
    if let Err(e) = init_logging(log, config.dry_run) {
        return startup_failure(e);
    }
    let runtime = match runtime(Some(config.threads_per_worker)) {
        Ok(runtime) => runtime,
        Err(e) => return startup_failure(e),
    };

    runtime.block_on(CliApp::new("memcload worker").run(|mut stdout| async move {
        run_worker(config, &file, &mut stdout).await.map(|_| ())
    }))
}

fn selftest_main(log: &LogArgs) -> i32 {
    if let Err(e) = init_logging(log, false) {
        return startup_failure(e);
    }
    exit_code("memcload selftest", run_selftest(&ProtobufCodec).map(|_| ()))
}

fn read_config() -> Result<LoaderConfig, AppError> {
    let mut json = String::new();
    std::io::stdin().read_to_string(&mut json)?;
    Ok(LoaderConfig::from_json(&json)?)
}

fn runtime(worker_threads: Option<usize>) -> Result<Runtime, AppError> {
    let mut builder = Builder::new_multi_thread();
    if let Some(threads) = worker_threads {
        builder.worker_threads(threads.max(1));
    }
    Ok(builder.enable_all().build()?)
}

fn startup_failure(e: AppError) -> i32 {
    eprintln!("Error: {e}");
    1
}
