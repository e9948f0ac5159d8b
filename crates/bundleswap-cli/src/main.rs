mod dispatch;
mod launcher;
mod liveness;
mod logging;
mod orchestrator;
mod swap;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::dispatch::run_cli;
use crate::liveness::DEFAULT_POLL_INTERVAL_MS;
use crate::orchestrator::{EXIT_FAILURE, EXIT_SUCCESS};

#[derive(Parser, Debug)]
#[command(name = "bundleswap-updater")]
#[command(
    about = "Replaces an installed app bundle with an extracted update, rolling back on failure",
    long_about = None,
    version
)]
#[command(
    override_usage = "bundleswap-updater [OPTIONS] <PARENT_PID> <LOG_FILE> <APP_PATH> [<EXTRACTED_FOLDER> <BACKUP_PATH>]"
)]
struct Cli {
    /// PID of the app instance that requested the update.
    parent_pid: u32,
    log_file: PathBuf,
    /// Install location of the app bundle.
    app_path: PathBuf,
    /// Folder holding the already-extracted update bundle. Omit together with
    /// BACKUP_PATH to only restart the app.
    #[arg(requires = "backup_path")]
    extracted_folder: Option<PathBuf>,
    /// Where the displaced bundle is kept until the update completes.
    backup_path: Option<PathBuf>,
    #[arg(
        long,
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_ms: u64,
    /// Skip the check that all paths share one filesystem.
    #[arg(long)]
    allow_cross_volume: bool,
}

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return parse_error_exit_code(&err);
        }
    };

    run_cli(cli)
}

fn parse_error_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}
