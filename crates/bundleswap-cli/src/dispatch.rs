use std::time::Duration;

use anyhow::{anyhow, Result};
use bundleswap_core::{BundleName, RestartSession, UpdateSession};
use bundleswap_installer::ensure_disjoint_paths;
use tracing::info;

use crate::launcher::SystemLauncher;
use crate::liveness::{LivenessMonitor, SystemProcessProbe};
use crate::logging::{log_error, UpdateLog};
use crate::orchestrator::{session_paths, UpdateOrchestrator, UpdateOutcome, EXIT_FAILURE};
use crate::Cli;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    Update(UpdateSession),
    Restart(RestartSession),
}

pub(crate) fn resolve_mode(cli: &Cli) -> Result<Mode> {
    if cli.parent_pid == 0 {
        return Err(anyhow!("invalid parent PID: 0"));
    }
    if BundleName::from_app_path(&cli.app_path).is_none() {
        return Err(anyhow!(
            "app path has no bundle name: {}",
            cli.app_path.display()
        ));
    }

    match (&cli.extracted_folder, &cli.backup_path) {
        (Some(extracted_folder), Some(backup_path)) => {
            let session = UpdateSession::new(
                cli.parent_pid,
                cli.app_path.clone(),
                extracted_folder.clone(),
                backup_path.clone(),
            );
            ensure_disjoint_paths(&session_paths(&session))?;
            Ok(Mode::Update(session))
        }
        (None, None) => Ok(Mode::Restart(RestartSession::new(
            cli.parent_pid,
            cli.app_path.clone(),
        ))),
        _ => Err(anyhow!(
            "update mode needs both <extracted_folder_path> and <backup_path>"
        )),
    }
}

pub(crate) fn run_cli(cli: Cli) -> i32 {
    let log = match UpdateLog::open(&cli.log_file) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("Failed to initialize logger: {err:#}");
            return EXIT_FAILURE;
        }
    };
    let _log_guard = log.install();

    log_startup(&cli);

    let mode = match resolve_mode(&cli) {
        Ok(mode) => mode,
        Err(err) => {
            log_error("invalid arguments", format!("{err:#}"));
            eprintln!("error: {err:#}");
            return EXIT_FAILURE;
        }
    };

    let probe = SystemProcessProbe;
    let launcher = SystemLauncher;
    let monitor = LivenessMonitor::new(&probe, Duration::from_millis(cli.poll_interval_ms));
    let mut orchestrator =
        UpdateOrchestrator::new(monitor, &launcher).check_same_volume(!cli.allow_cross_volume);

    let outcome = run_mode(&mut orchestrator, &mode);
    info!(exit_code = outcome.exit_code(), "updater finished");
    outcome.exit_code()
}

pub(crate) fn run_mode(orchestrator: &mut UpdateOrchestrator<'_>, mode: &Mode) -> UpdateOutcome {
    match mode {
        Mode::Update(session) => orchestrator.run_update(session),
        Mode::Restart(session) => orchestrator.run_restart(session),
    }
}

fn log_startup(cli: &Cli) {
    info!("updater started (PID: {})", std::process::id());
    info!("parent PID: {}", cli.parent_pid);
    info!("app path: {}", cli.app_path.display());
    if let Some(extracted_folder) = &cli.extracted_folder {
        info!("extracted folder path: {}", extracted_folder.display());
    }
    if let Some(backup_path) = &cli.backup_path {
        info!("backup path: {}", backup_path.display());
    }
    if cli.allow_cross_volume {
        info!("same-volume check disabled");
    }
}
