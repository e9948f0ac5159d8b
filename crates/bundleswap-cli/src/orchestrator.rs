use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use bundleswap_core::{RestartSession, UpdateError, UpdateSession};
use bundleswap_installer::{
    cleanup_update_source, delete_backup, ensure_disjoint_paths, ensure_same_volume,
    path_is_occupied, restore_from_backup,
};
use tracing::info;

use crate::launcher::Launcher;
use crate::liveness::LivenessMonitor;
use crate::logging::log_error;
use crate::swap::{FileSystemSwap, SwapSteps};

pub(crate) const EXIT_SUCCESS: i32 = 0;
pub(crate) const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateState {
    Start,
    AwaitingParentExit,
    BackingUp,
    VerifyingSource,
    Installing,
    Finalizing,
    RollingBack,
    Relaunch,
}

impl UpdateState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AwaitingParentExit => "awaiting_parent_exit",
            Self::BackingUp => "backing_up",
            Self::VerifyingSource => "verifying_source",
            Self::Installing => "installing",
            Self::Finalizing => "finalizing",
            Self::RollingBack => "rolling_back",
            Self::Relaunch => "relaunch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateOutcome {
    Success,
    Failure,
}

impl UpdateOutcome {
    pub(crate) fn exit_code(self) -> i32 {
        match self {
            Self::Success => EXIT_SUCCESS,
            Self::Failure => EXIT_FAILURE,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StepFailure {
    pub(crate) state: UpdateState,
    pub(crate) error: UpdateError,
}

impl StepFailure {
    fn new(state: UpdateState, error: UpdateError) -> Self {
        Self { state, error }
    }
}

/// Runs one update session from parent exit to a terminal state.
///
/// Whatever happens after the parent exits, the run ends with an app at the
/// install path being relaunched: the new bundle on success, otherwise the
/// original one restored from the backup slot.
pub(crate) struct UpdateOrchestrator<'a> {
    monitor: LivenessMonitor<'a>,
    launcher: &'a dyn Launcher,
    steps: &'a dyn SwapSteps,
    check_same_volume: bool,
}

impl<'a> UpdateOrchestrator<'a> {
    pub(crate) fn new(monitor: LivenessMonitor<'a>, launcher: &'a dyn Launcher) -> Self {
        Self {
            monitor,
            launcher,
            steps: &FileSystemSwap,
            check_same_volume: true,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_steps(mut self, steps: &'a dyn SwapSteps) -> Self {
        self.steps = steps;
        self
    }

    pub(crate) fn check_same_volume(mut self, enabled: bool) -> Self {
        self.check_same_volume = enabled;
        self
    }

    pub(crate) fn run_update(&mut self, session: &UpdateSession) -> UpdateOutcome {
        enter(UpdateState::Start);
        self.await_parent_exit(session.parent_pid());

        // Cleanup and stale-backup removal delete whole trees. Nested paths
        // are refused before anything is touched.
        if let Err(err) = ensure_disjoint_paths(&session_paths(session)) {
            log_error(&format!("update refused (reason={})", err.reason()), err);
            enter(UpdateState::Relaunch);
            self.launcher.launch(session.app_path());
            return UpdateOutcome::Failure;
        }

        let mut state = UpdateState::AwaitingParentExit;
        let applied = panic::catch_unwind(AssertUnwindSafe(|| self.apply(session, &mut state)));

        match applied {
            Ok(Ok(())) => self.finalize(session),
            Ok(Err(failure)) => self.recover(session, failure),
            Err(payload) => {
                let failure = StepFailure::new(
                    state,
                    UpdateError::UncaughtFault {
                        detail: panic_detail(payload.as_ref()),
                    },
                );
                self.recover(session, failure)
            }
        }
    }

    pub(crate) fn run_restart(&mut self, session: &RestartSession) -> UpdateOutcome {
        enter(UpdateState::Start);
        self.await_parent_exit(session.parent_pid());

        enter(UpdateState::Relaunch);
        if !session.app_path().exists() {
            log_error(
                "restart aborted",
                UpdateError::PreconditionMissing {
                    what: "installed app",
                    path: session.app_path().to_path_buf(),
                },
            );
            return UpdateOutcome::Failure;
        }

        self.launcher.launch(session.app_path());
        info!("restart exiting");
        UpdateOutcome::Success
    }

    /// Monitoring problems never block the update; an unobservable parent is
    /// assumed gone.
    fn await_parent_exit(&mut self, parent_pid: u32) {
        enter(UpdateState::AwaitingParentExit);
        let monitor = &mut self.monitor;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.wait_for_exit(parent_pid);
        })) {
            log_error(
                "parent process monitoring failed, continuing",
                UpdateError::MonitoringFailure {
                    pid: parent_pid,
                    detail: panic_detail(payload.as_ref()),
                },
            );
        }
    }

    fn apply(&self, session: &UpdateSession, state: &mut UpdateState) -> Result<(), StepFailure> {
        let app_path = session.app_path();

        *state = enter(UpdateState::BackingUp);
        if self.check_same_volume {
            ensure_same_volume(&[app_path, session.backup_path(), session.update_source()])
                .map_err(|err| StepFailure::new(*state, err))?;
        }
        self.steps
            .back_up(app_path, session.backup_path())
            .map_err(|err| StepFailure::new(*state, err))?;

        *state = enter(UpdateState::VerifyingSource);
        let source_bundle = session
            .source_bundle_path()
            .filter(|path| path.exists())
            .ok_or_else(|| {
                StepFailure::new(
                    UpdateState::VerifyingSource,
                    UpdateError::PreconditionMissing {
                        what: "extracted app",
                        path: session
                            .source_bundle_path()
                            .unwrap_or_else(|| session.update_source().to_path_buf()),
                    },
                )
            })?;
        info!("extracted app verified: {}", source_bundle.display());

        *state = enter(UpdateState::Installing);
        self.steps
            .install(&source_bundle, app_path)
            .map_err(|err| StepFailure::new(*state, err))?;

        Ok(())
    }

    fn finalize(&self, session: &UpdateSession) -> UpdateOutcome {
        enter(UpdateState::Finalizing);
        info!("update successful!");

        if let Err(err) = cleanup_update_source(session.update_source()) {
            log_error(&format!("cleanup failed (reason={})", err.reason()), err);
        }
        if let Err(err) = delete_backup(session.backup_path()) {
            log_error(&format!("backup removal failed (reason={})", err.reason()), err);
        }

        self.launcher.launch(session.app_path());
        info!("updater exiting");
        UpdateOutcome::Success
    }

    /// Failure fallback shared by every failing step and by the fault
    /// boundary.
    pub(crate) fn recover(&self, session: &UpdateSession, failure: StepFailure) -> UpdateOutcome {
        log_error(
            &format!(
                "update failed in state {} (reason={})",
                failure.state.as_str(),
                failure.error.reason()
            ),
            &failure.error,
        );

        if let Err(err) = cleanup_update_source(session.update_source()) {
            log_error(&format!("cleanup failed (reason={})", err.reason()), err);
        }

        if needs_rollback(&failure, session.app_path()) {
            self.roll_back(session.app_path(), session.backup_path());
        } else {
            info!("original app was not moved, nothing to roll back");
        }

        enter(UpdateState::Relaunch);
        self.launcher.launch(session.app_path());
        info!("updater exiting after failure");
        UpdateOutcome::Failure
    }

    fn roll_back(&self, app_path: &Path, backup_path: &Path) {
        enter(UpdateState::RollingBack);
        if let Err(err) = restore_from_backup(app_path, backup_path) {
            log_error(&format!("rollback failed (reason={})", err.reason()), err);
        }
    }
}

/// A reported backup failure means the rename never happened, so whatever sits
/// in the backup slot is not ours to restore. A fault in the same state is
/// only rolled back once the install path has been vacated.
fn needs_rollback(failure: &StepFailure, app_path: &Path) -> bool {
    match failure.state {
        UpdateState::BackingUp => {
            matches!(failure.error, UpdateError::UncaughtFault { .. })
                && !path_is_occupied(app_path)
        }
        _ => true,
    }
}

pub(crate) fn session_paths(session: &UpdateSession) -> [(&'static str, &Path); 3] {
    [
        ("app path", session.app_path()),
        ("extracted folder", session.update_source()),
        ("backup path", session.backup_path()),
    ]
}

fn enter(state: UpdateState) -> UpdateState {
    info!(state = state.as_str(), "entering state");
    state
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}
