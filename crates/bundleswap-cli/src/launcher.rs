use std::path::Path;
use std::process::{Command, Stdio};

use bundleswap_core::BundleName;
use tracing::info;

use crate::logging::log_error;

/// Starts an installed app as an independent process.
pub(crate) trait Launcher {
    fn launch(&self, app_path: &Path);
}

/// Fire-and-forget launcher: the child is spawned detached from our stdio and
/// never awaited. A failure to start is logged and otherwise ignored.
pub(crate) struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, app_path: &Path) {
        let app_name = launch_display_name(app_path);
        info!(
            "launching app: {} (app name: {app_name})",
            app_path.display()
        );

        let mut command = build_launch_command(app_path, &app_name);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match command.spawn() {
            Ok(_) => info!("app \"{app_name}\" launched"),
            Err(err) => log_error(&format!("failed to launch {}", app_path.display()), err),
        }
    }
}

pub(crate) fn launch_display_name(app_path: &Path) -> String {
    BundleName::from_app_path(app_path)
        .map(|name| name.stem().to_string())
        .unwrap_or_else(|| app_path.display().to_string())
}

#[cfg(target_os = "macos")]
pub(crate) fn build_launch_command(_app_path: &Path, app_name: &str) -> Command {
    let mut command = Command::new("open");
    command.arg("-a").arg(app_name);
    command
}

#[cfg(windows)]
pub(crate) fn build_launch_command(app_path: &Path, _app_name: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg("start").arg("").arg(app_path);
    command
}

#[cfg(not(any(target_os = "macos", windows)))]
pub(crate) fn build_launch_command(app_path: &Path, _app_name: &str) -> Command {
    Command::new(app_path)
}
