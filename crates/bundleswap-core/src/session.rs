use std::path::{Path, PathBuf};

use crate::BundleName;

/// Inputs of one full update run. Lives exactly as long as the updater process
/// and is never written to disk: if the updater dies mid-run, the bundle left
/// at `backup_path` is the only trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSession {
    parent_pid: u32,
    app_path: PathBuf,
    update_source: PathBuf,
    backup_path: PathBuf,
}

impl UpdateSession {
    pub fn new(
        parent_pid: u32,
        app_path: impl Into<PathBuf>,
        update_source: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parent_pid,
            app_path: app_path.into(),
            update_source: update_source.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn parent_pid(&self) -> u32 {
        self.parent_pid
    }

    pub fn app_path(&self) -> &Path {
        &self.app_path
    }

    pub fn update_source(&self) -> &Path {
        &self.update_source
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn bundle_name(&self) -> Option<BundleName> {
        BundleName::from_app_path(&self.app_path)
    }

    pub fn source_bundle_path(&self) -> Option<PathBuf> {
        self.bundle_name()
            .map(|name| name.source_bundle_path(&self.update_source))
    }
}

/// Inputs of a restart-only run: wait for the parent, then relaunch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartSession {
    parent_pid: u32,
    app_path: PathBuf,
}

impl RestartSession {
    pub fn new(parent_pid: u32, app_path: impl Into<PathBuf>) -> Self {
        Self {
            parent_pid,
            app_path: app_path.into(),
        }
    }

    pub fn parent_pid(&self) -> u32 {
        self.parent_pid
    }

    pub fn app_path(&self) -> &Path {
        &self.app_path
    }
}
