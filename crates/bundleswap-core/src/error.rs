use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOperation {
    Rename { to: PathBuf },
    RemoveAll,
    CreateDirAll,
    Inspect,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename { to } => write!(f, "rename to {}", to.display()),
            Self::RemoveAll => f.write_str("remove"),
            Self::CreateDirAll => f.write_str("create directory"),
            Self::Inspect => f.write_str("inspect"),
        }
    }
}

/// Every way a step of an update session can fail.
///
/// Steps never recover from these on their own; the orchestrator decides
/// whether a failure means relaunch-only or a full rollback.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("{what} does not exist: {}", path.display())]
    PreconditionMissing { what: &'static str, path: PathBuf },

    #[error("failed to {operation} ({}): {source}", path.display())]
    FilesystemOperation {
        operation: FsOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{what} verification failed: {} is missing after the operation", path.display())]
    PostconditionViolation { what: &'static str, path: PathBuf },

    #[error("failed to query process {pid}: {detail}")]
    MonitoringFailure { pid: u32, detail: String },

    #[error("unexpected fault during update: {detail}")]
    UncaughtFault { detail: String },

    #[error(
        "{} and {} are on different volumes; an atomic rename between them is impossible",
        first.display(),
        second.display()
    )]
    VolumeMismatch { first: PathBuf, second: PathBuf },

    #[error("{first_role} {} and {second_role} {} overlap", first.display(), second.display())]
    PathOverlap {
        first_role: &'static str,
        first: PathBuf,
        second_role: &'static str,
        second: PathBuf,
    },
}

impl UpdateError {
    pub fn filesystem(operation: FsOperation, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FilesystemOperation {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Stable token used in log lines (`reason=...`).
    pub fn reason(&self) -> &'static str {
        match self {
            Self::PreconditionMissing { .. } => "precondition_missing",
            Self::FilesystemOperation { .. } => "filesystem_operation_failure",
            Self::PostconditionViolation { .. } => "postcondition_violation",
            Self::MonitoringFailure { .. } => "monitoring_failure",
            Self::UncaughtFault { .. } => "uncaught_fault",
            Self::VolumeMismatch { .. } => "volume_mismatch",
            Self::PathOverlap { .. } => "path_overlap",
        }
    }
}
