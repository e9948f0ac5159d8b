use std::backtrace::Backtrace;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The updater's single log sink.
///
/// Every clone shares one file handle behind one mutex; each formatted event
/// is written, flushed and synced while the lock is held, so lines from
/// different components never interleave. The file closes when the last clone
/// drops.
#[derive(Clone)]
pub(crate) struct UpdateLog {
    file: Arc<Mutex<File>>,
}

impl UpdateLog {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file: {}", path.display()))?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Routes this thread's `tracing` events into the log until the guard
    /// drops.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_target(false)
            .with_timer(LocalTimestamp)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for UpdateLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        io::Write::write_all(&mut *file, buf)?;
        io::Write::flush(&mut *file)?;
        file.sync_data()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        io::Write::flush(&mut *file)
    }
}

impl<'a> MakeWriter<'a> for UpdateLog {
    type Writer = UpdateLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", chrono::Local::now().format(TIMESTAMP_FORMAT))
    }
}

/// Logs a failure with its message and the call stack that reported it.
pub(crate) fn log_error(context: &str, err: impl fmt::Display) {
    let backtrace = Backtrace::force_capture();
    tracing::error!("{context}: ERROR={err}\nSTACKTRACE={backtrace}");
}
