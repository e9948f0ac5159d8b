use std::path::Path;

use bundleswap_core::UpdateError;
use tracing::{info, warn};

use crate::fs_utils::{ensure_parent_dir, path_is_occupied, remove_existing, rename_checked};

/// Displaces the installed bundle into the backup slot.
///
/// A leftover slot from an earlier crashed run is deleted first; it is never
/// merged with the current bundle. Both paths must live on one volume for the
/// rename to be atomic.
pub fn move_to_backup(app_path: &Path, backup_path: &Path) -> Result<(), UpdateError> {
    info!("starting backup (rename) of current app");

    if !app_path.exists() {
        return Err(UpdateError::PreconditionMissing {
            what: "installed app",
            path: app_path.to_path_buf(),
        });
    }

    if path_is_occupied(backup_path) {
        info!(path = %backup_path.display(), "removing existing backup");
        remove_existing(backup_path)?;
    }

    ensure_parent_dir(backup_path)?;

    info!("moving app to backup location");
    rename_checked(app_path, backup_path, "backup")?;

    info!(path = %backup_path.display(), "backup completed (renamed)");
    Ok(())
}

/// Puts the backup slot back at the install path, discarding any partial
/// bundle a failed install left behind.
pub fn restore_from_backup(app_path: &Path, backup_path: &Path) -> Result<(), UpdateError> {
    info!("rolling back from backup");

    if !backup_path.exists() {
        return Err(UpdateError::PreconditionMissing {
            what: "backup",
            path: backup_path.to_path_buf(),
        });
    }

    if path_is_occupied(app_path) {
        info!(path = %app_path.display(), "removing failed app");
        remove_existing(app_path)?;
    }

    rename_checked(backup_path, app_path, "rollback")?;

    info!(path = %app_path.display(), "rollback completed");
    Ok(())
}

/// Drops the backup slot after a successful update. A missing slot is not an
/// error.
pub fn delete_backup(backup_path: &Path) -> Result<(), UpdateError> {
    info!("deleting backup");
    if remove_existing(backup_path)? {
        info!(path = %backup_path.display(), "backup deleted");
    } else {
        warn!(path = %backup_path.display(), "no backup to delete");
    }
    Ok(())
}

/// Removes the extraction directory. Runs on every terminal path of an
/// update, successful or not.
pub fn cleanup_update_source(update_source: &Path) -> Result<(), UpdateError> {
    info!(path = %update_source.display(), "cleaning up extracted directory");
    if remove_existing(update_source)? {
        info!("extracted directory deleted");
    }
    Ok(())
}
