use std::fs;
use std::io;
use std::path::Path;

use bundleswap_core::{FsOperation, UpdateError};

/// True when anything (file, directory or dangling symlink) occupies `path`.
pub fn path_is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Removes whatever occupies `path`. Returns `false` when nothing was there.
pub fn remove_path_if_exists(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}

pub(crate) fn remove_existing(path: &Path) -> Result<bool, UpdateError> {
    remove_path_if_exists(path)
        .map_err(|source| UpdateError::filesystem(FsOperation::RemoveAll, path, source))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), UpdateError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|source| UpdateError::filesystem(FsOperation::CreateDirAll, parent, source)),
        _ => Ok(()),
    }
}

pub(crate) fn rename_checked(
    from: &Path,
    to: &Path,
    what: &'static str,
) -> Result<(), UpdateError> {
    fs::rename(from, to).map_err(|source| {
        UpdateError::filesystem(
            FsOperation::Rename {
                to: to.to_path_buf(),
            },
            from,
            source,
        )
    })?;

    if !to.exists() {
        return Err(UpdateError::PostconditionViolation {
            what,
            path: to.to_path_buf(),
        });
    }
    Ok(())
}
