use std::path::Path;

use bundleswap_core::UpdateError;
use bundleswap_installer::{install_bundle, move_to_backup};

/// The two renames that make up a swap: the installed bundle into the backup
/// slot, then the extracted bundle into the vacated install path.
pub(crate) trait SwapSteps {
    fn back_up(&self, app_path: &Path, backup_path: &Path) -> Result<(), UpdateError>;
    fn install(&self, source_bundle: &Path, install_path: &Path) -> Result<(), UpdateError>;
}

pub(crate) struct FileSystemSwap;

impl SwapSteps for FileSystemSwap {
    fn back_up(&self, app_path: &Path, backup_path: &Path) -> Result<(), UpdateError> {
        move_to_backup(app_path, backup_path)
    }

    fn install(&self, source_bundle: &Path, install_path: &Path) -> Result<(), UpdateError> {
        install_bundle(source_bundle, install_path)
    }
}
