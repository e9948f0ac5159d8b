use std::path::Path;

use bundleswap_core::UpdateError;
use tracing::info;

use crate::fs_utils::rename_checked;

/// Moves the extracted bundle into the install path. The caller has already
/// vacated `install_path` through [`crate::move_to_backup`], so the rename
/// never overwrites a live bundle.
pub fn install_bundle(source_bundle: &Path, install_path: &Path) -> Result<(), UpdateError> {
    info!(
        from = %source_bundle.display(),
        to = %install_path.display(),
        "installing new app"
    );

    if !source_bundle.exists() {
        return Err(UpdateError::PreconditionMissing {
            what: "update app",
            path: source_bundle.to_path_buf(),
        });
    }

    rename_checked(source_bundle, install_path, "install")?;

    info!("new app installed");
    Ok(())
}
