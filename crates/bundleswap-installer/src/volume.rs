use std::path::Path;

use bundleswap_core::UpdateError;

/// Fails when the given locations sit on different filesystems. Paths that do
/// not exist yet are judged by their nearest existing ancestor; paths with no
/// existing ancestor at all are skipped.
pub fn ensure_same_volume(paths: &[&Path]) -> Result<(), UpdateError> {
    let mut first: Option<(&Path, u64)> = None;
    for &path in paths {
        let Some(anchor) = nearest_existing_ancestor(path) else {
            continue;
        };
        let Some(device) = device_id(anchor)? else {
            continue;
        };
        match first {
            None => first = Some((path, device)),
            Some((first_path, first_device)) if first_device != device => {
                return Err(UpdateError::VolumeMismatch {
                    first: first_path.to_path_buf(),
                    second: path.to_path_buf(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn nearest_existing_ancestor(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|candidate| !candidate.as_os_str().is_empty() && candidate.exists())
}

#[cfg(unix)]
fn device_id(path: &Path) -> Result<Option<u64>, UpdateError> {
    use bundleswap_core::FsOperation;
    use std::os::unix::fs::MetadataExt;

    let metadata = std::fs::metadata(path)
        .map_err(|source| UpdateError::filesystem(FsOperation::Inspect, path, source))?;
    Ok(Some(metadata.dev()))
}

#[cfg(not(unix))]
fn device_id(_path: &Path) -> Result<Option<u64>, UpdateError> {
    Ok(None)
}
