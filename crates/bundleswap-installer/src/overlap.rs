use std::env;
use std::path::{Component, Path, PathBuf};

use bundleswap_core::UpdateError;

/// Fails when any two of the named locations are equal or nest inside each
/// other. Deleting one of them (a stale backup, the extraction folder) must
/// never reach into another.
///
/// Paths are compared lexically after resolving them against the working
/// directory; symlinks are not followed.
pub fn ensure_disjoint_paths(paths: &[(&'static str, &Path)]) -> Result<(), UpdateError> {
    let resolved: Vec<(&'static str, &Path, PathBuf)> = paths
        .iter()
        .map(|&(role, path)| (role, path, lexical_absolute(path)))
        .collect();

    for (index, (first_role, first, first_abs)) in resolved.iter().enumerate() {
        for (second_role, second, second_abs) in &resolved[index + 1..] {
            if first_abs.starts_with(second_abs) || second_abs.starts_with(first_abs) {
                return Err(UpdateError::PathOverlap {
                    first_role: *first_role,
                    first: first.to_path_buf(),
                    second_role: *second_role,
                    second: second.to_path_buf(),
                });
            }
        }
    }
    Ok(())
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
