mod backup;
mod fs_utils;
mod install;
mod overlap;
mod volume;

pub use backup::{cleanup_update_source, delete_backup, move_to_backup, restore_from_backup};
pub use fs_utils::{path_is_occupied, remove_path_if_exists};
pub use install::install_bundle;
pub use overlap::ensure_disjoint_paths;
pub use volume::ensure_same_volume;

#[cfg(test)]
mod tests;
