use super::*;
use std::sync::atomic::{AtomicU64, Ordering};

use bundleswap_core::{FsOperation, UpdateError};
use std::fs;
use std::path::{Path, PathBuf};

static TEST_ROOT_COUNTER: AtomicU64 = AtomicU64::new(0);

#[test]
fn move_to_backup_renames_app_into_backup_slot() {
    let root = test_root();
    let app = root.join("Applications").join("Foo.app");
    let backup = root.join("state").join("Foo.app.backup");
    seed_bundle(&app, "1.0.0");

    move_to_backup(&app, &backup).expect("must move to backup");

    assert!(!app.exists());
    assert_eq!(read_version(&backup), "1.0.0");
    assert!(backup.join("Contents").join("MacOS").join("Foo").exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn move_to_backup_fails_when_app_is_missing() {
    let root = test_root();
    let app = root.join("Foo.app");
    let backup = root.join("Foo.app.backup");

    let err = move_to_backup(&app, &backup).expect_err("missing app must fail");
    assert!(matches!(err, UpdateError::PreconditionMissing { .. }));
    assert!(!backup.exists(), "no backup slot may be created");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn move_to_backup_replaces_stale_backup_instead_of_merging() {
    let root = test_root();
    let app = root.join("Foo.app");
    let backup = root.join("Foo.app.backup");
    seed_bundle(&app, "1.0.0");
    fs::create_dir_all(backup.join("unrelated")).expect("must seed stale backup");
    fs::write(backup.join("unrelated").join("leftover.txt"), "stale").expect("must write");

    move_to_backup(&app, &backup).expect("must move to backup");

    assert!(!backup.join("unrelated").exists(), "stale content must be gone");
    assert_eq!(read_version(&backup), "1.0.0");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn move_to_backup_replaces_stale_backup_file() {
    let root = test_root();
    let app = root.join("Foo.app");
    let backup = root.join("Foo.app.backup");
    seed_bundle(&app, "1.0.0");
    fs::write(&backup, "not a bundle").expect("must seed stale file");

    move_to_backup(&app, &backup).expect("must move to backup");
    assert_eq!(read_version(&backup), "1.0.0");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn backup_then_restore_round_trips_original_bundle() {
    let root = test_root();
    let app = root.join("Foo.app");
    let backup = root.join("backups").join("Foo.app.backup");
    seed_bundle(&app, "1.0.0");

    move_to_backup(&app, &backup).expect("must move to backup");
    restore_from_backup(&app, &backup).expect("must restore");

    assert_eq!(read_version(&app), "1.0.0");
    assert!(!backup.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn restore_from_backup_discards_partial_install() {
    let root = test_root();
    let app = root.join("Foo.app");
    let backup = root.join("Foo.app.backup");
    seed_bundle(&backup, "1.0.0");
    seed_bundle(&app, "2.0.0-partial");

    restore_from_backup(&app, &backup).expect("must restore");

    assert_eq!(read_version(&app), "1.0.0");
    assert!(!backup.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn restore_from_backup_fails_without_backup_and_leaves_app_alone() {
    let root = test_root();
    let app = root.join("Foo.app");
    let backup = root.join("Foo.app.backup");
    seed_bundle(&app, "2.0.0");

    let err = restore_from_backup(&app, &backup).expect_err("missing backup must fail");
    assert!(matches!(err, UpdateError::PreconditionMissing { what: "backup", .. }));
    assert_eq!(read_version(&app), "2.0.0");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn delete_backup_and_cleanup_are_noops_on_missing_paths() {
    let root = test_root();
    let backup = root.join("missing-backup");
    let source = root.join("missing-extracted");

    delete_backup(&backup).expect("missing backup is not an error");
    delete_backup(&backup).expect("second call is still not an error");
    cleanup_update_source(&source).expect("missing source is not an error");
    cleanup_update_source(&source).expect("second call is still not an error");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn delete_backup_removes_backup_tree() {
    let root = test_root();
    let backup = root.join("Foo.app.backup");
    seed_bundle(&backup, "1.0.0");

    delete_backup(&backup).expect("must delete backup");
    assert!(!backup.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cleanup_update_source_removes_extraction_directory() {
    let root = test_root();
    let source = root.join("extracted");
    seed_bundle(&source.join("Foo.app"), "2.0.0");

    cleanup_update_source(&source).expect("must clean up");
    assert!(!source.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn install_bundle_moves_source_into_vacated_install_path() {
    let root = test_root();
    let source = root.join("extracted").join("Foo.app");
    let app = root.join("Foo.app");
    seed_bundle(&source, "2.0.0");

    install_bundle(&source, &app).expect("must install");

    assert!(!source.exists());
    assert_eq!(read_version(&app), "2.0.0");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn install_bundle_fails_when_source_missing() {
    let root = test_root();
    let source = root.join("extracted").join("Foo.app");
    let app = root.join("Foo.app");

    let err = install_bundle(&source, &app).expect_err("missing source must fail");
    assert!(matches!(
        err,
        UpdateError::PreconditionMissing {
            what: "update app",
            ..
        }
    ));
    assert!(!app.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn remove_path_if_exists_reports_whether_anything_was_removed() {
    let root = test_root();
    let file = root.join("marker");
    fs::write(&file, "x").expect("must write");

    assert!(remove_path_if_exists(&file).expect("must remove"));
    assert!(!remove_path_if_exists(&file).expect("must be noop"));
    assert!(!path_is_occupied(&file));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn ensure_same_volume_accepts_paths_under_one_root() {
    let root = test_root();
    let app = root.join("Foo.app");
    seed_bundle(&app, "1.0.0");
    let backup = root.join("not").join("yet").join("Foo.app.backup");
    let source = root.join("extracted");

    ensure_same_volume(&[app.as_path(), backup.as_path(), source.as_path()])
        .expect("same root must pass");

    let _ = fs::remove_dir_all(&root);
}

#[cfg(target_os = "linux")]
#[test]
fn ensure_same_volume_rejects_paths_on_different_filesystems() {
    let root = test_root();
    let err = ensure_same_volume(&[root.as_path(), Path::new("/proc/self")])
        .expect_err("procfs never shares a device with temp dirs");
    assert_eq!(err.reason(), "volume_mismatch");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn move_to_backup_reports_rename_failure_and_keeps_app() {
    let root = test_root();
    let app = root.join("Foo.app");
    seed_bundle(&app, "1.0.0");
    let backup = app.join("Contents").join("Foo.app.backup");

    let err = move_to_backup(&app, &backup).expect_err("a bundle cannot move into itself");
    assert!(matches!(
        err,
        UpdateError::FilesystemOperation {
            operation: FsOperation::Rename { .. },
            ..
        }
    ));
    assert_eq!(read_version(&app), "1.0.0");
    assert!(!backup.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn ensure_disjoint_paths_accepts_sibling_locations() {
    ensure_disjoint_paths(&[
        ("app path", Path::new("/Applications/Foo.app")),
        ("extracted folder", Path::new("/tmp/update/extracted")),
        ("backup path", Path::new("/tmp/update/Foo.app.backup")),
    ])
    .expect("siblings never overlap");

    ensure_disjoint_paths(&[
        ("app path", Path::new("/Applications/Foo.app")),
        ("backup path", Path::new("/Applications/Foo.app.backup")),
    ])
    .expect("a shared name prefix is not nesting");
}

#[test]
fn ensure_disjoint_paths_rejects_equal_and_nested_locations() {
    let cases = [
        ("/Applications/Foo.app", "/Applications/Foo.app"),
        ("/Applications/Foo.app", "/Applications/Foo.app/Contents/backup"),
        ("/tmp/update/extracted", "/tmp/update/extracted/Foo.app.backup"),
        ("/Applications", "/Applications/Foo.app"),
        ("/tmp/update/./extracted", "/tmp/update/x/../extracted/Foo.app"),
    ];
    for (first, second) in cases {
        let paths = [("first", Path::new(first)), ("second", Path::new(second))];
        let err = ensure_disjoint_paths(&paths).expect_err("overlap must be rejected");
        assert_eq!(err.reason(), "path_overlap", "{first} vs {second}");
    }
}

#[test]
fn ensure_disjoint_paths_resolves_relative_paths_against_working_directory() {
    let cwd = std::env::current_dir().expect("must read working directory");
    let err = ensure_disjoint_paths(&[
        ("app path", Path::new("Foo.app")),
        ("backup path", cwd.join("Foo.app").as_path()),
    ])
    .expect_err("relative and absolute spellings of one path overlap");
    assert_eq!(err.reason(), "path_overlap");
}

#[test]
fn test_root_paths_are_unique_per_call() {
    assert_ne!(build_test_root_path(42), build_test_root_path(42));
}

fn seed_bundle(path: &Path, version: &str) {
    let macos = path.join("Contents").join("MacOS");
    fs::create_dir_all(&macos).expect("must create bundle dirs");
    fs::write(macos.join("Foo"), "#!/bin/sh\n").expect("must write executable");
    fs::write(path.join("Contents").join("version.txt"), version).expect("must write version");
}

fn read_version(path: &Path) -> String {
    fs::read_to_string(path.join("Contents").join("version.txt")).expect("must read version")
}

fn build_test_root_path(nanos: u128) -> PathBuf {
    let mut path = std::env::temp_dir();
    let sequence = TEST_ROOT_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!(
        "bundleswap-installer-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        sequence
    ));
    path
}

fn test_root() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let root = build_test_root_path(nanos);
    fs::create_dir_all(&root).expect("must create test root");
    root
}
