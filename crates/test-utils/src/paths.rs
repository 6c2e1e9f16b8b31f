//! Scratch locations for downloaded payloads.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Fresh scratch directory, removed on drop.
pub fn temp_test_dir() -> TempDir {
    temp_test_dir_with_prefix("ogc-fetch-")
}

/// Fresh scratch directory whose name starts with `prefix`.
pub fn temp_test_dir_with_prefix(prefix: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .unwrap_or_else(|e| panic!("cannot create scratch directory: {}", e))
}

/// `relative` under `dir`; parent directories are not created, so savers
/// must create them.
pub fn nested_output(dir: &Path, relative: &str) -> PathBuf {
    relative.split('/').fold(dir.to_path_buf(), |path, part| path.join(part))
}
