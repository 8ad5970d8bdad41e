//! Locating optional test data and creating scratch directories.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Search for a test data file.
///
/// Checked in order:
/// 1. `$TEST_DATA_DIR/<name>`
/// 2. `crates/grib2-parser/testdata/<name>`
/// 3. `testdata/<name>` at the workspace root
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.push(root.join("crates/grib2-parser/testdata").join(name));
    candidates.push(root.join("testdata").join(name));

    candidates.into_iter().find(|path| path.exists())
}

/// A scratch directory removed when the guard is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("mslp-test-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
