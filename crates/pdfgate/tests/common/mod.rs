#![allow(dead_code)]

use std::path::PathBuf;

/// PDF fixtures live with the core crate and are shared by every crate's tests.
pub fn fixture(name: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../pdfgate-core/tests/fixtures")
        .join(name);
    assert!(path.exists(), "Test fixture not found: {}", path.display());
    path
}
