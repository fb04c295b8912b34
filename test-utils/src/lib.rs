//! Shared test utilities for the dasterix workspace.
//!
//! This crate provides common helpers for loading category specification
//! fixtures and building byte streams from hex dumps.

use std::fs;
use std::path::PathBuf;

/// Returns the path to the workspace-level testdata directory.
///
/// This resolves the path relative to the workspace root, not the individual
/// crate.
pub fn testdata_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR points to the crate using this library,
    // so we need to find the workspace root by looking for testdata/
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    // Try common paths to find testdata
    let candidates = [
        manifest_dir.join("../testdata"),    // From test-utils itself
        manifest_dir.join("../../testdata"), // From sub-crates
        manifest_dir.join("testdata"),       // From workspace root
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.canonicalize().unwrap_or_else(|_| candidate.clone());
        }
    }

    // Fallback - return the most likely path
    manifest_dir.join("../testdata")
}

/// Returns the path to a fixture file.
///
/// # Arguments
///
/// * `category` - "valid" or "invalid"
/// * `filename` - Name of the XML file (e.g., "cat048.xml")
pub fn fixture_path(category: &str, filename: &str) -> PathBuf {
    testdata_dir().join(category).join(filename)
}

/// Loads an XML fixture file from the testdata directory.
///
/// # Arguments
///
/// * `category` - "valid" or "invalid"
/// * `filename` - Name of the XML file (e.g., "cat048.xml")
///
/// # Panics
///
/// Panics if the file cannot be read.
pub fn load_fixture(category: &str, filename: &str) -> String {
    let path = fixture_path(category, filename);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Builds a byte vector from a whitespace-separated hex dump.
///
/// Accepts the layout used in decode tests, e.g.
/// `"30 0011 FF02 0877"` - spaces and newlines are ignored.
///
/// # Panics
///
/// Panics on non-hex input; fixtures are static test data.
pub fn bytes_from_hex(dump: &str) -> Vec<u8> {
    let compact: String = dump.split_whitespace().collect();
    hex::decode(&compact)
        .unwrap_or_else(|e| panic!("Failed to parse hex dump {compact:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_ignores_whitespace() {
        assert_eq!(
            bytes_from_hex("30 00 06\n80 08 77"),
            vec![0x30, 0x00, 0x06, 0x80, 0x08, 0x77]
        );
    }

    #[test]
    fn hex_dump_accepts_grouped_bytes() {
        assert_eq!(bytes_from_hex("0011 FF02"), vec![0x00, 0x11, 0xFF, 0x02]);
    }

    #[test]
    #[should_panic(expected = "Failed to parse hex dump")]
    fn hex_dump_rejects_garbage() {
        bytes_from_hex("zz");
    }
}
