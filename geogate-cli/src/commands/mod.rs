pub mod features;
pub mod layer;
pub mod legend;
pub mod map;

use anyhow::{Context, Result};
use std::path::Path;

/// Write a fetched payload to `path` and report where it went.
pub fn write_output(path: &Path, bytes: &[u8], content_type: &str) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "Saved {} ({}, {} bytes)",
        path.display(),
        content_type,
        bytes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.png");

        write_output(&path, b"\x89PNG", "image/png").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_write_output_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("map.png");

        let err = write_output(&path, b"", "image/png").unwrap_err();
        assert!(err.to_string().contains("Failed to write"));
    }
}
