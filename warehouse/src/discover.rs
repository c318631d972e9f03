//! Data file discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, Result};

/// Extension of song and log data files.
pub const DATA_EXTENSION: &str = "json";

/// Recursively collect files ending in `.{extension}` under `root`.
///
/// Paths are absolute and come back in directory-traversal order, which is
/// not sorted and may differ between filesystems. Hidden files are skipped,
/// as a shell `*.json` glob would skip them.
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let root = root.canonicalize().map_err(|e| Error::fs(root, e))?;
    if !root.is_dir() {
        return Err(Error::fs(
            &root,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
