use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::SessionStoreError;

/// Reads a UTF-8 file, treating any failure (missing, unreadable, not UTF-8) as absent.
#[must_use]
pub fn read_text(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

pub fn ensure_dir(dir: &Path) -> Result<(), SessionStoreError> {
    fs::create_dir_all(dir).map_err(|source| SessionStoreError::io("creating directory", dir, source))
}

pub fn write_text(path: &Path, content: &str) -> Result<(), SessionStoreError> {
    ensure_parent(path)?;
    fs::write(path, content).map_err(|source| SessionStoreError::io("writing file", path, source))
}

pub fn append_text(path: &Path, content: &str) -> Result<(), SessionStoreError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SessionStoreError::io("opening file for append", path, source))?;
    file.write_all(content.as_bytes())
        .map_err(|source| SessionStoreError::io("appending to file", path, source))
}

fn ensure_parent(path: &Path) -> Result<(), SessionStoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
