use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::types::{DELIMITER, DELIMITER_STR};

const TEMP_FILE_PREFIX: &str = ".blockscopy-";

/// Maps an object path onto the directory that stands in for the bucket.
pub fn key_to_file_path(root: &Path, key: &str) -> PathBuf {
    key.split(DELIMITER)
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Inverse of [`key_to_file_path`] for a path relative to the bucket directory.
pub fn path_to_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(DELIMITER_STR)
}

pub fn create_temp_file(directory: &Path) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(directory)
        .context("tempfile::Builder::tempfile_in() failed.")
}

/// Files still being written are invisible to listings.
pub fn is_temp_file(file_name: &OsStr) -> bool {
    file_name.to_string_lossy().starts_with(TEMP_FILE_PREFIX)
}
