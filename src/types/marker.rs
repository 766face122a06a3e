//! Filename codec for block markers.
//!
//! Markers are zero-length objects stored under `<tenant>/markers/`. The fact they
//! record is packed into the filename:
//!
//! - deletion marker: `<blockID>-deletion-mark.json`
//! - copied marker: `<blockID>-copied-<targetBucket>`
//!
//! A bucket name is embedded verbatim. A `-` inside it is unambiguous because the
//! filename is split into at most three parts, but a `/` would turn the marker into a
//! nested path, so such bucket names are rejected when the configuration is built.

use crate::types::{BlockId, DELIMITER, MARKERS_PATHNAME};

pub const COPIED_MARK_NAME: &str = "copied";
pub const DELETION_MARK_NAME: &str = "deletion-mark.json";

const SEPARATOR: char = '-';

/// Path of the copied marker, relative to the tenant prefix.
/// e.g. `markers/01EZED0X3YZMNJ3NHGMJJKMHCR-copied-target-bucket`
pub fn encode_copied_marker(block_id: &BlockId, target_bucket: &str) -> String {
    let name = format!("{block_id}{SEPARATOR}{COPIED_MARK_NAME}{SEPARATOR}{target_bucket}");
    format!("{MARKERS_PATHNAME}{DELIMITER}{name}")
}

/// Returns the block ID and the target bucket if `name` is a copied marker.
/// `name` may be a bare filename or a path ending with one.
pub fn decode_copied_marker(name: &str) -> Option<(BlockId, String)> {
    let parts = name.splitn(3, SEPARATOR).collect::<Vec<&str>>();
    if parts.len() != 3 {
        return None;
    }

    if parts[1] != COPIED_MARK_NAME {
        return None;
    }

    let block_id = BlockId::from_string(base_name(parts[0])).ok()?;

    Some((block_id, parts[2].to_string()))
}

/// Path of the deletion marker, relative to the tenant prefix.
pub fn encode_deletion_marker(block_id: &BlockId) -> String {
    format!("{MARKERS_PATHNAME}{DELIMITER}{block_id}{SEPARATOR}{DELETION_MARK_NAME}")
}

pub fn decode_deletion_marker(name: &str) -> Option<BlockId> {
    let parts = name.splitn(2, SEPARATOR).collect::<Vec<&str>>();
    if parts.len() != 2 || parts[1] != DELETION_MARK_NAME {
        return None;
    }

    BlockId::from_string(base_name(parts[0])).ok()
}

fn base_name(path: &str) -> &str {
    path.rsplit(DELIMITER).next().unwrap_or(path)
}
