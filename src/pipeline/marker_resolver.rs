use std::collections::HashMap;

use anyhow::Result;
use tracing::trace;

use crate::storage::Storage;
use crate::types::marker::{decode_copied_marker, decode_deletion_marker};
use crate::types::{BlockId, BlockMarkers, DELIMITER, MARKERS_PATHNAME};

/// Lists `<tenant>/markers/` in the source bucket and folds every marker found there
/// into per-block state. Blocks without any marker are absent from the map.
pub async fn resolve_markers(
    source: &Storage,
    tenant: &str,
    target_bucket: &str,
) -> Result<HashMap<BlockId, BlockMarkers>> {
    let markers_prefix = format!("{tenant}{DELIMITER}{MARKERS_PATHNAME}");
    let entries = source.list_prefix(&markers_prefix, false).await?;

    let markers = fold_markers(&entries, target_bucket);

    trace!(
        tenant = tenant,
        markers = entries.len(),
        blocks = markers.len(),
        "block markers have been resolved."
    );
    Ok(markers)
}

/// A copied marker counts only when it names `target_bucket` exactly. Names that
/// match neither marker shape are ignored.
pub fn fold_markers(names: &[String], target_bucket: &str) -> HashMap<BlockId, BlockMarkers> {
    let mut markers: HashMap<BlockId, BlockMarkers> = HashMap::new();

    for name in names {
        if let Some(block_id) = decode_deletion_marker(name) {
            markers.entry(block_id).or_default().deletion = true;
        }

        if let Some((block_id, _)) =
            decode_copied_marker(name).filter(|(_, bucket)| bucket == target_bucket)
        {
            markers.entry(block_id).or_default().copied = true;
        }
    }

    markers
}
