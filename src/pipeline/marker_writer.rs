use anyhow::{Context, Result};
use tracing::debug;

use crate::storage::Storage;
use crate::types::error::BlocksCopyError;
use crate::types::marker::encode_copied_marker;
use crate::types::{BlockId, DELIMITER};

/// Records that the block has been copied to `target_bucket` by writing an empty
/// marker object next to the block in the source bucket. Returns the marker path.
pub async fn write_copied_marker(
    source: &Storage,
    tenant: &str,
    block_id: &BlockId,
    target_bucket: &str,
) -> Result<String> {
    let path = format!(
        "{tenant}{DELIMITER}{}",
        encode_copied_marker(block_id, target_bucket)
    );

    source
        .put_object(&path, vec![])
        .await
        .context(BlocksCopyError::MarkerWriteError { path: path.clone() })?;

    debug!(
        tenant = tenant,
        block = block_id.to_string(),
        marker = path.as_str(),
        "copied marker written."
    );

    Ok(path)
}
