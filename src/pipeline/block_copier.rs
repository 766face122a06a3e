use anyhow::{Context, Result, anyhow};
use tracing::{debug, trace};

use crate::storage::Storage;
use crate::types::error::BlocksCopyError;
use crate::types::token::CopyCancellationToken;
use crate::types::{DELIMITER, META_FILENAME, SourceBlock};

pub struct BlockCopier {
    source: Storage,
    target: Storage,
    cancellation_token: CopyCancellationToken,
}

impl BlockCopier {
    pub fn new(
        source: Storage,
        target: Storage,
        cancellation_token: CopyCancellationToken,
    ) -> Self {
        Self {
            source,
            target,
            cancellation_token,
        }
    }

    /// Copies every object of the block to the same path in the target, `meta.json`
    /// last. Stops at the first failure and leaves already copied objects in place.
    /// Returns the number of objects copied. A block without objects is a copy error.
    pub async fn copy(&self, tenant: &str, source_block: &SourceBlock) -> Result<usize> {
        let block_prefix = source_block.prefix(tenant);
        let paths = order_meta_last(self.source.list_prefix(&block_prefix, true).await?);
        if paths.is_empty() {
            return Err(anyhow!("no objects found under {block_prefix}")).context(
                BlocksCopyError::CopyError {
                    path: block_prefix.clone(),
                },
            );
        }

        for path in &paths {
            if self.cancellation_token.is_cancelled() {
                trace!(
                    tenant = tenant,
                    block = source_block.id.to_string(),
                    "block copy cancelled."
                );
                return Err(anyhow!(BlocksCopyError::Cancelled));
            }

            let full_path = format!("{block_prefix}{DELIMITER}{path}");
            self.target
                .copy_object(&self.source, &full_path)
                .await
                .context(BlocksCopyError::CopyError {
                    path: full_path.clone(),
                })?;

            trace!(key = full_path, "object copied.");
        }

        debug!(
            tenant = tenant,
            block = source_block.id.to_string(),
            objects = paths.len(),
            "all objects of block copied."
        );

        Ok(paths.len())
    }
}

/// Moves `meta.json` to the end. Its presence signals a complete block to readers of
/// the target bucket. The relative order of every other path is kept.
pub fn order_meta_last(paths: Vec<String>) -> Vec<String> {
    let (meta, mut others): (Vec<String>, Vec<String>) =
        paths.into_iter().partition(|path| path == META_FILENAME);

    others.extend(meta);
    others
}
