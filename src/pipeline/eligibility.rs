use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::Config;
use crate::storage::Storage;
use crate::types::error::BlocksCopyError;
use crate::types::{BlockMarkers, BlockMeta, SourceBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyCopied,
    MarkedForDeletion,
    TooShort { duration: Duration },
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Copy,
    Skip(SkipReason),
}

#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    /// `None` disables the duration check.
    min_block_duration: Option<Duration>,
    dry_run: bool,
}

impl EligibilityFilter {
    pub fn new(config: &Config) -> Self {
        Self {
            min_block_duration: config
                .is_min_block_duration_enabled()
                .then_some(config.min_block_duration),
            dry_run: config.dry_run,
        }
    }

    /// Decides whether a block is copied. The checks run in a fixed order and the
    /// first one that applies wins, so a copied block is never read again.
    /// `meta.json` is fetched only when a minimum duration is configured.
    pub async fn decide(
        &self,
        source: &Storage,
        tenant: &str,
        source_block: &SourceBlock,
        markers: BlockMarkers,
    ) -> Result<Decision> {
        let block = source_block.id.to_string();

        if markers.copied {
            debug!(
                tenant = tenant,
                block = block,
                "skipping block because it has been copied already."
            );
            return Ok(Decision::Skip(SkipReason::AlreadyCopied));
        }

        if markers.deletion {
            debug!(
                tenant = tenant,
                block = block,
                "skipping block because it is marked for deletion."
            );
            return Ok(Decision::Skip(SkipReason::MarkedForDeletion));
        }

        if let Some(min_block_duration) = self.min_block_duration {
            let duration = read_block_meta(source, tenant, source_block).await?.duration();
            if duration < min_block_duration {
                debug!(
                    tenant = tenant,
                    block = block,
                    block_duration = humantime::format_duration(duration).to_string(),
                    minimum_duration =
                        humantime::format_duration(min_block_duration).to_string(),
                    "skipping block, block duration is smaller than minimum duration."
                );
                return Ok(Decision::Skip(SkipReason::TooShort { duration }));
            }
        }

        if self.dry_run {
            info!(
                tenant = tenant,
                block = block,
                "would copy block, but skipping due to dry-run."
            );
            return Ok(Decision::Skip(SkipReason::DryRun));
        }

        Ok(Decision::Copy)
    }
}

pub async fn read_block_meta(
    source: &Storage,
    tenant: &str,
    source_block: &SourceBlock,
) -> Result<BlockMeta> {
    let path = source_block.meta_path(tenant);

    let body = source
        .get_object(&path)
        .await
        .context(BlocksCopyError::MetadataReadError { path: path.clone() })?;

    BlockMeta::from_slice(&body).context(BlocksCopyError::MetadataReadError { path })
}
