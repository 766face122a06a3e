use anyhow::Result;
use tracing::{debug, info};

use crate::pipeline::block_copier::BlockCopier;
use crate::pipeline::eligibility::{Decision, EligibilityFilter};
use crate::pipeline::report::{BlockOutcome, TenantReport};
use crate::pipeline::{lister, log_error, marker_resolver, marker_writer, worker_pool};
use crate::storage::Storage;
use crate::types::error::is_cancelled_error;
use crate::types::metrics::SharedCopyMetrics;
use crate::types::token::CopyCancellationToken;
use crate::types::{BlockMarkers, SourceBlock};

/// Processes the blocks of one tenant. Cloned into every block worker.
pub struct TenantCopier {
    pub source: Storage,
    pub target: Storage,
    pub target_bucket: String,
    pub eligibility_filter: EligibilityFilter,
    pub block_concurrency: u16,
    pub cancellation_token: CopyCancellationToken,
    pub metrics: SharedCopyMetrics,
}

impl Clone for TenantCopier {
    fn clone(&self) -> Self {
        Self {
            source: dyn_clone::clone_box(&*self.source),
            target: dyn_clone::clone_box(&*self.target),
            target_bucket: self.target_bucket.clone(),
            eligibility_filter: self.eligibility_filter.clone(),
            block_concurrency: self.block_concurrency,
            cancellation_token: self.cancellation_token.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl TenantCopier {
    /// Fails only when the tenant's blocks or markers cannot be listed. Block
    /// failures are counted in the returned report.
    pub async fn copy_tenant(&self, tenant: String) -> Result<TenantReport> {
        let blocks = lister::list_blocks_for_tenant(&self.source, &tenant)
            .await
            .inspect_err(|e| log_error(e, &tenant, None, "failed to list blocks for tenant."))?;

        let markers =
            marker_resolver::resolve_markers(&self.source, &tenant, &self.target_bucket)
                .await
                .inspect_err(|e| {
                    log_error(e, &tenant, None, "failed to list block markers for tenant.")
                })?;

        let units = blocks
            .into_iter()
            .map(|block| {
                let block_markers = markers.get(&block.id).copied().unwrap_or_default();
                (block, block_markers)
            })
            .collect::<Vec<_>>();

        debug!(tenant = tenant, blocks = units.len(), "copying blocks of tenant.");

        let copier = self.clone();
        let worker_tenant = tenant.clone();
        let outcomes = worker_pool::run_bounded(
            units,
            self.block_concurrency,
            self.cancellation_token.clone(),
            move |(block, block_markers)| {
                let copier = copier.clone();
                let tenant = worker_tenant.clone();
                async move { copier.copy_block(&tenant, block, block_markers).await }
            },
        )
        .await;

        let mut report = TenantReport::default();
        for outcome in &outcomes {
            report.record(&outcome.result);
        }

        debug!(
            tenant = tenant,
            copied = report.copied,
            failed = report.failed,
            "blocks of tenant processed."
        );

        Ok(report)
    }

    /// Objects are read under the listed block name. The copied-marker is keyed by the
    /// parsed block ID.
    pub async fn copy_block(
        &self,
        tenant: &str,
        block: SourceBlock,
        markers: BlockMarkers,
    ) -> Result<BlockOutcome> {
        let block_id = block.id;
        let decision = self
            .eligibility_filter
            .decide(&self.source, tenant, &block, markers)
            .await
            .inspect_err(|e| {
                log_error(
                    e,
                    tenant,
                    Some(&block_id),
                    "skipping block, failed to read meta.json file.",
                )
            })?;

        if let Decision::Skip(reason) = decision {
            return Ok(BlockOutcome::Skipped(reason));
        }

        info!(tenant = tenant, block = block_id.to_string(), "copying block.");

        let block_copier = BlockCopier::new(
            dyn_clone::clone_box(&*self.source),
            dyn_clone::clone_box(&*self.target),
            self.cancellation_token.clone(),
        );
        if let Err(e) = block_copier.copy(tenant, &block).await {
            if !is_cancelled_error(&e) {
                self.metrics.inc_blocks_copy_failed();
            }
            log_error(&e, tenant, Some(&block_id), "failed to copy block.");

            return Err(e);
        }

        self.metrics.inc_blocks_copied();
        info!(
            tenant = tenant,
            block = block_id.to_string(),
            "block copied successfully."
        );

        marker_writer::write_copied_marker(
            &self.source,
            tenant,
            &block_id,
            &self.target_bucket,
        )
        .await
        .inspect_err(|e| {
            log_error(
                e,
                tenant,
                Some(&block_id),
                "failed to upload copied-marker file for block.",
            )
        })?;

        Ok(BlockOutcome::Copied)
    }
}
