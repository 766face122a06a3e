use anyhow::{Error, Result};
use tracing::{debug, error, info, trace};

use crate::Config;
use crate::pipeline::eligibility::EligibilityFilter;
use crate::pipeline::report::{CycleReport, TenantReport};
use crate::pipeline::tenant_copier::TenantCopier;
use crate::storage::{Storage, StoragePair};
use crate::types::BlockId;
use crate::types::error::is_cancelled_error;
use crate::types::metrics::SharedCopyMetrics;
use crate::types::token::CopyCancellationToken;

mod block_copier;
pub mod eligibility;
mod lister;
mod marker_resolver;
mod marker_writer;
pub mod report;
pub mod scheduler;
mod storage_factory;
mod tenant_copier;
mod worker_pool;

/// One copy cycle over every tenant of the source bucket.
pub struct CopyPipeline {
    config: Config,
    source: Storage,
    target: Storage,
    cancellation_token: CopyCancellationToken,
    metrics: SharedCopyMetrics,
}

impl CopyPipeline {
    pub async fn new(
        config: Config,
        cancellation_token: CopyCancellationToken,
        metrics: SharedCopyMetrics,
    ) -> Result<Self> {
        let storage_pair =
            storage_factory::create_storage_pair(&config, cancellation_token.clone()).await?;

        Ok(Self::with_storage_pair(
            config,
            storage_pair,
            cancellation_token,
            metrics,
        ))
    }

    pub fn with_storage_pair(
        config: Config,
        storage_pair: StoragePair,
        cancellation_token: CopyCancellationToken,
        metrics: SharedCopyMetrics,
    ) -> Self {
        let StoragePair { source, target } = storage_pair;

        Self {
            config,
            source,
            target,
            cancellation_token,
            metrics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_metrics(&self) -> SharedCopyMetrics {
        self.metrics.clone()
    }

    pub fn get_cancellation_token(&self) -> CopyCancellationToken {
        self.cancellation_token.clone()
    }

    /// Lists the tenants, drops the ones excluded by the allow/deny lists and copies
    /// the rest, at most `tenant_concurrency` at a time. Never fails as a whole: the
    /// returned report tells whether any tenant or block failed.
    pub async fn run_cycle(&self) -> CycleReport {
        trace!("copy cycle has started.");

        let tenants = match lister::list_tenants(&self.source).await {
            Ok(tenants) => tenants,
            Err(e) => {
                log_cycle_error(&e, "failed to list tenants.");
                return CycleReport::tenant_listing_failed();
            }
        };

        let (allowed_tenants, filtered_tenants): (Vec<String>, Vec<String>) = tenants
            .into_iter()
            .partition(|tenant| self.config.tenant_filter_config.is_allowed(tenant));
        for tenant in &filtered_tenants {
            debug!(tenant = tenant, "tenant skipped by allow/deny lists.");
        }

        let tenant_copier = self.create_tenant_copier();
        let outcomes = worker_pool::run_bounded(
            allowed_tenants,
            self.config.tenant_concurrency,
            self.cancellation_token.clone(),
            move |tenant| {
                let tenant_copier = tenant_copier.clone();
                async move { tenant_copier.copy_tenant(tenant).await }
            },
        )
        .await;

        let mut report = CycleReport {
            filtered_tenants: filtered_tenants.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            let tenant_report = outcome.result.unwrap_or_else(|_| TenantReport::aborted());
            report.tenants.insert(outcome.unit, tenant_report);
        }

        log_cycle_report(&report, self.config.dry_run);

        report
    }

    fn create_tenant_copier(&self) -> TenantCopier {
        TenantCopier {
            source: dyn_clone::clone_box(&*self.source),
            target: dyn_clone::clone_box(&*self.target),
            target_bucket: self.target.bucket().to_string(),
            eligibility_filter: EligibilityFilter::new(&self.config),
            block_concurrency: self.config.block_concurrency,
            cancellation_token: self.cancellation_token.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

fn log_cycle_report(report: &CycleReport, dry_run: bool) {
    let total = report.total();

    info!(
        dry_run = dry_run,
        tenants = report.tenants.len(),
        filtered_tenants = report.filtered_tenants,
        aborted_tenants = report.aborted_tenants(),
        copied = total.copied,
        already_copied = total.already_copied,
        marked_for_deletion = total.marked_for_deletion,
        too_short = total.too_short,
        would_copy = total.dry_run,
        failed = total.failed,
        "copy cycle report."
    );
}

fn log_cycle_error(e: &Error, message: &str) {
    if is_cancelled_error(e) {
        debug!(message);
        return;
    }

    let error = e.to_string();
    let source = e.source();

    error!(error = error, source = source, message);
}

/// Failures are logged where they happen, with the tenant and block they belong to.
/// Cancellation is expected during shutdown and is not reported as an error.
fn log_error(e: &Error, tenant: &str, block_id: Option<&BlockId>, message: &str) {
    let block = block_id.map(BlockId::to_string).unwrap_or_default();

    if is_cancelled_error(e) {
        debug!(tenant = tenant, block = block, "cancelled.");
        return;
    }

    let error = e.to_string();
    let source = e.source();

    error!(
        tenant = tenant,
        block = block,
        error = error,
        source = source,
        message
    );
}
