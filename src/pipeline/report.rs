use std::collections::BTreeMap;

use anyhow::Result;

use crate::pipeline::eligibility::SkipReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Copied,
    Skipped(SkipReason),
}

/// Per-tenant block counts for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantReport {
    pub copied: usize,
    pub already_copied: usize,
    pub marked_for_deletion: usize,
    pub too_short: usize,
    pub dry_run: usize,
    pub failed: usize,
    /// The tenant could not be processed at all (listing failure or cancellation).
    pub aborted: bool,
}

impl TenantReport {
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: &Result<BlockOutcome>) {
        match result {
            Ok(BlockOutcome::Copied) => self.copied += 1,
            Ok(BlockOutcome::Skipped(SkipReason::AlreadyCopied)) => self.already_copied += 1,
            Ok(BlockOutcome::Skipped(SkipReason::MarkedForDeletion)) => {
                self.marked_for_deletion += 1
            }
            Ok(BlockOutcome::Skipped(SkipReason::TooShort { .. })) => self.too_short += 1,
            Ok(BlockOutcome::Skipped(SkipReason::DryRun)) => self.dry_run += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn has_error(&self) -> bool {
        self.aborted || self.failed > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub tenants: BTreeMap<String, TenantReport>,
    /// Tenants excluded by the allow/deny lists.
    pub filtered_tenants: usize,
    pub tenant_listing_failed: bool,
}

impl CycleReport {
    pub fn tenant_listing_failed() -> Self {
        Self {
            tenant_listing_failed: true,
            ..Default::default()
        }
    }

    /// A cycle fails when at least one tenant or block failed.
    pub fn is_success(&self) -> bool {
        !self.tenant_listing_failed && !self.tenants.values().any(TenantReport::has_error)
    }

    pub fn total(&self) -> TenantReport {
        self.tenants
            .values()
            .fold(TenantReport::default(), |total, report| TenantReport {
                copied: total.copied + report.copied,
                already_copied: total.already_copied + report.already_copied,
                marked_for_deletion: total.marked_for_deletion + report.marked_for_deletion,
                too_short: total.too_short + report.too_short,
                dry_run: total.dry_run + report.dry_run,
                failed: total.failed + report.failed,
                aborted: total.aborted || report.aborted,
            })
    }

    pub fn aborted_tenants(&self) -> usize {
        self.tenants.values().filter(|report| report.aborted).count()
    }
}
