use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{IntCounter, Opts, Registry};

pub type SharedCopyMetrics = Arc<CopyMetrics>;

/// Process-wide counters, registered in a registry owned by this value. Built once in
/// the binary and handed to every component that records an event; nothing registers
/// itself in the default registry.
pub struct CopyMetrics {
    registry: Registry,
    copy_cycles_succeeded: IntCounter,
    copy_cycles_failed: IntCounter,
    blocks_copied: IntCounter,
    blocks_copy_failed: IntCounter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyMetricsSnapshot {
    pub copy_cycles_succeeded: u64,
    pub copy_cycles_failed: u64,
    pub blocks_copied: u64,
    pub blocks_copy_failed: u64,
}

impl CopyMetrics {
    pub fn new_shared() -> Result<SharedCopyMetrics> {
        let registry = Registry::new();

        Ok(Arc::new(CopyMetrics {
            copy_cycles_succeeded: register_counter(
                &registry,
                "cortex_blocks_copy_successful_cycles_total",
                "Number of successful blocks copy cycles.",
            )?,
            copy_cycles_failed: register_counter(
                &registry,
                "cortex_blocks_copy_failed_cycles_total",
                "Number of failed blocks copy cycles.",
            )?,
            blocks_copied: register_counter(
                &registry,
                "cortex_blocks_copy_blocks_copied_total",
                "Number of blocks copied between buckets.",
            )?,
            blocks_copy_failed: register_counter(
                &registry,
                "cortex_blocks_copy_blocks_failed_total",
                "Number of blocks that failed to copy.",
            )?,
            registry,
        }))
    }

    /// The registry holding every counter, for an exporter to gather from.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn inc_copy_cycles_succeeded(&self) {
        self.copy_cycles_succeeded.inc();
    }

    pub fn inc_copy_cycles_failed(&self) {
        self.copy_cycles_failed.inc();
    }

    pub fn inc_blocks_copied(&self) {
        self.blocks_copied.inc();
    }

    pub fn inc_blocks_copy_failed(&self) {
        self.blocks_copy_failed.inc();
    }

    pub fn snapshot(&self) -> CopyMetricsSnapshot {
        CopyMetricsSnapshot {
            copy_cycles_succeeded: self.copy_cycles_succeeded.get(),
            copy_cycles_failed: self.copy_cycles_failed.get(),
            blocks_copied: self.blocks_copied.get(),
            blocks_copy_failed: self.blocks_copy_failed.get(),
        }
    }
}

impl Debug for CopyMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyMetrics")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help))
        .with_context(|| format!("invalid counter: {name}"))?;
    registry
        .register(Box::new(counter.clone()))
        .with_context(|| format!("failed to register counter: {name}"))?;

    Ok(counter)
}
