use std::collections::HashSet;
use std::time::Duration;

use crate::types::{ClientConfigLocation, S3Credentials, StoragePath};

pub mod args;

// S3 accepts at most this many parts in a multipart upload.
const MAX_MULTIPART_PARTS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: StoragePath,
    pub target: StoragePath,
    pub source_client_config: Option<ClientConfig>,
    pub target_client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    pub min_block_duration: Duration,
    pub tenant_concurrency: u16,
    pub block_concurrency: u16,
    pub copy_period: Duration,
    pub tenant_filter_config: TenantFilterConfig,
    pub dry_run: bool,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

impl Config {
    /// Bucket name recorded in copied markers.
    pub fn target_bucket_name(&self) -> String {
        self.target.bucket_name()
    }

    pub fn is_periodic(&self) -> bool {
        !self.copy_period.is_zero()
    }

    pub fn is_min_block_duration_enabled(&self) -> bool {
        !self.min_block_duration.is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
    pub disable_stalled_stream_protection: bool,
    pub transfer_config: TransferConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    pub multipart_threshold: u64,
    pub multipart_chunksize: u64,
}

impl TransferConfig {
    pub fn is_multipart_upload_required(&self, content_length: u64) -> bool {
        self.multipart_threshold <= content_length
    }

    /// The configured chunk size, grown when the object would need more parts than S3
    /// allows.
    pub fn part_size(&self, content_length: u64) -> u64 {
        self.multipart_chunksize
            .max(content_length.div_ceil(MAX_MULTIPART_PARTS))
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

#[derive(Debug, Clone)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TenantFilterConfig {
    pub enabled_tenants: HashSet<String>,
    pub disabled_tenants: HashSet<String>,
}

impl TenantFilterConfig {
    /// A non-empty enabled list restricts processing to its members.
    /// The disabled list always wins over the enabled list.
    pub fn is_allowed(&self, tenant: &str) -> bool {
        if !self.enabled_tenants.is_empty() && !self.enabled_tenants.contains(tenant) {
            return false;
        }

        if self.disabled_tenants.contains(tenant) {
            return false;
        }

        true
    }
}
