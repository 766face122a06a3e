use crate::config::args::value_parser::{human_bytes, storage_path, url};
use crate::config::{
    CLITimeoutConfig, ClientConfig, RetryConfig, TenantFilterConfig, TracingConfig,
    TransferConfig,
};
use crate::types::{AccessKeys, ClientConfigLocation, DELIMITER, S3Credentials, StoragePath};
use crate::Config;
use clap::builder::{ArgPredicate, NonEmptyStringValueParser};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
#[cfg(feature = "version")]
use shadow_rs::shadow;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

mod tests;
mod value_parser;

const DEFAULT_MIN_BLOCK_DURATION: &str = "24h";
const DEFAULT_TENANT_CONCURRENCY: u16 = 5;
const DEFAULT_BLOCK_CONCURRENCY: u16 = 5;
const DEFAULT_COPY_PERIOD: &str = "0s";
const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_DRY_RUN: bool = false;
const DEFAULT_DISABLE_STALLED_STREAM_PROTECTION: bool = false;
const DEFAULT_MULTIPART_THRESHOLD: &str = "8MiB";
const DEFAULT_MULTIPART_CHUNKSIZE: &str = "8MiB";

const SOURCE_LOCAL_STORAGE_DIR_NOT_FOUND: &str = "directory must be specified as a source\n";
const TARGET_LOCAL_STORAGE_INVALID: &str = "invalid target path\n";
const SAME_SOURCE_AND_TARGET: &str = "source and target must be different buckets\n";
const TARGET_BUCKET_NAME_CONTAINS_DELIMITER: &str =
    "target bucket name must not contain '/'\n";
const SOURCE_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL: &str =
    "with --source-endpoint-url, source storage must be s3://\n";
const TARGET_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL: &str =
    "with --target-endpoint-url, target storage must be s3://\n";
const NO_SOURCE_CREDENTIAL_REQUIRED: &str = "no source credential required\n";
const NO_TARGET_CREDENTIAL_REQUIRED: &str = "no target credential required\n";

#[cfg(feature = "version")]
shadow!(build);

#[derive(Parser, Clone, Debug)]
#[cfg_attr(feature = "version", command(version=format!("{} ({} {}), {}", build::PKG_VERSION, build::SHORT_COMMIT, build::BUILD_TARGET, build::RUST_VERSION)))]
pub struct CLIArgs {
    #[arg(env, help = "s3://<BUCKET_NAME> or local path", value_parser = storage_path::check_storage_path, default_value_if("auto_complete_shell", ArgPredicate::IsPresent, "s3://ignored-source"), required = false)]
    source: String,

    #[arg(env, help = "s3://<BUCKET_NAME> or local path", value_parser = storage_path::check_storage_path, default_value_if("auto_complete_shell", ArgPredicate::IsPresent, "s3://ignored-target"), required = false)]
    target: String,

    /// A simulation mode. blocks that would be copied are reported, nothing is written
    #[arg(long, env, default_value_t = DEFAULT_DRY_RUN, help_heading = "General")]
    dry_run: bool,

    /// blocks covering a shorter time range are not copied. 0s disables the check
    #[arg(long, env, default_value = DEFAULT_MIN_BLOCK_DURATION, value_parser = humantime::parse_duration, help_heading = "Copy Options")]
    min_block_duration: Duration,

    /// number of tenants processed concurrently
    #[arg(long, env, default_value_t = DEFAULT_TENANT_CONCURRENCY, value_parser = clap::value_parser!(u16).range(1..), help_heading = "Copy Options")]
    tenant_concurrency: u16,

    /// number of blocks processed concurrently within a tenant
    #[arg(long, env, default_value_t = DEFAULT_BLOCK_CONCURRENCY, value_parser = clap::value_parser!(u16).range(1..), help_heading = "Copy Options")]
    block_concurrency: u16,

    /// interval between copy cycles. 0s runs a single cycle and exits
    #[arg(long, env, default_value = DEFAULT_COPY_PERIOD, value_parser = humantime::parse_duration, help_heading = "Copy Options")]
    copy_period: Duration,

    /// copy only these tenants (comma separated)
    #[arg(long, env, value_delimiter = ',', value_parser = NonEmptyStringValueParser::new(), help_heading = "Tenant Filtering")]
    enabled_tenants: Vec<String>,

    /// never copy these tenants (comma separated). takes precedence over --enabled-tenants
    #[arg(long, env, value_delimiter = ',', value_parser = NonEmptyStringValueParser::new(), help_heading = "Tenant Filtering")]
    disabled_tenants: Vec<String>,

    /// location of the file that the AWS CLI uses to store configuration profiles
    #[arg(long, env, value_name = "FILE", help_heading = "AWS Configuration")]
    aws_config_file: Option<PathBuf>,

    /// location of the file that the AWS CLI uses to store access keys
    #[arg(long, env, value_name = "FILE", help_heading = "AWS Configuration")]
    aws_shared_credentials_file: Option<PathBuf>,

    /// source AWS CLI profile
    #[arg(long, env, conflicts_with_all = ["source_access_key", "source_secret_access_key", "source_session_token"], help_heading = "AWS Configuration")]
    source_profile: Option<String>,

    /// source access key
    #[arg(long, env, conflicts_with_all = ["source_profile"], requires = "source_secret_access_key", help_heading = "AWS Configuration")]
    source_access_key: Option<String>,

    /// source secret access key
    #[arg(long, env, conflicts_with_all = ["source_profile"], requires = "source_access_key", help_heading = "AWS Configuration")]
    source_secret_access_key: Option<String>,

    /// source session token
    #[arg(long, env, conflicts_with_all = ["source_profile"], requires = "source_access_key", help_heading = "AWS Configuration")]
    source_session_token: Option<String>,

    /// source region
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Source Options")]
    source_region: Option<String>,

    /// source endpoint url
    #[arg(long, env, value_parser = url::check_endpoint_url, help_heading = "Source Options")]
    source_endpoint_url: Option<String>,

    /// force path-style addressing for source endpoint
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Source Options")]
    source_force_path_style: bool,

    /// target AWS CLI profile
    #[arg(long, env, conflicts_with_all = ["target_access_key", "target_secret_access_key", "target_session_token"], help_heading = "AWS Configuration")]
    target_profile: Option<String>,

    /// target access key
    #[arg(long, env, conflicts_with_all = ["target_profile"], requires = "target_secret_access_key", help_heading = "AWS Configuration")]
    target_access_key: Option<String>,

    /// target secret access key
    #[arg(long, env, conflicts_with_all = ["target_profile"], requires = "target_access_key", help_heading = "AWS Configuration")]
    target_secret_access_key: Option<String>,

    /// target session token
    #[arg(long, env, conflicts_with_all = ["target_profile"], requires = "target_access_key", help_heading = "AWS Configuration")]
    target_session_token: Option<String>,

    /// target region
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target Options")]
    target_region: Option<String>,

    /// target endpoint url
    #[arg(long, env, value_parser = url::check_endpoint_url, help_heading = "Target Options")]
    target_endpoint_url: Option<String>,

    /// force path-style addressing for target endpoint
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Target Options")]
    target_force_path_style: bool,

    /// object size at which copies switch to multipart transfers. Allow suffixes: MB, MiB, GB, GiB.
    #[arg(long, env, default_value = DEFAULT_MULTIPART_THRESHOLD, value_parser = human_bytes::parse_human_bytes, help_heading = "Multipart Settings")]
    multipart_threshold: u64,

    /// part size of multipart transfers. Allow suffixes: MB, MiB, GB, GiB.
    /// the larger the size, the larger the memory usage.
    #[arg(long, env, default_value = DEFAULT_MULTIPART_CHUNKSIZE, value_parser = human_bytes::parse_human_bytes, help_heading = "Multipart Settings")]
    multipart_chunksize: u64,

    /// trace verbosity(-v: show info, -vv: show debug, -vvv show trace)
    #[clap(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// show trace as json format
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Tracing/Logging")]
    json_tracing: bool,

    /// enable aws sdk tracing
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Tracing/Logging")]
    aws_sdk_tracing: bool,

    /// show span event tracing
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Tracing/Logging")]
    span_events_tracing: bool,

    /// disable ANSI terminal colors
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Tracing/Logging")]
    disable_color_tracing: bool,

    /// maximum retry attempts of the AWS SDK retry handler
    #[arg(long, env, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, value_name = "max_attempts", help_heading = "Retry Options")]
    aws_max_attempts: u32,

    /// a multiplier value used when calculating backoff times as part of an exponential
    /// backoff with jitter strategy.
    #[arg(long, env, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, value_name = "initial_backoff", help_heading = "Retry Options")]
    initial_backoff_milliseconds: u64,

    /// operation timeout (milliseconds).
    /// For details, see the AWS SDK for Rust TimeoutConfig documentation.
    /// The default has no timeout.
    #[arg(long, env, value_name = "operation_timeout", help_heading = "Timeout Options")]
    operation_timeout_milliseconds: Option<u64>,

    /// operation attempt timeout (milliseconds).
    /// For details, see the AWS SDK for Rust TimeoutConfig documentation.
    /// The default has no timeout.
    #[arg(long, env, value_name = "operation_attempt_timeout", help_heading = "Timeout Options")]
    operation_attempt_timeout_milliseconds: Option<u64>,

    /// connect timeout (milliseconds).
    /// The default has AWS SDK default timeout (Currently 3100 milliseconds).
    #[arg(long, env, value_name = "connect_timeout", help_heading = "Timeout Options")]
    connect_timeout_milliseconds: Option<u64>,

    /// read timeout (milliseconds).
    /// The default has no timeout.
    #[arg(long, env, value_name = "read_timeout", help_heading = "Timeout Options")]
    read_timeout_milliseconds: Option<u64>,

    /// generate a auto completions script. Valid values: bash, fish, zsh, powershell, elvish.
    #[arg(long, env, value_name = "SHELL", value_parser = clap_complete::shells::Shell::from_str, help_heading = "Advanced")]
    auto_complete_shell: Option<clap_complete::shells::Shell>,

    /// disable stalled stream protection
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_STALLED_STREAM_PROTECTION, help_heading = "Advanced")]
    disable_stalled_stream_protection: bool,
}

pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    crate::Config::try_from(config_args)
}

impl CLIArgs {
    fn validate_storage_config(
        &self,
        source: &StoragePath,
        target: &StoragePath,
    ) -> Result<(), String> {
        check_source_local_storage(source)?;
        check_target_local_storage(target)?;
        check_same_storage(source, target)?;
        check_target_bucket_name(target)?;
        self.check_endpoint_url_conflict(source, target)?;
        self.check_storage_credentials_conflict(source, target)?;

        Ok(())
    }

    fn check_endpoint_url_conflict(
        &self,
        source: &StoragePath,
        target: &StoragePath,
    ) -> Result<(), String> {
        if matches!(source, StoragePath::Local(_)) && self.source_endpoint_url.is_some() {
            return Err(SOURCE_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL.to_string());
        }

        if matches!(target, StoragePath::Local(_)) && self.target_endpoint_url.is_some() {
            return Err(TARGET_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL.to_string());
        }

        Ok(())
    }

    fn check_storage_credentials_conflict(
        &self,
        source: &StoragePath,
        target: &StoragePath,
    ) -> Result<(), String> {
        if matches!(source, StoragePath::Local(_))
            && (self.source_profile.is_some() || self.source_access_key.is_some())
        {
            return Err(NO_SOURCE_CREDENTIAL_REQUIRED.to_string());
        }

        if matches!(target, StoragePath::Local(_))
            && (self.target_profile.is_some() || self.target_access_key.is_some())
        {
            return Err(NO_TARGET_CREDENTIAL_REQUIRED.to_string());
        }

        Ok(())
    }

    fn build_client_configs(
        &self,
        source: &StoragePath,
        target: &StoragePath,
    ) -> (Option<ClientConfig>, Option<ClientConfig>) {
        let source_client_config = if matches!(source, StoragePath::S3 { .. }) {
            Some(self.build_client_config(
                build_credential(
                    &self.source_profile,
                    &self.source_access_key,
                    &self.source_secret_access_key,
                    &self.source_session_token,
                ),
                self.source_region.clone(),
                self.source_endpoint_url.clone(),
                self.source_force_path_style,
            ))
        } else {
            None
        };

        let target_client_config = if matches!(target, StoragePath::S3 { .. }) {
            Some(self.build_client_config(
                build_credential(
                    &self.target_profile,
                    &self.target_access_key,
                    &self.target_secret_access_key,
                    &self.target_session_token,
                ),
                self.target_region.clone(),
                self.target_endpoint_url.clone(),
                self.target_force_path_style,
            ))
        } else {
            None
        };

        (source_client_config, target_client_config)
    }

    fn build_client_config(
        &self,
        credential: S3Credentials,
        region: Option<String>,
        endpoint_url: Option<String>,
        force_path_style: bool,
    ) -> ClientConfig {
        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: self.aws_config_file.clone(),
                aws_shared_credentials_file: self.aws_shared_credentials_file.clone(),
            },
            credential,
            region,
            endpoint_url,
            force_path_style,
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
            disable_stalled_stream_protection: self.disable_stalled_stream_protection,
            transfer_config: TransferConfig {
                multipart_threshold: self.multipart_threshold,
                multipart_chunksize: self.multipart_chunksize,
            },
        }
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let tracing_config = self.verbosity.log_level().map(|log_level| TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            aws_sdk_tracing: self.aws_sdk_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        });

        if !self.dry_run {
            return tracing_config;
        }

        // dry run reports are emitted at info level.
        match tracing_config {
            None => Some(TracingConfig {
                tracing_level: log::Level::Info,
                json_tracing: DEFAULT_JSON_TRACING,
                aws_sdk_tracing: DEFAULT_AWS_SDK_TRACING,
                span_events_tracing: DEFAULT_SPAN_EVENTS_TRACING,
                disable_color_tracing: DEFAULT_DISABLE_COLOR_TRACING,
            }),
            Some(config) if config.tracing_level < log::Level::Info => Some(TracingConfig {
                tracing_level: log::Level::Info,
                ..config
            }),
            Some(config) => Some(config),
        }
    }
}

fn build_credential(
    profile: &Option<String>,
    access_key: &Option<String>,
    secret_access_key: &Option<String>,
    session_token: &Option<String>,
) -> S3Credentials {
    if let Some(profile) = profile {
        return S3Credentials::Profile(profile.to_string());
    }

    match (access_key, secret_access_key) {
        (Some(access_key), Some(secret_access_key)) => S3Credentials::Credentials {
            access_keys: AccessKeys {
                access_key: access_key.to_string(),
                secret_access_key: secret_access_key.to_string(),
                session_token: session_token.clone(),
            },
        },
        _ => S3Credentials::FromEnvironment,
    }
}

fn check_source_local_storage(source: &StoragePath) -> Result<(), String> {
    if let StoragePath::Local(path) = source {
        if !path.is_dir() {
            return Err(SOURCE_LOCAL_STORAGE_DIR_NOT_FOUND.to_string());
        }
    }

    Ok(())
}

fn check_target_local_storage(target: &StoragePath) -> Result<(), String> {
    if let StoragePath::Local(path) = target {
        if path.try_exists().is_err() {
            return Err(TARGET_LOCAL_STORAGE_INVALID.to_string());
        }
    }

    Ok(())
}

fn check_same_storage(source: &StoragePath, target: &StoragePath) -> Result<(), String> {
    let same = match (source, target) {
        (StoragePath::S3 { bucket: source }, StoragePath::S3 { bucket: target }) => {
            source == target
        }
        (StoragePath::Local(source), StoragePath::Local(target)) => {
            match (source.canonicalize(), target.canonicalize()) {
                (Ok(source), Ok(target)) => source == target,
                _ => source == target,
            }
        }
        _ => false,
    };

    if same {
        return Err(SAME_SOURCE_AND_TARGET.to_string());
    }

    Ok(())
}

fn check_target_bucket_name(target: &StoragePath) -> Result<(), String> {
    let bucket = target.bucket_name();
    if bucket.is_empty() || bucket.contains(DELIMITER) {
        return Err(TARGET_BUCKET_NAME_CONTAINS_DELIMITER.to_string());
    }

    Ok(())
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(value: CLIArgs) -> Result<Self, Self::Error> {
        let source = storage_path::parse_storage_path(&value.source)?;
        let target = storage_path::parse_storage_path(&value.target)?;

        value.validate_storage_config(&source, &target)?;

        let (source_client_config, target_client_config) =
            value.build_client_configs(&source, &target);
        let tracing_config = value.build_tracing_config();

        Ok(Config {
            source,
            target,
            source_client_config,
            target_client_config,
            tracing_config,
            min_block_duration: value.min_block_duration,
            tenant_concurrency: value.tenant_concurrency,
            block_concurrency: value.block_concurrency,
            copy_period: value.copy_period,
            tenant_filter_config: TenantFilterConfig {
                enabled_tenants: value.enabled_tenants.into_iter().collect::<HashSet<_>>(),
                disabled_tenants: value.disabled_tenants.into_iter().collect::<HashSet<_>>(),
            },
            dry_run: value.dry_run,
            auto_complete_shell: value.auto_complete_shell,
        })
    }
}
