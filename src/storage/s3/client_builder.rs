use std::time::Duration;

use aws_config::meta::region::{ProvideRegion, RegionProviderChain};
use aws_config::profile::{ProfileFileCredentialsProvider, ProfileFileRegionProvider};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, ConfigLoader};
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Builder, Credentials};
use aws_smithy_runtime_api::client::stalled_stream_protection::StalledStreamProtectionConfig;
use aws_smithy_types::timeout::TimeoutConfig;
use aws_types::SdkConfig;
use aws_types::region::Region;

use crate::config::ClientConfig;
use crate::types::S3Credentials;

impl ClientConfig {
    pub async fn create_client(&self) -> Client {
        let sdk_config = self.load_sdk_config().await;

        let mut config_builder = Builder::from(&sdk_config).force_path_style(self.force_path_style);
        if let Some(timeout_config) = self.build_timeout_config() {
            config_builder = config_builder.timeout_config(timeout_config);
        }

        Client::from_conf(config_builder.build())
    }

    async fn load_sdk_config(&self) -> SdkConfig {
        let stalled_stream_protection = if self.disable_stalled_stream_protection {
            StalledStreamProtectionConfig::disabled()
        } else {
            StalledStreamProtectionConfig::enabled().build()
        };

        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .stalled_stream_protection(stalled_stream_protection)
            .region(self.build_region_provider())
            .retry_config(self.build_retry_config());

        let config_loader = match &self.endpoint_url {
            Some(endpoint_url) => config_loader.endpoint_url(endpoint_url),
            None => config_loader,
        };

        self.apply_credentials(config_loader).load().await
    }

    fn apply_credentials(&self, config_loader: ConfigLoader) -> ConfigLoader {
        match &self.credential {
            S3Credentials::Credentials { access_keys } => {
                config_loader.credentials_provider(Credentials::new(
                    access_keys.access_key.to_string(),
                    access_keys.secret_access_key.to_string(),
                    access_keys.session_token.clone(),
                    None,
                    "blockscopy",
                ))
            }
            S3Credentials::Profile(profile_name) => {
                let mut builder =
                    ProfileFileCredentialsProvider::builder().profile_name(profile_name);
                if let Some(profile_files) =
                    self.profile_files(EnvConfigFileKind::Credentials)
                {
                    builder = builder.profile_files(profile_files);
                }

                config_loader.credentials_provider(builder.build())
            }
            S3Credentials::FromEnvironment => config_loader,
        }
    }

    /// An explicit region always wins. Otherwise a profile's region is used, or the
    /// default provider chain when credentials come from the environment.
    fn build_region_provider(&self) -> Box<dyn ProvideRegion> {
        let explicit_region = RegionProviderChain::first_try(self.region.clone().map(Region::new));

        let S3Credentials::Profile(profile_name) = &self.credential else {
            return Box::new(explicit_region.or_default_provider());
        };

        let mut builder = ProfileFileRegionProvider::builder().profile_name(profile_name);
        if let Some(profile_files) = self.profile_files(EnvConfigFileKind::Config) {
            builder = builder.profile_files(profile_files);
        }

        Box::new(explicit_region.or_else(builder.build()))
    }

    fn profile_files(&self, kind: EnvConfigFileKind) -> Option<EnvConfigFiles> {
        let location = &self.client_config_location;
        let file = match kind {
            EnvConfigFileKind::Config => location.aws_config_file.as_ref(),
            EnvConfigFileKind::Credentials => location.aws_shared_credentials_file.as_ref(),
        }?;

        Some(EnvConfigFiles::builder().with_file(kind, file).build())
    }

    fn build_retry_config(&self) -> RetryConfig {
        RetryConfig::standard()
            .with_max_attempts(self.retry_config.aws_max_attempts)
            .with_initial_backoff(Duration::from_millis(
                self.retry_config.initial_backoff_milliseconds,
            ))
    }

    /// None when no timeout is configured, so that the SDK keeps its own defaults.
    fn build_timeout_config(&self) -> Option<TimeoutConfig> {
        let timeouts = &self.cli_timeout_config;
        if timeouts.operation_timeout_milliseconds.is_none()
            && timeouts.operation_attempt_timeout_milliseconds.is_none()
            && timeouts.connect_timeout_milliseconds.is_none()
            && timeouts.read_timeout_milliseconds.is_none()
        {
            return None;
        }

        let mut builder = TimeoutConfig::builder();
        builder.set_operation_timeout(
            timeouts
                .operation_timeout_milliseconds
                .map(Duration::from_millis),
        );
        builder.set_operation_attempt_timeout(
            timeouts
                .operation_attempt_timeout_milliseconds
                .map(Duration::from_millis),
        );
        builder.set_connect_timeout(
            timeouts
                .connect_timeout_milliseconds
                .map(Duration::from_millis),
        );
        builder.set_read_timeout(timeouts.read_timeout_milliseconds.map(Duration::from_millis));

        Some(builder.build())
    }
}
