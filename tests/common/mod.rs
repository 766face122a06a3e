#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "e2e_test")]
use aws_config::meta::region::{ProvideRegion, RegionProviderChain};
#[cfg(feature = "e2e_test")]
use aws_config::{BehaviorVersion, ConfigLoader};
#[cfg(feature = "e2e_test")]
use aws_sdk_s3::client::Client;
#[cfg(feature = "e2e_test")]
use aws_sdk_s3::config::Builder;
#[cfg(feature = "e2e_test")]
use aws_sdk_s3::primitives::ByteStream;
#[cfg(feature = "e2e_test")]
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
#[cfg(feature = "e2e_test")]
use aws_types::SdkConfig;
use once_cell::sync::Lazy;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use uuid::Uuid;
use walkdir::WalkDir;

use blockscopy::config::args::build_config_from_args;
use blockscopy::pipeline::CopyPipeline;
use blockscopy::pipeline::report::CycleReport;
use blockscopy::types::BlockId;
use blockscopy::types::metrics::{CopyMetrics, CopyMetricsSnapshot};
use blockscopy::types::token::create_copy_cancellation_token;

pub const REGION: &str = "ap-northeast-1";

pub const BLOCK_START_MILLIS: i64 = 1_614_556_800_000;
const HOUR_MILLIS: i64 = 60 * 60 * 1000;

pub const BLOCK_FILES: [&str; 4] = ["chunks/000001", "chunks/000002", "index", "meta.json"];

pub static BUCKET1: Lazy<String> = Lazy::new(|| format!("blockscopy-1-{}", Uuid::new_v4()));
pub static BUCKET2: Lazy<String> = Lazy::new(|| format!("blockscopy-2-{}", Uuid::new_v4()));

pub static SEMAPHORE: Lazy<Arc<Semaphore>> = Lazy::new(|| Arc::new(Semaphore::new(1)));

const PROFILE_NAME: &str = "blockscopy-e2e-test";

pub fn block_meta(block_id: &BlockId, hours: i64) -> String {
    format!(
        r#"{{"ulid":"{block_id}","minTime":{BLOCK_START_MILLIS},"maxTime":{},"version":1}}"#,
        BLOCK_START_MILLIS + hours * HOUR_MILLIS
    )
}

pub fn block_file_content(tenant: &str, block_id: &BlockId, file: &str) -> Vec<u8> {
    format!("{tenant}/{block_id}/{file}").into_bytes()
}

/// A source and a target bucket backed by directories of one temporary directory.
pub struct LocalBuckets {
    _dir: TempDir,
    pub source: PathBuf,
    pub target: PathBuf,
}

impl LocalBuckets {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source-bucket");
        let target = dir.path().join("target-bucket");
        std::fs::create_dir_all(&source).unwrap();

        Self {
            _dir: dir,
            source,
            target,
        }
    }

    pub fn put_block(&self, tenant: &str, hours: i64) -> BlockId {
        let block_id = BlockId::new();

        for file in BLOCK_FILES {
            let content = if file == "meta.json" {
                block_meta(&block_id, hours).into_bytes()
            } else {
                block_file_content(tenant, &block_id, file)
            };
            write_file(&self.source.join(tenant).join(block_id.to_string()).join(file), &content);
        }

        block_id
    }

    pub fn put_marker(&self, tenant: &str, name: &str) {
        write_file(&self.source.join(tenant).join("markers").join(name), b"");
    }

    pub fn put_deletion_marker(&self, tenant: &str, block_id: &BlockId) {
        write_file(
            &self
                .source
                .join(tenant)
                .join("markers")
                .join(format!("{block_id}-deletion-mark.json")),
            br#"{"version":1,"deletion_time":1614643200}"#,
        );
    }

    pub fn copied_marker_path(&self, tenant: &str, block_id: &BlockId) -> PathBuf {
        self.source
            .join(tenant)
            .join("markers")
            .join(format!("{block_id}-copied-target-bucket"))
    }

    pub fn args(&self, extra_args: &[&str]) -> Vec<String> {
        let mut args = vec!["blockscopy".to_string()];
        args.extend(extra_args.iter().map(|arg| arg.to_string()));
        args.push(self.source.to_string_lossy().to_string());
        args.push(self.target.to_string_lossy().to_string());

        args
    }

    pub fn source_files(&self) -> BTreeSet<String> {
        list_files(&self.source)
    }

    pub fn target_files(&self) -> BTreeSet<String> {
        list_files(&self.target)
    }

    pub fn is_block_copied(&self, tenant: &str, block_id: &BlockId) -> bool {
        BLOCK_FILES.iter().all(|file| {
            let source = self.source.join(tenant).join(block_id.to_string()).join(file);
            let target = self.target.join(tenant).join(block_id.to_string()).join(file);

            target.is_file() && std::fs::read(source).unwrap() == std::fs::read(target).unwrap()
        })
    }
}

pub async fn run_cycle(args: Vec<String>) -> (CycleReport, CopyMetricsSnapshot) {
    let config = build_config_from_args(args).unwrap();
    let metrics = CopyMetrics::new_shared().unwrap();
    let pipeline = CopyPipeline::new(config, create_copy_cancellation_token(), metrics.clone())
        .await
        .unwrap();

    let report = pipeline.run_cycle().await;

    (report, metrics.snapshot())
}

pub fn write_file(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Relative paths of every file under `root`, with `/` separators.
pub fn list_files(root: &Path) -> BTreeSet<String> {
    if !root.is_dir() {
        return BTreeSet::new();
    }

    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|component| component.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

pub fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

#[cfg(feature = "e2e_test")]
pub struct TestHelper {
    client: Client,
}

#[cfg(feature = "e2e_test")]
impl TestHelper {
    pub async fn new() -> Self {
        Self {
            client: Self::create_client().await,
        }
    }

    pub async fn create_client() -> Client {
        Client::from_conf(Builder::from(&Self::load_sdk_config().await).build())
    }

    async fn load_sdk_config() -> SdkConfig {
        let config_loader =
            Self::load_config_credential(aws_config::defaults(BehaviorVersion::latest()))
                .region(Self::build_provider_region());

        config_loader.load().await
    }

    fn load_config_credential(config_loader: ConfigLoader) -> ConfigLoader {
        let builder = aws_config::profile::ProfileFileCredentialsProvider::builder();

        config_loader.credentials_provider(builder.profile_name(PROFILE_NAME).build())
    }

    fn build_provider_region() -> Box<dyn ProvideRegion> {
        let builder =
            aws_config::profile::ProfileFileRegionProvider::builder().profile_name(PROFILE_NAME);

        Box::new(RegionProviderChain::first_try(builder.build()))
    }

    pub async fn create_bucket(&self, bucket: &str, region: &str) {
        let constraint = BucketLocationConstraint::from(region);
        let cfg = CreateBucketConfiguration::builder()
            .location_constraint(constraint)
            .build();

        self.client
            .create_bucket()
            .create_bucket_configuration(cfg)
            .bucket(bucket)
            .send()
            .await
            .unwrap();
    }

    pub async fn is_bucket_exist(&self, bucket: &str) -> bool {
        let head_bucket_result = self.client.head_bucket().bucket(bucket).send().await;

        if head_bucket_result.is_ok() {
            return true;
        }

        !head_bucket_result
            .err()
            .unwrap()
            .into_service_error()
            .is_not_found()
    }

    pub async fn delete_bucket_with_cascade(&self, bucket: &str) {
        if !self.is_bucket_exist(bucket).await {
            return;
        }

        for key in self.list_keys(bucket, "").await {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .unwrap();
        }

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .unwrap();
    }

    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        let mut continuation_token = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .unwrap();

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            continuation_token = output.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() {
                return keys;
            }
        }
    }

    pub async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .unwrap();
    }

    pub async fn get_object(&self, bucket: &str, key: &str) -> Vec<u8> {
        self.client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap()
            .body
            .collect()
            .await
            .unwrap()
            .into_bytes()
            .to_vec()
    }

    pub async fn put_block(&self, bucket: &str, tenant: &str, hours: i64) -> BlockId {
        let block_id = BlockId::new();

        for file in BLOCK_FILES {
            let content = if file == "meta.json" {
                block_meta(&block_id, hours).into_bytes()
            } else {
                block_file_content(tenant, &block_id, file)
            };
            self.put_object(bucket, &format!("{tenant}/{block_id}/{file}"), content)
                .await;
        }

        block_id
    }
}
