use anyhow::{Context, Result};
use tracing::debug;

use crate::Config;
use crate::config::ClientConfig;
use crate::storage::local::LocalStorageFactory;
use crate::storage::s3::S3StorageFactory;
use crate::storage::{Storage, StorageFactory, StoragePair};
use crate::types::StoragePath;
use crate::types::token::CopyCancellationToken;

pub async fn create_storage_pair(
    config: &Config,
    cancellation_token: CopyCancellationToken,
) -> Result<StoragePair> {
    let source = create_storage(
        config.source.clone(),
        config.source_client_config.clone(),
        cancellation_token.clone(),
    )
    .await
    .context("failed to create source storage.")?;

    let target = create_storage(
        config.target.clone(),
        config.target_client_config.clone(),
        cancellation_token,
    )
    .await
    .context("failed to create target storage.")?;

    debug!(
        source_bucket = source.bucket(),
        target_bucket = %config.target_bucket_name(),
        "storages have been created."
    );

    Ok(StoragePair { source, target })
}

async fn create_storage(
    storage_path: StoragePath,
    client_config: Option<ClientConfig>,
    cancellation_token: CopyCancellationToken,
) -> Result<Storage> {
    let factory_fn = match storage_path {
        StoragePath::S3 { .. } => S3StorageFactory::create,
        StoragePath::Local(_) => LocalStorageFactory::create,
    };

    factory_fn(storage_path, cancellation_token, client_config).await
}
