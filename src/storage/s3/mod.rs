use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, trace};

use crate::config::{ClientConfig, TransferConfig};
use crate::storage::s3::upload_manager::UploadManager;
use crate::storage::{
    ObjectStream, Storage, StorageFactory, StorageTrait, normalize_prefix, to_listing_entries,
};
use crate::types::error::BlocksCopyError;
use crate::types::token::CopyCancellationToken;
use crate::types::{DELIMITER_STR, StoragePath};

mod client_builder;
mod upload_manager;

pub struct S3StorageFactory {}

#[async_trait]
impl StorageFactory for S3StorageFactory {
    async fn create(
        path: StoragePath,
        cancellation_token: CopyCancellationToken,
        client_config: Option<ClientConfig>,
    ) -> Result<Storage> {
        let client_config =
            client_config.ok_or_else(|| anyhow!("s3 client config not found."))?;

        S3Storage::boxed_new(
            path,
            cancellation_token,
            Arc::new(client_config.create_client().await),
            client_config.transfer_config,
        )
    }
}

#[derive(Clone)]
struct S3Storage {
    bucket: String,
    cancellation_token: CopyCancellationToken,
    client: Arc<Client>,
    transfer_config: TransferConfig,
}

impl S3Storage {
    fn boxed_new(
        path: StoragePath,
        cancellation_token: CopyCancellationToken,
        client: Arc<Client>,
        transfer_config: TransferConfig,
    ) -> Result<Storage> {
        let StoragePath::S3 { bucket } = path else {
            return Err(anyhow!("s3 path not found."));
        };

        Ok(Box::new(S3Storage {
            bucket,
            cancellation_token,
            client,
            transfer_config,
        }))
    }

    fn upload_manager(&self) -> UploadManager {
        UploadManager::new(
            self.client.clone(),
            self.transfer_config,
            self.cancellation_token.clone(),
        )
    }

    /// Size of an object in `source_client`'s bucket.
    async fn head_object_size(
        source_client: &Client,
        source_bucket: &str,
        path: &str,
    ) -> Result<u64> {
        let result = source_client
            .head_object()
            .bucket(source_bucket)
            .key(path)
            .send()
            .await;

        let head_object_output = match result {
            Ok(head_object_output) => head_object_output,
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|service_error| service_error.is_not_found())
                {
                    return Err(anyhow!(BlocksCopyError::ObjectNotFound {
                        path: path.to_string()
                    }));
                }

                return Err(e).context("aws_sdk_s3::client::head_object() failed.");
            }
        };

        head_object_output
            .content_length()
            .and_then(|content_length| u64::try_from(content_length).ok())
            .ok_or_else(|| anyhow!("head_object() returned no content length: {path}"))
    }

    async fn send_get_object(&self, path: &str) -> Result<GetObjectOutput> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await;

        match result {
            Ok(get_object_output) => Ok(get_object_output),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|service_error| service_error.is_no_such_key())
                {
                    return Err(anyhow!(BlocksCopyError::ObjectNotFound {
                        path: path.to_string()
                    }));
                }

                Err(e).context("aws_sdk_s3::client::get_object() failed.")
            }
        }
    }

    async fn list_keys(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let delimiter = if recursive {
            None
        } else {
            Some(DELIMITER_STR.to_string())
        };

        let mut keys = vec![];
        let mut continuation_token = None;
        loop {
            if self.cancellation_token.is_cancelled() {
                trace!(prefix = prefix, "list_prefix() canceled.");
                return Err(anyhow!(BlocksCopyError::Cancelled));
            }

            let list_objects_output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_delimiter(delimiter.clone())
                .set_continuation_token(continuation_token)
                .send()
                .await
                .context("aws_sdk_s3::client::list_objects_v2() failed.")?;

            keys.extend(
                list_objects_output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );
            keys.extend(
                list_objects_output
                    .common_prefixes()
                    .iter()
                    .filter_map(|common_prefix| common_prefix.prefix())
                    .map(str::to_string),
            );

            if !list_objects_output.is_truncated().unwrap_or_default() {
                break;
            }

            continuation_token = list_objects_output
                .next_continuation_token()
                .map(str::to_string);
        }

        to_listing_entries(prefix, &keys, recursive)
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn get_client(&self) -> Option<Arc<Client>> {
        Some(self.client.clone())
    }

    async fn list_prefix(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let prefix = normalize_prefix(prefix);

        self.list_keys(&prefix, recursive)
            .await
            .context(BlocksCopyError::ListError { prefix })
    }

    async fn get_object(&self, path: &str) -> Result<Vec<u8>> {
        let body = self
            .send_get_object(path)
            .await?
            .body
            .collect()
            .await
            .context("aws_sdk_s3::primitives::ByteStream::collect() failed.")?;

        Ok(body.into_bytes().to_vec())
    }

    async fn get_object_stream(&self, path: &str) -> Result<ObjectStream> {
        let get_object_output = self.send_get_object(path).await?;
        let size = get_object_output
            .content_length()
            .and_then(|content_length| u64::try_from(content_length).ok())
            .ok_or_else(|| anyhow!("get_object() returned no content length: {path}"))?;

        Ok(ObjectStream {
            body: get_object_output.body,
            size,
        })
    }

    async fn put_object(&self, path: &str, body: Vec<u8>) -> Result<()> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(body))
            .send()
            .await
            .context("aws_sdk_s3::client::put_object() failed.")?;

        debug!(
            bucket = self.bucket.as_str(),
            key = path,
            size = size,
            "object written."
        );

        Ok(())
    }

    async fn copy_object(&self, source: &Storage, path: &str) -> Result<()> {
        // only a bucket reachable through an S3 client can be the source of a server-side copy.
        let Some(source_client) = source.get_client() else {
            let object = source.get_object_stream(path).await?;
            let size = object.size;
            self.upload_manager().upload(&self.bucket, path, object).await?;

            debug!(
                bucket = self.bucket.as_str(),
                key = path,
                size = size,
                "object written."
            );
            return Ok(());
        };

        let size = Self::head_object_size(&source_client, source.bucket(), path).await?;
        self.upload_manager().copy(source.bucket(), &self.bucket, path, size).await?;

        debug!(
            source_bucket = source.bucket(),
            bucket = self.bucket.as_str(),
            key = path,
            size = size,
            "object copied."
        );

        Ok(())
    }
}

/// `x-amz-copy-source` value. The key is URL-encoded, the separating `/` is not.
fn build_copy_source(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split(DELIMITER_STR)
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join(DELIMITER_STR);

    format!("{bucket}{DELIMITER_STR}{encoded_key}")
}
