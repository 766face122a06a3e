use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::io::AsyncReadExt;
use tracing::{debug, trace, warn};

use crate::config::TransferConfig;
use crate::storage::ObjectStream;
use crate::storage::s3::build_copy_source;
use crate::types::error::BlocksCopyError;
use crate::types::token::CopyCancellationToken;

/// Writes objects into an S3 bucket. Objects at or above the multipart threshold are
/// transferred in parts so that no body has to be held in memory as a whole.
pub struct UploadManager {
    client: Arc<Client>,
    transfer_config: TransferConfig,
    cancellation_token: CopyCancellationToken,
}

impl UploadManager {
    pub fn new(
        client: Arc<Client>,
        transfer_config: TransferConfig,
        cancellation_token: CopyCancellationToken,
    ) -> Self {
        UploadManager {
            client,
            transfer_config,
            cancellation_token,
        }
    }

    /// Uploads a streamed body, as a single `PutObject` or as a multipart upload.
    pub async fn upload(&self, bucket: &str, key: &str, object: ObjectStream) -> Result<()> {
        if !self.transfer_config.is_multipart_upload_required(object.size) {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_length(object.size as i64)
                .body(object.body)
                .send()
                .await
                .context("aws_sdk_s3::client::Client put_object() failed.")?;

            return Ok(());
        }

        let upload_id = self.create_multipart_upload(bucket, key).await?;
        let result = self
            .upload_parts(bucket, key, &upload_id, object)
            .await
            .context("upload_parts() failed.");

        self.complete_or_abort(bucket, key, &upload_id, result).await
    }

    /// Copies an object between buckets without downloading it. `size` is the length of
    /// the source object.
    pub async fn copy(
        &self,
        source_bucket: &str,
        bucket: &str,
        key: &str,
        size: u64,
    ) -> Result<()> {
        let copy_source = build_copy_source(source_bucket, key);

        if !self.transfer_config.is_multipart_upload_required(size) {
            self.client
                .copy_object()
                .copy_source(copy_source)
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .context("aws_sdk_s3::client::Client copy_object() failed.")?;

            return Ok(());
        }

        let upload_id = self.create_multipart_upload(bucket, key).await?;
        let result = self
            .upload_part_copies(&copy_source, bucket, key, &upload_id, size)
            .await
            .context("upload_part_copies() failed.");

        self.complete_or_abort(bucket, key, &upload_id, result).await
    }

    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String> {
        let create_multipart_upload_output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context("aws_sdk_s3::client::Client create_multipart_upload() failed.")?;

        create_multipart_upload_output
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("create_multipart_upload() returned no upload id."))
    }

    async fn complete_or_abort(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        upload_parts: Result<Vec<CompletedPart>>,
    ) -> Result<()> {
        let upload_parts = match upload_parts {
            Ok(upload_parts) => upload_parts,
            Err(e) => {
                self.abort_multipart_upload(bucket, key, upload_id).await;
                return Err(e);
            }
        };

        let parts = upload_parts.len();
        let result = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(upload_parts))
                    .build(),
            )
            .send()
            .await
            .context("aws_sdk_s3::client::Client complete_multipart_upload() failed.");

        if let Err(e) = result {
            self.abort_multipart_upload(bucket, key, upload_id).await;
            return Err(e);
        }

        debug!(
            bucket = bucket,
            key = key,
            parts = parts,
            "multipart upload completed."
        );

        Ok(())
    }

    // The original error is what matters to the caller, a failed abort is only logged.
    async fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str) {
        let result = self
            .client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await;

        if let Err(e) = result {
            warn!(
                bucket = bucket,
                key = key,
                upload_id = upload_id,
                error = e.to_string(),
                "aws_sdk_s3::client::Client abort_multipart_upload() failed."
            );
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        object: ObjectStream,
    ) -> Result<Vec<CompletedPart>> {
        let part_size = self.transfer_config.part_size(object.size);
        let mut upload_parts: Vec<CompletedPart> = Vec::new();

        let mut part_number = 1;
        let mut remaining_bytes = object.size;

        let mut body = object.body.into_async_read();
        while 0 < remaining_bytes {
            if self.cancellation_token.is_cancelled() {
                return Err(anyhow!(BlocksCopyError::Cancelled));
            }

            let chunksize = remaining_bytes.min(part_size);

            let mut buffer = vec![0_u8; chunksize as usize];
            body.read_exact(buffer.as_mut_slice())
                .await
                .context("async_read_ext::AsyncReadExt read_exact() failed.")?;

            let upload_part_output = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .content_length(chunksize as i64)
                .body(ByteStream::from(buffer))
                .send()
                .await
                .context("aws_sdk_s3::client::Client upload_part() failed.")?;

            trace!(key = key, part_number = part_number, "part uploaded.");

            upload_parts.push(
                CompletedPart::builder()
                    .set_e_tag(upload_part_output.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );

            remaining_bytes -= chunksize;
            part_number += 1;
        }

        Ok(upload_parts)
    }

    async fn upload_part_copies(
        &self,
        copy_source: &str,
        bucket: &str,
        key: &str,
        upload_id: &str,
        size: u64,
    ) -> Result<Vec<CompletedPart>> {
        let mut upload_parts: Vec<CompletedPart> = Vec::new();

        for (part_number, (first_byte, last_byte)) in
            (1..).zip(part_ranges(size, self.transfer_config.part_size(size)))
        {
            if self.cancellation_token.is_cancelled() {
                return Err(anyhow!(BlocksCopyError::Cancelled));
            }

            let upload_part_copy_output = self
                .client
                .upload_part_copy()
                .copy_source(copy_source)
                .copy_source_range(format!("bytes={first_byte}-{last_byte}"))
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .send()
                .await
                .context("aws_sdk_s3::client::Client upload_part_copy() failed.")?;

            trace!(key = key, part_number = part_number, "part copied.");

            upload_parts.push(
                CompletedPart::builder()
                    .set_e_tag(
                        upload_part_copy_output
                            .copy_part_result()
                            .and_then(|result| result.e_tag())
                            .map(str::to_string),
                    )
                    .part_number(part_number)
                    .build(),
            );
        }

        Ok(upload_parts)
    }
}

/// Inclusive byte ranges covering `size` bytes in parts of `part_size`.
fn part_ranges(size: u64, part_size: u64) -> Vec<(u64, u64)> {
    (0..size)
        .step_by(part_size.max(1) as usize)
        .map(|first_byte| (first_byte, (first_byte + part_size).min(size) - 1))
        .collect()
}
