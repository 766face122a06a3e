use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::config::ClientConfig;
use crate::storage::{
    ObjectStream, Storage, StorageFactory, StorageTrait, normalize_prefix, to_listing_entries,
};
use crate::types::error::BlocksCopyError;
use crate::types::token::CopyCancellationToken;
use crate::types::{DELIMITER, DELIMITER_STR, StoragePath};

pub mod fs_util;

pub struct LocalStorageFactory {}

#[async_trait]
impl StorageFactory for LocalStorageFactory {
    async fn create(
        path: StoragePath,
        cancellation_token: CopyCancellationToken,
        _client_config: Option<ClientConfig>,
    ) -> Result<Storage> {
        LocalStorage::boxed_new(path, cancellation_token)
    }
}

/// A directory standing in for a bucket. Object paths map onto files below it.
#[derive(Clone)]
struct LocalStorage {
    bucket: String,
    path: PathBuf,
    cancellation_token: CopyCancellationToken,
}

impl LocalStorage {
    fn boxed_new(path: StoragePath, cancellation_token: CopyCancellationToken) -> Result<Storage> {
        let bucket = path.bucket_name();
        let StoragePath::Local(path) = path else {
            return Err(anyhow!("local path not found."));
        };

        Ok(Box::new(LocalStorage {
            bucket,
            path,
            cancellation_token,
        }))
    }

    fn walk(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let directory = fs_util::key_to_file_path(&self.path, prefix);
        if !directory.is_dir() {
            return Ok(vec![]);
        }

        let mut walker = WalkDir::new(&directory).min_depth(1);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut paths = vec![];
        for entry in walker {
            if self.cancellation_token.is_cancelled() {
                trace!(prefix = prefix, "list_prefix() canceled.");
                return Err(anyhow!(BlocksCopyError::Cancelled));
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_not_found(&e) => continue,
                Err(e) => {
                    return Err(e).context(format!("walkdir failed: {}", directory.display()));
                }
            };

            if fs_util::is_temp_file(entry.file_name()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .context("entry outside of the bucket directory.")?;
            let mut key = fs_util::path_to_key(relative);

            if entry.file_type().is_dir() {
                if recursive {
                    continue;
                }
                key.push(DELIMITER);
            }

            paths.push(key);
        }

        to_listing_entries(prefix, &paths, recursive)
    }
}

#[async_trait]
impl StorageTrait for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn get_client(&self) -> Option<Arc<Client>> {
        None
    }

    async fn list_prefix(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let prefix = normalize_prefix(prefix);

        self.walk(&prefix, recursive)
            .context(BlocksCopyError::ListError { prefix })
    }

    async fn get_object(&self, path: &str) -> Result<Vec<u8>> {
        let real_path = fs_util::key_to_file_path(&self.path, path);

        match tokio::fs::read(&real_path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(anyhow!(BlocksCopyError::ObjectNotFound {
                    path: path.to_string()
                }))
            }
            Err(e) => Err(e).context(format!("tokio::fs::read() failed: {}", real_path.display())),
        }
    }

    async fn get_object_stream(&self, path: &str) -> Result<ObjectStream> {
        let real_path = fs_util::key_to_file_path(&self.path, path);

        let size = match tokio::fs::metadata(&real_path).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            Ok(_) => {
                return Err(anyhow!(BlocksCopyError::ObjectNotFound {
                    path: path.to_string()
                }));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(anyhow!(BlocksCopyError::ObjectNotFound {
                    path: path.to_string()
                }));
            }
            Err(e) => {
                return Err(e).context(format!(
                    "tokio::fs::metadata() failed: {}",
                    real_path.display()
                ));
            }
        };

        let body = ByteStream::from_path(&real_path)
            .await
            .context(format!("ByteStream::from_path() failed: {}", real_path.display()))?;

        Ok(ObjectStream { body, size })
    }

    async fn put_object(&self, path: &str, body: Vec<u8>) -> Result<()> {
        self.write_object(path, body.as_slice()).await
    }

    async fn copy_object(&self, source: &Storage, path: &str) -> Result<()> {
        let stream = source.get_object_stream(path).await?;
        self.write_object(path, stream.body.into_async_read()).await
    }
}

impl LocalStorage {
    /// Streams `reader` into a temporary file next to the destination, then renames it
    /// into place so that readers never observe a partial object.
    async fn write_object<R>(&self, path: &str, mut reader: R) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        if path.is_empty() || path.ends_with(DELIMITER) || has_parent_component(path) {
            return Err(anyhow!("invalid object path: {path}"));
        }

        let real_path = fs_util::key_to_file_path(&self.path, path);
        let directory = real_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.path.clone());
        tokio::fs::create_dir_all(&directory)
            .await
            .context("tokio::fs::create_dir_all() failed.")?;

        let temp_file = fs_util::create_temp_file(&directory)?;
        let mut file = tokio::fs::File::from_std(
            temp_file
                .reopen()
                .context("NamedTempFile::reopen() failed.")?,
        );
        let size = tokio::io::copy(&mut reader, &mut file)
            .await
            .context("tokio::io::copy() failed.")?;
        file.flush().await?;
        drop(file);

        temp_file
            .persist(&real_path)
            .context(format!("NamedTempFile::persist() failed: {}", real_path.display()))?;

        debug!(
            bucket = self.bucket.as_str(),
            key = path,
            size = size,
            "object written."
        );

        Ok(())
    }
}

fn is_not_found(e: &walkdir::Error) -> bool {
    e.io_error()
        .is_some_and(|inner| inner.kind() == io::ErrorKind::NotFound)
}

fn has_parent_component(path: &str) -> bool {
    path.split(DELIMITER_STR).any(|segment| segment == "..")
}
