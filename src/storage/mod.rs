use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use dyn_clone::DynClone;

use crate::config::ClientConfig;
use crate::types::token::CopyCancellationToken;
use crate::types::{DELIMITER, DELIMITER_STR, StoragePath};

pub mod local;
#[cfg(test)]
pub mod mock;
pub mod s3;

pub type Storage = Box<dyn StorageTrait + Send + Sync>;

pub struct StoragePair {
    pub source: Storage,
    pub target: Storage,
}

/// An object body that is read incrementally. `size` is the full length of the body.
#[derive(Debug)]
pub struct ObjectStream {
    pub body: ByteStream,
    pub size: u64,
}

#[async_trait]
pub trait StorageFactory {
    async fn create(
        path: StoragePath,
        cancellation_token: CopyCancellationToken,
        client_config: Option<ClientConfig>,
    ) -> Result<Storage>;
}

/// A flat, delimiter-aware object namespace. All paths are relative to the bucket root.
#[async_trait]
pub trait StorageTrait: DynClone {
    /// Bucket name, as recorded in copied markers.
    fn bucket(&self) -> &str;

    fn get_client(&self) -> Option<Arc<Client>>;

    /// Lists the entries under `prefix`. Returned paths are relative to the prefix and sorted.
    /// A non-recursive listing returns nested "directories" once, with a trailing delimiter.
    async fn list_prefix(&self, prefix: &str, recursive: bool) -> Result<Vec<String>>;

    /// A missing object fails with [`crate::types::error::BlocksCopyError::ObjectNotFound`].
    async fn get_object(&self, path: &str) -> Result<Vec<u8>>;

    /// Like [`StorageTrait::get_object`], without buffering the body in memory.
    async fn get_object_stream(&self, path: &str) -> Result<ObjectStream>;

    async fn put_object(&self, path: &str, body: Vec<u8>) -> Result<()>;

    /// Copies `path` from `source` to the same path in this storage. The body is streamed,
    /// or copied server-side when both storages are S3.
    async fn copy_object(&self, source: &Storage, path: &str) -> Result<()>;
}

/// `tenant` -> `tenant/`. The bucket root stays empty.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with(DELIMITER) {
        return prefix.to_string();
    }

    format!("{prefix}{DELIMITER_STR}")
}

/// Folds a list of full paths into the entries of a listing of `prefix`.
/// Nested paths collapse to their first segment when `recursive` is false.
pub fn to_listing_entries(prefix: &str, paths: &[String], recursive: bool) -> Result<Vec<String>> {
    let mut entries: Vec<String> = Vec::with_capacity(paths.len());

    for path in paths {
        let relative = path.strip_prefix(prefix).ok_or_else(|| {
            anyhow::anyhow!("listed path '{path}' does not start with prefix '{prefix}'.")
        })?;

        if relative.is_empty() {
            continue;
        }

        let entry = match relative.find(DELIMITER) {
            Some(index) if !recursive => &relative[..=index],
            _ => relative,
        };

        entries.push(entry.to_string());
    }

    entries.sort();
    entries.dedup();

    Ok(entries)
}
