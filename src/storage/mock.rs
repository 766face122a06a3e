use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::storage::{
    ObjectStream, Storage, StorageTrait, normalize_prefix, to_listing_entries,
};
use crate::types::error::BlocksCopyError;
use crate::types::{BlockId, DELIMITER, META_FILENAME};

/// In-memory bucket. Clones share the same objects, so a test can keep a handle
/// for inspection after boxing one into a [`Storage`].
#[derive(Clone)]
pub struct MockStorage {
    bucket: String,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    write_log: Mutex<Vec<String>>,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    list: HashSet<String>,
    get: HashSet<String>,
    put: HashSet<String>,
    copy: HashSet<String>,
}

impl MockStorage {
    pub fn new(bucket: &str) -> Self {
        MockStorage {
            bucket: bucket.to_string(),
            state: Arc::new(MockState::default()),
        }
    }

    pub fn boxed(&self) -> Storage {
        Box::new(self.clone())
    }

    /// Seeds an object without recording it in the write log.
    pub fn insert(&self, path: &str, body: &[u8]) {
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_vec());
    }

    /// Seeds a block with two data objects and a `meta.json` covering `hours`.
    pub fn insert_block(&self, tenant: &str, block_id: &BlockId, hours: i64) {
        let min_time = 1_614_556_800_000_i64;
        let max_time = min_time + hours * 60 * 60 * 1000;

        self.insert(&format!("{tenant}/{block_id}/chunks/000001"), b"chunks");
        self.insert(&format!("{tenant}/{block_id}/index"), b"index");
        self.insert(
            &format!("{tenant}/{block_id}/{META_FILENAME}"),
            format!(
                r#"{{"ulid":"{block_id}","minTime":{min_time},"maxTime":{max_time},"version":1}}"#
            )
            .as_bytes(),
        );
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state.objects.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Paths written through `put_object` or `copy_object`, in call order.
    pub fn write_log(&self) -> Vec<String> {
        self.state.write_log.lock().unwrap().clone()
    }

    pub fn fail_list(&self, prefix: &str) {
        self.state
            .faults
            .lock()
            .unwrap()
            .list
            .insert(normalize_prefix(prefix));
    }

    pub fn fail_get(&self, path: &str) {
        self.state.faults.lock().unwrap().get.insert(path.to_string());
    }

    pub fn fail_put(&self, path: &str) {
        self.state.faults.lock().unwrap().put.insert(path.to_string());
    }

    pub fn fail_copy(&self, path: &str) {
        self.state
            .faults
            .lock()
            .unwrap()
            .copy
            .insert(path.to_string());
    }

    /// Removes every injected fault, as if the failing dependency recovered.
    pub fn clear_faults(&self) {
        *self.state.faults.lock().unwrap() = Faults::default();
    }

    fn write(&self, path: &str, body: Vec<u8>) {
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(path.to_string(), body);
        self.state.write_log.lock().unwrap().push(path.to_string());
    }
}

#[async_trait]
impl StorageTrait for MockStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn get_client(&self) -> Option<Arc<Client>> {
        None
    }

    async fn list_prefix(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let prefix = normalize_prefix(prefix);

        if self.state.faults.lock().unwrap().list.contains(&prefix) {
            return Err(anyhow!("injected list failure."))
                .context(BlocksCopyError::ListError { prefix });
        }

        let paths = self
            .state
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect::<Vec<_>>();

        to_listing_entries(&prefix, &paths, recursive)
    }

    async fn get_object(&self, path: &str) -> Result<Vec<u8>> {
        if self.state.faults.lock().unwrap().get.contains(path) {
            return Err(anyhow!("injected get failure: {path}"));
        }

        self.state
            .objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                anyhow!(BlocksCopyError::ObjectNotFound {
                    path: path.to_string()
                })
            })
    }

    async fn get_object_stream(&self, path: &str) -> Result<ObjectStream> {
        let body = self.get_object(path).await?;

        Ok(ObjectStream {
            size: body.len() as u64,
            body: ByteStream::from(body),
        })
    }

    async fn put_object(&self, path: &str, body: Vec<u8>) -> Result<()> {
        if self.state.faults.lock().unwrap().put.contains(path) {
            return Err(anyhow!("injected put failure: {path}"));
        }

        if path.is_empty() || path.ends_with(DELIMITER) {
            return Err(anyhow!("invalid object path: {path}"));
        }

        self.write(path, body);
        Ok(())
    }

    async fn copy_object(&self, source: &Storage, path: &str) -> Result<()> {
        if self.state.faults.lock().unwrap().copy.contains(path) {
            return Err(anyhow!("injected copy failure: {path}"));
        }

        let stream = source.get_object_stream(path).await?;
        let body = stream
            .body
            .collect()
            .await
            .context("ByteStream::collect() failed.")?;
        self.write(path, body.into_bytes().to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shared_state_between_clones() {
        let storage = MockStorage::new("source-bucket");
        let boxed = storage.boxed();

        boxed
            .put_object("tenant-1/markers/marker", vec![])
            .await
            .unwrap();

        assert!(storage.contains("tenant-1/markers/marker"));
        assert_eq!(storage.write_log(), vec!["tenant-1/markers/marker"]);
        assert_eq!(boxed.bucket(), "source-bucket");
    }

    #[tokio::test]
    async fn injected_faults() {
        let storage = MockStorage::new("source-bucket");
        storage.insert("tenant-1/block/index", b"index");
        storage.fail_list("tenant-1");
        storage.fail_get("tenant-1/block/index");

        let e = storage.list_prefix("tenant-1/", false).await.unwrap_err();
        assert_eq!(
            e.downcast_ref::<BlocksCopyError>(),
            Some(&BlocksCopyError::ListError {
                prefix: "tenant-1/".to_string()
            })
        );
        assert!(storage.get_object("tenant-1/block/index").await.is_err());
        assert!(
            crate::types::error::is_not_found_error(
                &storage.get_object("tenant-1/block/missing").await.unwrap_err()
            )
        );
        assert_eq!(storage.list_prefix("", false).await.unwrap(), vec!["tenant-1/"]);

        storage.clear_faults();
        assert!(storage.list_prefix("tenant-1/", false).await.is_ok());
        let stream = storage
            .get_object_stream("tenant-1/block/index")
            .await
            .unwrap();
        assert_eq!(stream.size, 5);
    }
}
