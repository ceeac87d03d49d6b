use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use jiff::Timestamp;
use tokio::sync::RwLock;

use super::types::{CODE_NO_SUCH_KEY, CODE_NOT_FOUND, CODE_NOT_MODIFIED};
use super::{Object, ObjectMeta, Storage, StorageError};

const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

struct Entry {
    data: Bytes,
    meta: ObjectMeta,
}

/// In-process bucket, for local runs and tests.
///
/// Mirrors the S3 behaviours the server relies on: missing keys report
/// `NoSuchKey` (GET) or `NotFound` (HEAD), deletes of missing keys succeed,
/// and a matching `If-None-Match` on HEAD reports `NotModified`.
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Entry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn etag(data: &[u8]) -> String {
        format!("\"{}\"", blake3::hash(data).to_hex())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn head(
        &self,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectMeta, StorageError> {
        let objects = self.objects.read().await;
        let entry = objects
            .get(key)
            .ok_or_else(|| StorageError::from_code(key, CODE_NOT_FOUND, "Not Found", None))?;

        if let Some(tag) = if_none_match
            && entry.meta.etag.as_deref() == Some(tag)
        {
            return Err(StorageError::from_code(
                key,
                CODE_NOT_MODIFIED,
                "Not Modified",
                None,
            ));
        }

        Ok(entry.meta.clone())
    }

    async fn get(&self, key: &str) -> Result<Object, StorageError> {
        let objects = self.objects.read().await;
        let entry = objects.get(key).ok_or_else(|| {
            StorageError::from_code(
                key,
                CODE_NO_SUCH_KEY,
                "The specified key does not exist.",
                None,
            )
        })?;

        let data = entry.data.clone();
        Ok(Object {
            meta: entry.meta.clone(),
            body: futures::stream::once(async move { Ok(data) }).boxed(),
        })
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<Option<String>, StorageError> {
        let etag = Self::etag(&data);
        let meta = ObjectMeta {
            content_type: Some(DEFAULT_CONTENT_TYPE.to_owned()),
            content_length: Some(data.len() as u64),
            last_modified: Some(Timestamp::now()),
            etag: Some(etag.clone()),
        };

        self.objects
            .write()
            .await
            .insert(key.to_owned(), Entry { data, meta });
        Ok(Some(etag))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
