use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

mod memory;
mod s3;
mod types;

pub use memory::MemoryStorage;
pub use s3::S3Storage;
pub use types::{ErrorKind, ObjectMeta, StorageError};

/// A boxed stream of byte chunks for streaming reads
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// An object fetched with `get`: its metadata and a body stream.
pub struct Object {
    pub meta: ObjectMeta,
    pub body: ByteStream,
}

/// A bucket of objects addressed by key.
///
/// Each call is a single round trip to the backing store: no retries and no
/// caching. Failures are always classified into a [`StorageError`].
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Fetch object metadata without the body.
    ///
    /// When `if_none_match` is given and equals the current ETag, the store
    /// reports [`StorageError::NotModified`].
    async fn head(
        &self,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectMeta, StorageError>;

    /// Fetch an object as a stream.
    async fn get(&self, key: &str) -> Result<Object, StorageError>;

    /// Store an object, returning its ETag if the store reports one.
    async fn put(&self, key: &str, data: Bytes) -> Result<Option<String>, StorageError>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: Storage> Storage for Arc<S> {
    async fn head(
        &self,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectMeta, StorageError> {
        (**self).head(key, if_none_match).await
    }

    async fn get(&self, key: &str) -> Result<Object, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<Option<String>, StorageError> {
        (**self).put(key, data).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }
}
