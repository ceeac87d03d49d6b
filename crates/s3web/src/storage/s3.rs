use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream as SdkByteStream, DateTime};
use bytes::Bytes;
use futures::StreamExt;
use jiff::Timestamp;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::types::{CODE_NOT_FOUND, CODE_NOT_MODIFIED};
use super::{Object, ObjectMeta, Storage, StorageError};

/// A bucket on S3 (or any S3-compatible endpoint).
///
/// The client is connection-pooled and cheap to share; one instance serves
/// every request.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the default AWS provider chain (environment,
    /// profile, instance metadata) pinned to `region`.
    pub async fn from_env(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config), bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn head(
        &self,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectMeta, StorageError> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .set_if_none_match(if_none_match.map(ToOwned::to_owned))
            .send()
            .await
            .map_err(|err| classify(key, err))?;

        Ok(ObjectMeta {
            content_type: output.content_type().map(ToOwned::to_owned),
            content_length: content_length(output.content_length()),
            last_modified: output.last_modified().and_then(to_timestamp),
            etag: output.e_tag().map(ToOwned::to_owned),
        })
    }

    async fn get(&self, key: &str) -> Result<Object, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(key, err))?;

        let meta = ObjectMeta {
            content_type: output.content_type().map(ToOwned::to_owned),
            content_length: content_length(output.content_length()),
            last_modified: output.last_modified().and_then(to_timestamp),
            etag: output.e_tag().map(ToOwned::to_owned),
        };

        let reader = output.body.into_async_read();
        let body = ReaderStream::new(reader)
            .map(|chunk| chunk.map_err(StorageError::from))
            .boxed();

        Ok(Object { meta, body })
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<Option<String>, StorageError> {
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(SdkByteStream::from(data))
            .send()
            .await
            .map_err(|err| classify(key, err))?;

        Ok(output.e_tag().map(ToOwned::to_owned))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(key, err))?;
        Ok(())
    }
}

fn content_length(length: Option<i64>) -> Option<u64> {
    length.and_then(|l| u64::try_from(l).ok())
}

fn to_timestamp(dt: &DateTime) -> Option<Timestamp> {
    Timestamp::new(dt.secs(), i32::try_from(dt.subsec_nanos()).ok()?).ok()
}

/// Turn an SDK failure into a [`StorageError`].
///
/// Service errors keep the code S3 reported. HEAD responses carry no body, so
/// their code may be missing; it is then taken from the HTTP status. Failures
/// that never produced a response get a transport code and carry the SDK's
/// error chain as the cause.
fn classify<E>(key: &str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    debug!(key, error = %DisplayErrorContext(&err), "S3 request failed");

    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err
        .code()
        .or_else(|| status.and_then(code_for_status))
        .unwrap_or_else(|| transport_code(&err))
        .to_owned();
    let message = err
        .message()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| match status {
            Some(status) => format!("HTTP status {status}"),
            None => err.to_string(),
        });
    let cause = match &err {
        SdkError::ServiceError(_) => None,
        _ => std::error::Error::source(&err)
            .map(|source| DisplayErrorContext(source).to_string()),
    };

    StorageError::from_code(key, &code, message, cause)
}

fn code_for_status(status: u16) -> Option<&'static str> {
    match status {
        304 => Some(CODE_NOT_MODIFIED),
        404 => Some(CODE_NOT_FOUND),
        _ => None,
    }
}

fn transport_code<E, R>(err: &SdkError<E, R>) -> &'static str {
    match err {
        SdkError::ConstructionFailure(_) => "RequestConstructionError",
        SdkError::TimeoutError(_) => "RequestTimeout",
        SdkError::DispatchFailure(_) => "RequestError",
        SdkError::ResponseError(_) => "ResponseError",
        _ => "UnknownError",
    }
}
