use std::sync::Arc;

use axum::Router;
use axum::body::HttpBody;
use axum::http::{Response, header};
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{NotForContentType, Predicate};
use tower_http::trace::TraceLayer;

use crate::storage::Storage;

mod error;
mod objects;
mod response;

pub use error::ApiError;
pub use response::Outcome;

/// Per-process request context, shared read-only by all handlers.
pub struct AppState<S: Storage> {
    pub storage: Arc<S>,
    /// Object name served for directory-like paths; empty disables it.
    pub index: Arc<str>,
}

impl<S: Storage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            index: Arc::clone(&self.index),
        }
    }
}

/// Every path is an object key, so there are no routes: all requests land on
/// the fallback.
pub fn router<S: Storage>(storage: S, index: impl Into<String>) -> Router {
    let state = AppState {
        storage: Arc::new(storage),
        index: Arc::from(index.into()),
    };

    Router::new()
        .fallback(objects::serve_object::<S>)
        .with_state(state)
        .layer(
            CompressionLayer::new().gzip(true).compress_when(
                ObjectSizeAbove(MIN_COMPRESS_SIZE)
                    .and(NotForContentType::GRPC)
                    .and(NotForContentType::IMAGES)
                    .and(NotForContentType::SSE),
            ),
        )
        .layer(TraceLayer::new_for_http())
}

const MIN_COMPRESS_SIZE: u64 = 32;

/// Compress when the object is at least this many bytes.
///
/// The size comes from `Content-Length` before the body, so a HEAD response
/// (empty body, full length) is encoded exactly as the matching GET would be.
#[derive(Debug, Clone, Copy)]
struct ObjectSizeAbove(u64);

impl Predicate for ObjectSizeAbove {
    fn should_compress<B>(&self, response: &Response<B>) -> bool
    where
        B: HttpBody,
    {
        let size = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .or_else(|| response.body().size_hint().exact());

        size.is_none_or(|size| size >= self.0)
    }
}
