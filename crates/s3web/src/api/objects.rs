use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{Method, header},
};
use tracing::debug;

use crate::api::AppState;
use crate::api::error::ApiError;
use crate::api::response::Outcome;
use crate::path;
use crate::storage::{Storage, StorageError};

/// Any method, any path: resolve the key and run the matching store call.
pub(super) async fn serve_object<S: Storage>(
    State(state): State<AppState<S>>,
    request: Request,
) -> Result<Outcome, ApiError> {
    let path = path::decode(request.uri().path())?;
    let resolved = path::resolve(&path, &state.index)?;
    let key = resolved.key;

    debug!(
        method = %request.method(),
        key = %key,
        fallback = resolved.used_fallback,
        "dispatching"
    );

    match *request.method() {
        Method::HEAD => {
            let if_none_match = request
                .headers()
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let meta = state
                .storage
                .head(&key, if_none_match.as_deref())
                .await?;
            Ok(Outcome::Found { meta, body: None })
        }
        Method::GET => {
            let object = state.storage.get(&key).await?;
            Ok(Outcome::Found {
                meta: object.meta,
                body: Some(object.body),
            })
        }
        Method::PUT => {
            // The whole upload is buffered before it is sent to the store.
            let data = to_bytes(request.into_body(), usize::MAX)
                .await
                .map_err(|err| StorageError::Internal {
                    code: None,
                    message: err.to_string(),
                    cause: None,
                })?;
            let etag = state.storage.put(&key, data).await?;
            Ok(Outcome::Created { key, etag })
        }
        Method::DELETE => {
            state.storage.delete(&key).await?;
            Ok(Outcome::Deleted)
        }
        _ => Err(ApiError::MethodNotAllowed(request.method().clone())),
    }
}
