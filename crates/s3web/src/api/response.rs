use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use jiff::fmt::rfc2822;
use tracing::warn;

use crate::storage::{ByteStream, ObjectMeta};

/// A successful store call, ready to be rendered.
pub enum Outcome {
    /// GET (`body` present) or HEAD (`body` absent).
    Found {
        meta: ObjectMeta,
        body: Option<ByteStream>,
    },
    /// PUT
    Created { key: String, etag: Option<String> },
    /// DELETE
    Deleted,
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Found { meta, body } => {
                let headers = object_headers(&meta);
                let body = match body {
                    Some(stream) => Body::from_stream(stream),
                    None => Body::empty(),
                };
                (StatusCode::OK, headers, body).into_response()
            }
            Outcome::Created { key, etag } => {
                let mut headers = HeaderMap::new();
                insert(&mut headers, header::ETAG, etag.as_deref());
                insert(&mut headers, header::LOCATION, Some(&format!("/{key}")));
                (StatusCode::CREATED, headers).into_response()
            }
            Outcome::Deleted => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn object_headers(meta: &ObjectMeta) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, header::CONTENT_TYPE, meta.content_type.as_deref());

    let last_modified = meta.last_modified.and_then(|ts| {
        rfc2822::DateTimePrinter::new()
            .timestamp_to_rfc9110_string(&ts)
            .ok()
    });
    insert(&mut headers, header::LAST_MODIFIED, last_modified.as_deref());

    insert(&mut headers, header::ETAG, meta.etag.as_deref());
    if let Some(length) = meta.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    headers
}

/// Set `name` if there is a value and it is a legal header value.
fn insert(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value else {
        return;
    };
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, value, "dropping invalid header value"),
    }
}
