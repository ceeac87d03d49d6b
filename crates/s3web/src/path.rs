//! Mapping of request paths to object keys.

use percent_encoding::percent_decode_str;

use crate::storage::StorageError;

const SEPARATOR: char = '/';

/// The object key a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    /// Whether the directory index name was appended.
    pub used_fallback: bool,
}

/// Resolve a (decoded) request path into an object key.
///
/// The single leading `/` is dropped. A path that is empty or ends in `/`
/// names a directory: `index` is appended to it, or the request is rejected
/// when no index is configured. Keys are otherwise passed through verbatim:
/// `..` segments and repeated slashes reach the store unchanged.
pub fn resolve(path: &str, index: &str) -> Result<ResolvedKey, StorageError> {
    let candidate = path.strip_prefix(SEPARATOR).unwrap_or(path);

    if candidate.is_empty() || candidate.ends_with(SEPARATOR) {
        if index.is_empty() {
            return Err(StorageError::BadRequest("Path must be provided".into()));
        }
        return Ok(ResolvedKey {
            key: format!("{candidate}{index}"),
            used_fallback: true,
        });
    }

    Ok(ResolvedKey {
        key: candidate.to_owned(),
        used_fallback: false,
    })
}

/// Percent-decode a raw URI path.
pub fn decode(raw: &str) -> Result<String, StorageError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|_| StorageError::BadRequest("Path must be valid UTF-8".into()))
}
