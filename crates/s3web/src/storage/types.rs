use std::io;

use jiff::Timestamp;
use thiserror::Error;

/// Store error codes with a dedicated classification. Everything else is
/// [`StorageError::Internal`].
pub const CODE_MISSING_CONTENT_LENGTH: &str = "MissingContentLength";
pub const CODE_NOT_MODIFIED: &str = "NotModified";
pub const CODE_NO_SUCH_KEY: &str = "NoSuchKey";
pub const CODE_NOT_FOUND: &str = "NotFound";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Object not modified")]
    NotModified,

    #[error("Path '{key}' not found: {message}")]
    NotFound { key: String, message: String },

    #[error(
        "An internal error occurred: {}{message}{}",
        .code.as_deref().map(|c| format!("{c} = ")).unwrap_or_default(),
        .cause.as_deref().map(|c| format!(" (Cause: {c})")).unwrap_or_default()
    )]
    Internal {
        code: Option<String>,
        message: String,
        cause: Option<String>,
    },
}

/// Coarse classification of a [`StorageError`]; one per response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotModified,
    NotFound,
    Internal,
}

impl StorageError {
    /// Classify an error code reported by the backing store for `key`.
    pub fn from_code(
        key: &str,
        code: &str,
        message: impl Into<String>,
        cause: Option<String>,
    ) -> Self {
        match code {
            CODE_MISSING_CONTENT_LENGTH => Self::BadRequest("Bad Request".into()),
            CODE_NOT_MODIFIED => Self::NotModified,
            CODE_NO_SUCH_KEY | CODE_NOT_FOUND => Self::NotFound {
                key: key.to_owned(),
                message: message.into(),
            },
            _ => Self::Internal {
                code: Some(code.to_owned()),
                message: message.into(),
                cause,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::NotModified => ErrorKind::NotModified,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        Self::Internal {
            code: None,
            message: err.to_string(),
            cause: None,
        }
    }
}

/// Metadata about a stored object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    pub content_type: Option<String>,
    /// Size in bytes, when the store reported one.
    pub content_length: Option<u64>,
    pub last_modified: Option<Timestamp>,
    pub etag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_content_length_is_bad_request() {
        let err = StorageError::from_code("a.txt", "MissingContentLength", "no length", None);
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "Bad Request");
    }

    #[test]
    fn test_not_modified() {
        let err = StorageError::from_code("a.txt", "NotModified", "", None);
        assert_eq!(err.kind(), ErrorKind::NotModified);
        assert_eq!(err.to_string(), "Object not modified");
    }

    #[test]
    fn test_both_not_found_codes() {
        for code in ["NoSuchKey", "NotFound"] {
            let err = StorageError::from_code(
                "dir/a.txt",
                code,
                "The specified key does not exist.",
                None,
            );
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(
                err.to_string(),
                "Path 'dir/a.txt' not found: The specified key does not exist."
            );
        }
    }

    #[test]
    fn test_unknown_codes_are_internal() {
        for code in ["AccessDenied", "NoSuchBucket", "SlowDown", "", "nosuchkey"] {
            let err = StorageError::from_code("a.txt", code, "boom", None);
            assert_eq!(err.kind(), ErrorKind::Internal, "code {code:?}");
        }
    }

    #[test]
    fn test_internal_message_with_cause() {
        let err = StorageError::from_code(
            "a.txt",
            "RequestError",
            "send request failed",
            Some("connection refused".into()),
        );
        assert_eq!(
            err.to_string(),
            "An internal error occurred: RequestError = send request failed (Cause: connection refused)"
        );
    }

    #[test]
    fn test_internal_message_without_cause() {
        let err = StorageError::from_code("a.txt", "AccessDenied", "Access Denied", None);
        assert_eq!(
            err.to_string(),
            "An internal error occurred: AccessDenied = Access Denied"
        );
    }

    #[test]
    fn test_io_error_has_no_code() {
        let err = StorageError::from(io::Error::other("disk on fire"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "An internal error occurred: disk on fire");
    }
}
