//! s3web - serve an S3 bucket over plain HTTP.
//!
//! Every request path is an object key. GET, HEAD, PUT and DELETE map to the
//! matching bucket operation, and store failures are turned into HTTP
//! statuses with a readable message.

pub mod api;
pub mod config;
pub mod path;
pub mod server;
pub mod storage;

pub use api::router;
pub use config::Config;
pub use storage::{ByteStream, MemoryStorage, ObjectMeta, S3Storage, Storage, StorageError};
