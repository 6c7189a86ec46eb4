//! The object store gateway capability.
//!
//! [`ObjectGateway`] is the boundary between the HTTP layer and object storage.
//! It exposes a single operation, [`fetch`](ObjectGateway::fetch), which returns
//! either object metadata with an open byte stream, a not-modified marker, or a
//! [`FetchError`].

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::FetchError;

/// Sentinel for a last-modified time the backend left unset.
///
/// A `Last-Modified` header is never emitted for this value.
pub const UNSET_TIMESTAMP: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Byte stream of an object's content.
///
/// Dropping the stream releases the underlying backend connection.
pub type ObjectBody = BoxStream<'static, Result<Bytes, io::Error>>;

/// Boxed future returned by [`ObjectGateway::fetch`].
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send>>;

/// A single object fetch derived from one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Bucket-relative object key.
    pub key: String,
    /// Only return the object if it changed after this instant.
    pub if_modified_since: Option<DateTime<Utc>>,
}

impl FetchRequest {
    /// Create an unconditional fetch for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            if_modified_since: None,
        }
    }

    /// Make the fetch conditional on `since`.
    #[must_use]
    pub fn with_if_modified_since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.if_modified_since = since;
        self
    }
}

/// Backend-reported object attributes.
///
/// `content_type` is carried for completeness but is never relayed to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// `Cache-Control` directive stored with the object.
    pub cache_control: Option<String>,
    /// Raw `Expires` value stored with the object.
    pub expires: Option<String>,
    /// `Content-Disposition` stored with the object.
    pub content_disposition: Option<String>,
    /// `Content-Encoding` stored with the object.
    pub content_encoding: Option<String>,
    /// `Content-Language` stored with the object.
    pub content_language: Option<String>,
    /// Size of the returned body in bytes.
    pub content_length: Option<i64>,
    /// `Content-Range` of the returned body.
    pub content_range: Option<String>,
    /// Content type stored with the object.
    pub content_type: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Successful result of a fetch.
pub enum FetchOutcome {
    /// The object, with its metadata and an open content stream.
    Found {
        /// Object attributes.
        metadata: ObjectMetadata,
        /// Object content.
        body: ObjectBody,
    },
    /// The object has not changed since the requested instant.
    NotModified,
}

impl fmt::Debug for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { metadata, .. } => f
                .debug_struct("Found")
                .field("metadata", metadata)
                .field("body", &"...")
                .finish(),
            Self::NotModified => f.write_str("NotModified"),
        }
    }
}

/// Capability to fetch objects from the configured bucket.
///
/// Implementations are shared across concurrent requests, hold no per-request
/// state, and never retry.
pub trait ObjectGateway: Send + Sync + 'static {
    /// Fetch the object identified by `request.key`.
    fn fetch(&self, request: FetchRequest) -> FetchFuture;
}
