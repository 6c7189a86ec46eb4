//! Request translation and response mapping.
//!
//! [`ProxyHandler`] turns one inbound request into a [`FetchRequest`], hands it to
//! the [`ObjectGateway`], and maps the result onto an HTTP response:
//!
//! ```text
//! path + If-Modified-Since
//!   -> FetchRequest { key: prefix + path, if_modified_since }
//!   -> ObjectGateway::fetch
//!   -> 200 + metadata headers + relayed body
//!    | 304 with no body
//!    | failure status + plain-text message
//! ```

use chrono::{DateTime, Utc};
use http::StatusCode;
use http::header::{self, HeaderMap};
use s3proxy_core::{
    FetchError, FetchOutcome, FetchRequest, ObjectBody, ObjectGateway, ObjectMetadata,
    ProxyConfig,
};
use tracing::{debug, error, warn};

use crate::body::ProxyResponseBody;
use crate::headers::{parse_http_date, set_object_metadata_headers};

/// Derive the object key for a request path.
///
/// The path is appended to the prefix verbatim: no percent-decoding, no
/// dot-segment removal, no slash collapsing.
///
/// ```
/// use s3proxy_http::handler::object_key;
///
/// assert_eq!(object_key("/site", "/a/b"), "/site/a/b");
/// assert_eq!(object_key("", "/a/../b"), "/a/../b");
/// ```
#[must_use]
pub fn object_key(prefix: &str, path: &str) -> String {
    format!("{prefix}{path}")
}

/// Extract the `If-Modified-Since` condition from request headers.
///
/// Missing, non-ASCII, unparseable, or future dates all mean "no condition".
#[must_use]
pub fn if_modified_since(headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
        .filter(|since| *since <= now)
}

/// Translates requests into gateway fetches and fetch results into responses.
#[derive(Debug)]
pub struct ProxyHandler<G: ObjectGateway> {
    gateway: G,
    key_prefix: String,
}

impl<G: ObjectGateway> ProxyHandler<G> {
    /// Create a handler serving keys under `key_prefix`.
    #[must_use]
    pub fn new(gateway: G, key_prefix: impl Into<String>) -> Self {
        Self {
            gateway,
            key_prefix: key_prefix.into(),
        }
    }

    /// Create a handler using the key prefix from `config`.
    #[must_use]
    pub fn from_config(gateway: G, config: &ProxyConfig) -> Self {
        Self::new(gateway, config.key_prefix.clone())
    }

    /// Prefix prepended to every request path.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Build the gateway request for an inbound request.
    #[must_use]
    pub fn fetch_request(&self, parts: &http::request::Parts) -> FetchRequest {
        FetchRequest::new(object_key(&self.key_prefix, parts.uri.path()))
            .with_if_modified_since(if_modified_since(&parts.headers, Utc::now()))
    }

    /// Handle one request. Every outcome, including failures, becomes a response.
    pub async fn handle(
        &self,
        parts: &http::request::Parts,
        request_id: &str,
    ) -> http::Response<ProxyResponseBody> {
        let path = parts.uri.path();
        let request = self.fetch_request(parts);
        let key = request.key.clone();

        match self.gateway.fetch(request).await {
            Ok(FetchOutcome::Found { metadata, body }) => {
                debug!(path, key = %key, request_id, "relaying object");
                object_response(&metadata, body)
            }
            Ok(FetchOutcome::NotModified) => {
                debug!(path, key = %key, request_id, "object not modified");
                not_modified_response()
            }
            Err(err) => {
                warn!(
                    path,
                    key = %key,
                    status = err.status_code().as_u16(),
                    error = %err,
                    request_id,
                    "object fetch failed"
                );
                failure_response(&err)
            }
        }
    }
}

/// `200 OK` with the relayed metadata headers and the object stream as body.
fn object_response(
    metadata: &ObjectMetadata,
    body: ObjectBody,
) -> http::Response<ProxyResponseBody> {
    let builder = http::Response::builder().status(StatusCode::OK);
    set_object_metadata_headers(builder, metadata)
        .body(ProxyResponseBody::streaming(body))
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to build object response");
            http::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(ProxyResponseBody::empty())
                .expect("static response should be valid")
        })
}

/// `304 Not Modified` with no metadata headers and no body.
fn not_modified_response() -> http::Response<ProxyResponseBody> {
    http::Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .body(ProxyResponseBody::empty())
        .expect("static not-modified response should be valid")
}

/// Failure status with the message as a plain-text body.
fn failure_response(err: &FetchError) -> http::Response<ProxyResponseBody> {
    http::Response::builder()
        .status(err.status_code())
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(ProxyResponseBody::from_string(err.message()))
        .expect("failure response should be valid")
}
