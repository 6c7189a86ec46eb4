//! [`ObjectGateway`] backed by `aws-sdk-s3`.
//!
//! The client is built once from [`ProxyConfig`] with path-style addressing and
//! shared by every fetch. A `304` from the backend becomes
//! [`FetchOutcome::NotModified`]; any other service error keeps the backend's
//! status. Everything else, including responses the SDK could not parse, is a
//! transport failure.

use std::io;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::debug;

use crate::config::ProxyConfig;
use crate::error::FetchError;
use crate::gateway::{
    FetchFuture, FetchOutcome, FetchRequest, ObjectBody, ObjectGateway, ObjectMetadata,
};

/// Gateway fetching objects from a single S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Gateway {
    client: Client,
    bucket: String,
}

impl S3Gateway {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the proxy configuration.
    ///
    /// Empty endpoint and region fall back to the AWS SDK defaults. Credentials
    /// always come from the default provider chain.
    pub async fn from_config(config: &ProxyConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if !config.region.is_empty() {
            loader = loader.region(Region::new(config.region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(true);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(&config.endpoint);
        }

        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }
}

impl ObjectGateway for S3Gateway {
    fn fetch(&self, request: FetchRequest) -> FetchFuture {
        let client = self.client.clone();
        let bucket = self.bucket.clone();

        Box::pin(async move {
            debug!(
                bucket = %bucket,
                key = %request.key,
                if_modified_since = ?request.if_modified_since,
                "fetching object"
            );

            let result = client
                .get_object()
                .bucket(bucket)
                .key(request.key)
                .set_if_modified_since(request.if_modified_since.map(to_smithy_datetime))
                .send()
                .await;

            match result {
                Ok(output) => Ok(found(output)),
                Err(err) => outcome_from_error(&err),
            }
        })
    }
}

/// Split a `GetObject` output into metadata and content stream.
fn found(output: GetObjectOutput) -> FetchOutcome {
    let metadata = ObjectMetadata {
        cache_control: output.cache_control().map(str::to_owned),
        expires: output.expires_string().map(str::to_owned),
        content_disposition: output.content_disposition().map(str::to_owned),
        content_encoding: output.content_encoding().map(str::to_owned),
        content_language: output.content_language().map(str::to_owned),
        content_length: output.content_length(),
        content_range: output.content_range().map(str::to_owned),
        content_type: output.content_type().map(str::to_owned),
        last_modified: output.last_modified().and_then(from_smithy_datetime),
    };

    FetchOutcome::Found {
        metadata,
        body: object_body(output.body),
    }
}

/// Classify a failed `GetObject`.
fn outcome_from_error(err: &SdkError<GetObjectError>) -> Result<FetchOutcome, FetchError> {
    // Only service errors carry a backend-reported status. A response the SDK
    // failed to parse may still hold a 200.
    let SdkError::ServiceError(ctx) = err else {
        return Err(FetchError::transport(DisplayErrorContext(err).to_string()));
    };

    let status = ctx.raw().status().as_u16();
    if status == 304 {
        return Ok(FetchOutcome::NotModified);
    }

    Err(FetchError::backend(status, backend_message(err)))
}

/// Render the backend's error code and message, e.g. `NoSuchKey: The specified key does not exist.`
fn backend_message(err: &SdkError<GetObjectError>) -> String {
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(text), None) | (None, Some(text)) => text.to_owned(),
        (None, None) => DisplayErrorContext(err).to_string(),
    }
}

/// Adapt the SDK byte stream to an [`ObjectBody`].
fn object_body(stream: ByteStream) -> ObjectBody {
    futures::stream::try_unfold(stream, |mut stream| async move {
        let chunk = stream.try_next().await.map_err(io::Error::other)?;
        Ok(chunk.map(|bytes| (bytes, stream)))
    })
    .boxed()
}

// HTTP dates carry whole seconds.
fn to_smithy_datetime(value: DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs(value.timestamp())
}

fn from_smithy_datetime(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}
