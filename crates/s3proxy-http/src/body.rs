//! Response body type for the proxy.
//!
//! [`ProxyResponseBody`] supports three modes:
//!
//! - **Buffered**: small in-memory payloads such as failure messages and the greeting.
//! - **Streaming**: an object's content relayed chunk by chunk from the gateway.
//! - **Empty**: `304 Not Modified` responses.
//!
//! Dropping a streaming body drops the gateway stream, which releases the
//! backend connection whether the relay finished, failed, or the client went away.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::StreamExt;
use http_body::Frame;
use http_body_util::Full;
use s3proxy_core::ObjectBody;
use tracing::warn;

/// Proxy response body.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Default)]
pub enum ProxyResponseBody {
    /// Buffered body for failure text and static responses.
    Buffered(Full<Bytes>),
    /// Object content relayed from the gateway.
    Streaming(ObjectBody),
    /// Empty body for not-modified responses.
    #[default]
    Empty,
}

impl ProxyResponseBody {
    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a body relaying an object stream.
    #[must_use]
    pub fn streaming(stream: ObjectBody) -> Self {
        Self::Streaming(stream)
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl fmt::Debug for ProxyResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(full) => f.debug_tuple("Buffered").field(full).finish(),
            Self::Streaming(_) => f.write_str("Streaming"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl http_body::Body for ProxyResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => match stream.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(Frame::data(chunk)))),
                Poll::Ready(Some(Err(err))) => {
                    warn!(error = %err, "object stream failed during relay");
                    Poll::Ready(Some(Err(err)))
                }
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(_) => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(_) => http_body::SizeHint::default(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
