//! The proxy HTTP service implementing hyper's `Service` trait.
//!
//! [`ProxyHttpService`] handles:
//!
//! 1. The `/hello` greeting, answered without touching storage
//! 2. Every other path, through [`ProxyHandler`]
//!
//! The request body is never read.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::service::Service;
use s3proxy_core::ObjectGateway;
use tracing::debug;
use uuid::Uuid;

use crate::body::ProxyResponseBody;
use crate::handler::ProxyHandler;

/// Path of the static greeting.
pub const HELLO_PATH: &str = "/hello";

/// Body of the static greeting.
pub const HELLO_BODY: &str = "Hello";

/// The proxy HTTP service.
///
/// Cloning is cheap: the handler is shared behind an [`Arc`].
#[derive(Debug)]
pub struct ProxyHttpService<G: ObjectGateway> {
    handler: Arc<ProxyHandler<G>>,
}

impl<G: ObjectGateway> ProxyHttpService<G> {
    /// Create a service around a handler.
    #[must_use]
    pub fn new(handler: ProxyHandler<G>) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl<G: ObjectGateway> Clone for ProxyHttpService<G> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<G, B> Service<http::Request<B>> for ProxyHttpService<G>
where
    G: ObjectGateway,
    B: Send + 'static,
{
    type Response = http::Response<ProxyResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);

        Box::pin(async move {
            let (parts, _) = req.into_parts();
            let request_id = Uuid::new_v4().to_string();
            debug!(method = %parts.method, uri = %parts.uri, request_id, "processing request");

            if is_hello(parts.uri.path()) {
                return Ok(hello_response());
            }

            Ok(handler.handle(&parts, &request_id).await)
        })
    }
}

/// Check if the request targets the static greeting.
fn is_hello(path: &str) -> bool {
    path == HELLO_PATH
}

/// Produce the static greeting.
fn hello_response() -> http::Response<ProxyResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(ProxyResponseBody::from_string(HELLO_BODY))
        .expect("static hello response should be valid")
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use s3proxy_core::{FetchError, FetchFuture, FetchRequest};

    use super::*;

    /// Gateway that fails every fetch, standing in for an unreachable backend.
    #[derive(Debug)]
    struct UnreachableGateway;

    impl ObjectGateway for UnreachableGateway {
        fn fetch(&self, _request: FetchRequest) -> FetchFuture {
            Box::pin(async { Err(FetchError::transport("connection refused")) })
        }
    }

    fn service() -> ProxyHttpService<UnreachableGateway> {
        ProxyHttpService::new(ProxyHandler::new(UnreachableGateway, "/prefix"))
    }

    fn request(method: http::Method, uri: &str) -> http::Request<()> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid request")
    }

    #[test]
    fn test_should_detect_hello_path() {
        assert!(is_hello("/hello"));
        assert!(!is_hello("/hello/"));
        assert!(!is_hello("/hello.txt"));
        assert!(!is_hello("/"));
    }

    #[tokio::test]
    async fn test_should_answer_hello_without_backend() {
        let resp = service()
            .call(request(http::Method::GET, "/hello"))
            .await
            .expect("infallible");
        assert_eq!(resp.status(), http::StatusCode::OK);
        let body = resp.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(body.as_ref(), b"Hello");
    }

    #[tokio::test]
    async fn test_should_answer_hello_for_any_method() {
        let resp = service()
            .call(request(http::Method::POST, "/hello"))
            .await
            .expect("infallible");
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_route_other_paths_to_handler() {
        let resp = service()
            .call(request(http::Method::GET, "/index.html"))
            .await
            .expect("infallible");
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(body.as_ref(), b"connection refused");
    }

    #[test]
    fn test_should_share_handler_between_clones() {
        let svc = service();
        let clone = svc.clone();
        assert!(Arc::ptr_eq(&svc.handler, &clone.handler));
    }
}
