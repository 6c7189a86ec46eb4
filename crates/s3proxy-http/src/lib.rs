//! HTTP layer of s3proxy: request translation, header mapping, and hyper service.
//!
//! This crate turns inbound HTTP requests into object fetches and relays the
//! results. It provides:
//!
//! - **Handler** ([`handler`]): Builds the object key and conditional date from a
//!   request, calls the [`ObjectGateway`](s3proxy_core::ObjectGateway), and maps the
//!   outcome to a response.
//!
//! - **Headers** ([`headers`]): The fixed metadata-to-header table and HTTP date
//!   parsing/formatting.
//!
//! - **Body** ([`body`]): The [`ProxyResponseBody`](body::ProxyResponseBody) type
//!   supporting buffered, streaming, and empty modes.
//!
//! - **Service** ([`service`]): [`ProxyHttpService`](service::ProxyHttpService), the
//!   hyper `Service` answering `/hello` and delegating everything else.
//!
//! - **Server** ([`server`]): The accept loop with graceful shutdown.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> ProxyHttpService (hyper Service)
//!     -> /hello interception
//!     -> ProxyHandler
//!       -> key = prefix + path, If-Modified-Since
//!       -> ObjectGateway::fetch
//!   <- 200 + relayed body | 304 | failure status + message
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use s3proxy_core::{ProxyConfig, S3Gateway};
//! use s3proxy_http::{ProxyHandler, ProxyHttpService};
//!
//! # async fn run() {
//! let config = ProxyConfig::from_env();
//! let gateway = S3Gateway::from_config(&config).await;
//! let service = ProxyHttpService::new(ProxyHandler::from_config(gateway, &config));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
//! s3proxy_http::server::serve(listener, service, std::future::pending()).await;
//! # }
//! ```

pub mod body;
pub mod handler;
pub mod headers;
pub mod server;
pub mod service;

// Re-export key types for convenience.
pub use body::ProxyResponseBody;
pub use handler::ProxyHandler;
pub use server::serve;
pub use service::ProxyHttpService;
