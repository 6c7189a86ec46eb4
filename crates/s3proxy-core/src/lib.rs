//! Core types for s3proxy, an HTTP read proxy in front of one object storage bucket.
//!
//! - [`config`]: [`ProxyConfig`](config::ProxyConfig), loaded once from the environment.
//! - [`error`]: [`FetchError`](error::FetchError) and [`ConfigError`](error::ConfigError).
//! - [`gateway`]: the [`ObjectGateway`](gateway::ObjectGateway) capability and its
//!   request/outcome types.
//! - [`s3`]: [`S3Gateway`](s3::S3Gateway), the `aws-sdk-s3` implementation.

pub mod config;
pub mod error;
pub mod gateway;
pub mod s3;

pub use config::ProxyConfig;
pub use error::{ConfigError, FetchError};
pub use gateway::{
    FetchFuture, FetchOutcome, FetchRequest, ObjectBody, ObjectGateway, ObjectMetadata,
    UNSET_TIMESTAMP,
};
pub use s3::S3Gateway;
