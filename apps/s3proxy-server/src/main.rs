//! s3proxy server: serves objects from a single S3-compatible bucket over HTTP.
//!
//! Every request path is appended to `AWS_S3_KEY_PREFIX` and fetched from
//! `AWS_S3_BUCKET`. The object's content and a fixed subset of its metadata
//! are relayed to the client; `If-Modified-Since` is forwarded to the backend.
//!
//! # Usage
//!
//! ```text
//! AWS_S3_ENDPOINT=http://minio:9000 AWS_S3_BUCKET=site APP_PORT=8080 s3proxy-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_S3_ENDPOINT` | *(SDK default)* | Object storage endpoint URL |
//! | `AWS_DEFAULT_REGION` | *(SDK default)* | Storage region |
//! | `AWS_S3_BUCKET` | *(empty)* | Bucket to serve |
//! | `AWS_S3_KEY_PREFIX` | *(empty)* | Prepended to every request path |
//! | `APP_PORT` | `80` | Listen port on all interfaces |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! Credentials come from the standard AWS provider chain.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use s3proxy_core::{ProxyConfig, S3Gateway};
use s3proxy_http::service::{HELLO_BODY, HELLO_PATH};
use s3proxy_http::{ProxyHandler, ProxyHttpService};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server version logged at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Loopback address of a locally running proxy.
fn health_check_addr(config: &ProxyConfig) -> Result<SocketAddr> {
    let port = config.port().context("invalid APP_PORT")?;
    Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
}

/// Check a raw HTTP response for a successful greeting.
fn is_healthy_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.ends_with(HELLO_BODY)
}

/// Perform a health check by requesting the greeting from a local proxy.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: SocketAddr) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET {HELLO_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = ProxyConfig::from_env();
        let healthy = match health_check_addr(&config) {
            Ok(addr) => run_health_check(addr).await.is_ok(),
            Err(_) => false,
        };
        std::process::exit(i32::from(!healthy));
    }

    let config = ProxyConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        endpoint = %config.endpoint,
        region = %config.region,
        bucket = %config.bucket,
        key_prefix = %config.key_prefix,
        app_port = %config.app_port,
        version = VERSION,
        "starting s3proxy",
    );

    let addr = config
        .listen_addr()
        .with_context(|| format!("invalid listen port: {}", config.app_port))?;

    let gateway = S3Gateway::from_config(&config).await;
    let service = ProxyHttpService::new(ProxyHandler::from_config(gateway, &config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    s3proxy_http::serve(listener, service, shutdown_signal()).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_check_health_on_loopback() {
        let config = ProxyConfig::builder().app_port("8080".to_owned()).build();
        let addr = health_check_addr(&config).expect("valid port");
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
    }

    #[test]
    fn test_should_reject_invalid_port_for_health_check() {
        let config = ProxyConfig::builder().app_port("http".to_owned()).build();
        assert!(health_check_addr(&config).is_err());
    }

    #[test]
    fn test_should_recognize_healthy_response() {
        let ok = "HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nHello";
        assert!(is_healthy_response(ok));

        let failed = "HTTP/1.1 500 Internal Server Error\r\n\r\nHello";
        assert!(!is_healthy_response(failed));

        let wrong_body = "HTTP/1.1 200 OK\r\n\r\nGoodbye";
        assert!(!is_healthy_response(wrong_body));
    }

    #[test]
    fn test_should_fail_health_check_without_listener() {
        let result = tokio_test::block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            let addr = listener.local_addr().expect("local addr");
            drop(listener);
            run_health_check(addr).await
        });
        assert!(result.is_err());
    }
}
