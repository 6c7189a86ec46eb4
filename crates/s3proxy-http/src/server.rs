//! Connection accept loop.

use std::future::Future;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use s3proxy_core::ObjectGateway;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::service::ProxyHttpService;

/// Serve connections from `listener` until `shutdown` resolves, then wait for
/// in-flight connections to finish.
///
/// Each connection runs on its own task. Failing to accept one connection is
/// logged and does not stop the loop.
pub async fn serve<G, F>(listener: TcpListener, service: ProxyHttpService<G>, shutdown: F)
where
    G: ObjectGateway,
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained");
}
