// Connection handling module
// Serves one accepted TCP connection with hyper until it closes, times out or shuts down

use std::net::SocketAddr;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use super::shutdown::ShutdownSignal;
use crate::handler::RequestHandler;
use crate::logger;

/// Per-connection settings taken from the performance config
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Hard upper bound on a connection's lifetime
    pub connection_timeout: Duration,
}

/// Spawn a task serving `stream` into `tasks`.
///
/// Each connection runs in its own task, so a slow or failing client only holds up
/// itself. On shutdown the connection finishes its in-flight request and closes.
pub fn spawn_connection(
    tasks: &mut JoinSet<()>,
    stream: TcpStream,
    peer_addr: SocketAddr,
    handler: RequestHandler,
    settings: ConnectionSettings,
    mut shutdown: ShutdownSignal,
) {
    logger::log_connection_accepted(&peer_addr);

    tasks.spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let handler = handler.clone();
            async move { handler.handle(req, peer_addr).await }
        });

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);
        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        let served = tokio::time::timeout(settings.connection_timeout, async {
            tokio::select! {
                result = conn.as_mut() => result,
                () = shutdown.recv() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        })
        .await;

        match served {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&peer_addr, &err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} closed after {}s timeout",
                settings.connection_timeout.as_secs()
            )),
        }
    });
}
