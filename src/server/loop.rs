// Server loop module
// Accepts connections until shutdown, then drains the ones still open

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use super::connection::{spawn_connection, ConnectionSettings};
use super::shutdown::ShutdownSignal;
use crate::config::PerformanceConfig;
use crate::handler::RequestHandler;
use crate::logger;

/// Pause after a failed `accept`, e.g. when out of file descriptors
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Configuration for server loop behavior
#[derive(Debug, Clone, Copy)]
pub struct ServerLoopConfig {
    pub connection: ConnectionSettings,
    /// How long open connections may take to finish after shutdown
    pub shutdown_timeout: Duration,
}

impl From<&PerformanceConfig> for ServerLoopConfig {
    fn from(perf: &PerformanceConfig) -> Self {
        Self {
            connection: ConnectionSettings {
                keep_alive: perf.keep_alive,
                connection_timeout: Duration::from_secs(perf.connection_timeout),
            },
            shutdown_timeout: Duration::from_secs(perf.shutdown_timeout),
        }
    }
}

/// Run the accept loop until `shutdown` fires.
///
/// States: `LISTENING` while this future runs, `STOPPED` once it returns. The
/// listener is closed as soon as shutdown is seen; connections still open get
/// `shutdown_timeout` to finish and are aborted after that.
pub async fn start_server_loop(
    listener: TcpListener,
    handler: RequestHandler,
    config: ServerLoopConfig,
    mut shutdown: ShutdownSignal,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            () = shutdown.recv() => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => spawn_connection(
                        &mut connections,
                        stream,
                        peer_addr,
                        handler.clone(),
                        config.connection,
                        shutdown.clone(),
                    ),
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }

            // Reap finished connection tasks so the set does not grow unbounded
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    logger::log_shutdown_requested("Shutdown signal received");

    let drained = tokio::time::timeout(config.shutdown_timeout, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    let remaining = if drained.is_ok() {
        0
    } else {
        let remaining = connections.len();
        connections.shutdown().await;
        remaining
    };
    logger::log_server_stopped(remaining);
}
