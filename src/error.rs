//! Error types for start-up and request serving.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration file or environment could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Log files could not be opened or the level is unknown.
    #[error("logger initialization failed: {0}")]
    Logger(#[source] std::io::Error),

    /// The directory to serve does not exist or is not a directory.
    #[error("cannot serve root directory: {0}")]
    Root(#[source] std::io::Error),

    /// Host/port do not form a socket address.
    #[error("{0}")]
    InvalidAddress(String),

    /// The listening socket could not be bound (port in use, permission denied).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The async runtime could not be built.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Errors that abort a response.
///
/// Returning one from the service makes hyper drop the connection without
/// writing a response.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Reading a file failed after it had been found and opened.
    #[error("I/O error while serving {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
