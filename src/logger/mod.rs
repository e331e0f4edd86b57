//! Logger module
//!
//! Provides logging utilities for the dev server:
//! - Server lifecycle logging
//! - Access logging in common/combined format
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use crate::config::LoggingConfig;

/// Log severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    const fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Whether a message at `self` passes a filter set to `max`
    pub const fn is_within(self, max: Self) -> bool {
        (self as u8) <= (max as u8)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    let level = config
        .level
        .parse::<Level>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    writer::init(
        level,
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn write(level: Level, message: &str) {
    let line = format!(
        "[{}] [{}] {message}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level.label()
    );
    match writer::get() {
        Some(w) => w.write(level, &line),
        // Before init (tests, early start-up): errors to stderr, the rest to stdout
        None if level <= Level::Warn => eprintln!("{line}"),
        None if level <= Level::Info => println!("{line}"),
        None => {}
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path) {
    write(Level::Info, &format!("Server running at http://localhost:{}", addr.port()));
    write(Level::Info, &format!("Listening on: {addr}"));
    write(Level::Info, &format!("Serving files from: {}", root.display()));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    write(
        Level::Warn,
        &format!("[Connection] {peer_addr} closed with error: {err}"),
    );
}

pub fn log_shutdown_requested(reason: &str) {
    write(Level::Info, &format!("[Shutdown] {reason}, no longer accepting connections"));
}

pub fn log_server_stopped(remaining: usize) {
    if remaining == 0 {
        write(Level::Info, "[Shutdown] Server stopped");
    } else {
        write(
            Level::Warn,
            &format!("[Shutdown] Server stopped with {remaining} connection(s) still open"),
        );
    }
}

pub fn log_error(message: &str) {
    write(Level::Error, message);
}

pub fn log_warning(message: &str) {
    write(Level::Warn, message);
}

pub fn log_debug(message: &str) {
    write(Level::Debug, message);
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}
