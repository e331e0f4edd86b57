//! Development static file server.
//!
//! Serves a directory over HTTP/1.1 and stamps every response with
//! `Access-Control-Allow-Origin: *` and `Cache-Control: no-cache`, so pages under
//! development can be fetched cross-origin and are never served stale.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{Config, SiteRoot};
pub use error::{ServeError, StartupError};
pub use handler::RequestHandler;
