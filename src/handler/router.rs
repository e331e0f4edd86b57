//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, static file dispatch,
//! response finalization and access logging.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::header::{CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH, REFERER, USER_AGENT};
use hyper::{HeaderMap, Method, Request, Version};

use super::pipeline::{self, Finalize};
use super::static_files;
use crate::config::SiteRoot;
use crate::error::ServeError;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub if_none_match: Option<String>,
}

/// Serves requests against one immutable [`SiteRoot`].
///
/// Cheap to clone; each connection gets its own copy.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    site: Arc<SiteRoot>,
    /// Access log format, or `None` when access logging is off
    access_log: Option<Arc<str>>,
}

impl RequestHandler {
    pub const fn new(site: Arc<SiteRoot>) -> Self {
        Self {
            site,
            access_log: None,
        }
    }

    /// Log one line per request in `format` (`common` or `combined`)
    #[must_use]
    pub fn with_access_log(mut self, format: &str) -> Self {
        self.access_log = Some(Arc::from(format));
        self
    }

    pub fn site(&self) -> &SiteRoot {
        &self.site
    }

    /// Handle one request.
    ///
    /// The request body is never read, so any body type works. An `Err` means the
    /// response had to be abandoned and the connection should be dropped.
    pub async fn handle<B>(
        &self,
        req: Request<B>,
        peer: SocketAddr,
    ) -> Result<HttpResponse, ServeError> {
        let method = req.method();
        let is_head = *method == Method::HEAD;

        let response = if matches!(*method, Method::GET | Method::HEAD) {
            let ctx = RequestContext {
                path: req.uri().path(),
                query: req.uri().query(),
                is_head,
                if_modified_since: header_string(req.headers(), IF_MODIFIED_SINCE),
                if_none_match: header_string(req.headers(), IF_NONE_MATCH),
            };
            match static_files::serve_path(&ctx, &self.site).await {
                Ok(response) => response,
                Err(e) => {
                    logger::log_error(&format!("Aborting {method} {}: {e}", req.uri()));
                    return Err(e);
                }
            }
        } else {
            logger::log_debug(&format!("Method not allowed: {method}"));
            http::build_405_response()
        };

        let response = pipeline::finalize(
            response,
            &Finalize {
                server_name: self.site.server_name(),
                is_head,
            },
        );

        if let Some(format) = &self.access_log {
            logger::log_access(&access_entry(&req, peer, &response), format);
        }
        Ok(response)
    }
}

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn access_entry<B>(req: &Request<B>, peer: SocketAddr, response: &HttpResponse) -> AccessLogEntry {
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), ToString::to_string);
    let mut entry = AccessLogEntry::new(peer, req.method().as_str(), &target);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    entry.referer = header_string(req.headers(), REFERER);
    entry.user_agent = header_string(req.headers(), USER_AGENT);
    entry
}
