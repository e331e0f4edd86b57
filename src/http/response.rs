//! HTTP response building module
//!
//! Builders for the responses a static file server sends. Dev and standard headers
//! are not set here; see [`super::headers`].

use std::time::SystemTime;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION};
use hyper::{Response, StatusCode};

use super::cache;

/// Body type used for every response
pub type Body = Full<Bytes>;

/// Response type produced by the handler
pub type HttpResponse = Response<Body>;

/// Methods this server answers
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Build 200 response for a file.
///
/// `len` is the file size from metadata; for HEAD requests `data` is empty
/// and `len` still describes the file.
pub fn build_file_response(
    data: Bytes,
    len: u64,
    content_type: &str,
    modified: Option<SystemTime>,
) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, len);
    if let Some(modified) = modified {
        builder = builder.header(LAST_MODIFIED, cache::format_http_date(modified));
    }
    builder.body(Full::new(data)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 200 response carrying a generated HTML page
pub fn build_html_response(content: String) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect, used to add the trailing slash to directory URLs
pub fn build_redirect_response(location: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from("301 Moved Permanently")))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            build_status_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(modified: SystemTime) -> HttpResponse {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, cache::format_http_date(modified))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response() -> HttpResponse {
    build_status_response(StatusCode::BAD_REQUEST)
}

/// Build 403 Forbidden response
pub fn build_403_response() -> HttpResponse {
    build_status_response(StatusCode::FORBIDDEN)
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_status_response(StatusCode::NOT_FOUND)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> HttpResponse {
    let mut response = build_status_response(StatusCode::METHOD_NOT_ALLOWED);
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Minimal plain-text error page, e.g. `404 Not Found`
fn build_status_response(status: StatusCode) -> HttpResponse {
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let mut response = Response::new(Full::new(Bytes::from(text)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
