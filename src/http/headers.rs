//! Response header steps
//!
//! Each step takes a finished response and adds headers to it. The request handler
//! chains them in a fixed order, so every response gets the same treatment whatever
//! produced it.

use std::time::SystemTime;

use hyper::body::Body as _;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, DATE, SERVER,
};
use hyper::StatusCode;

use super::response::HttpResponse;
use super::cache;

/// Headers every development response carries
pub const DEV_HEADERS: [(hyper::header::HeaderName, &str); 2] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (CACHE_CONTROL, "no-cache"),
];

/// Add `Access-Control-Allow-Origin: *` and `Cache-Control: no-cache`, replacing any earlier value
pub fn apply_dev_headers(response: &mut HttpResponse) {
    let headers = response.headers_mut();
    for (name, value) in DEV_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Add `Server`, `Date` and, when the body size is known, `Content-Length`.
///
/// Values already present are left alone; a HEAD response built from file metadata
/// has an empty body but a real `Content-Length`.
pub fn apply_standard_headers(response: &mut HttpResponse, server_name: &str) {
    let body_len = response.body().size_hint().exact();
    let status = response.status();
    let headers = response.headers_mut();

    if !headers.contains_key(SERVER) {
        match HeaderValue::from_str(server_name) {
            Ok(value) => {
                headers.insert(SERVER, value);
            }
            Err(_) => crate::logger::log_warning(&format!(
                "Server name '{server_name}' is not a valid header value"
            )),
        }
    }

    if !headers.contains_key(DATE) {
        if let Ok(value) = HeaderValue::from_str(&cache::format_http_date(SystemTime::now())) {
            headers.insert(DATE, value);
        }
    }

    let carries_length = !matches!(status, StatusCode::NOT_MODIFIED | StatusCode::NO_CONTENT);
    if carries_length && !headers.contains_key(CONTENT_LENGTH) {
        if let Some(len) = body_len {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
    }
}
