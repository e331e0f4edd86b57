//! Response finalization pipeline
//!
//! Every response the handler produces, whatever its status, runs through the same
//! ordered list of steps before hyper writes it:
//!
//! 1. dev headers (`Access-Control-Allow-Origin: *`, `Cache-Control: no-cache`)
//! 2. standard headers (`Server`, `Date`, `Content-Length`)
//! 3. body removal for `HEAD`

use http_body_util::Full;
use hyper::body::Bytes;

use crate::http::{self, HttpResponse};

/// Per-request facts the steps need
#[derive(Debug, Clone, Copy)]
pub struct Finalize<'a> {
    pub server_name: &'a str,
    pub is_head: bool,
}

/// A single finalization step
pub type Step = fn(&mut HttpResponse, &Finalize<'_>);

/// Steps in the order they run; the length must be known before the HEAD body is dropped
pub const STEPS: [Step; 3] = [dev_headers, standard_headers, strip_head_body];

/// Run every step over `response`
pub fn finalize(mut response: HttpResponse, ctx: &Finalize<'_>) -> HttpResponse {
    for step in STEPS {
        step(&mut response, ctx);
    }
    response
}

fn dev_headers(response: &mut HttpResponse, _ctx: &Finalize<'_>) {
    http::apply_dev_headers(response);
}

fn standard_headers(response: &mut HttpResponse, ctx: &Finalize<'_>) {
    http::apply_standard_headers(response, ctx.server_name);
}

fn strip_head_body(response: &mut HttpResponse, ctx: &Finalize<'_>) {
    if ctx.is_head {
        *response.body_mut() = Full::new(Bytes::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, DATE, SERVER,
    };

    const GET: Finalize<'static> = Finalize {
        server_name: "devserve/test",
        is_head: false,
    };

    #[test]
    fn test_every_status_gets_dev_headers() {
        let responses = [
            http::build_html_response("<p>ok</p>".to_string()),
            http::build_400_response(),
            http::build_403_response(),
            http::build_404_response(),
            http::build_405_response(),
            http::build_redirect_response("/dir/"),
        ];
        for response in responses {
            let response = finalize(response, &GET);
            assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");
            assert_eq!(response.headers()[SERVER], "devserve/test");
            assert!(response.headers().contains_key(DATE));
        }
    }

    #[tokio::test]
    async fn test_head_keeps_length_but_drops_body() {
        let head = Finalize {
            is_head: true,
            ..GET
        };
        let response = finalize(http::build_404_response(), &head);
        assert_eq!(response.headers()[CONTENT_LENGTH], "13");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
