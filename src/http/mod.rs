//! HTTP protocol layer module
//!
//! Response builders, header steps, MIME detection and conditional requests.
//! Nothing in here touches the filesystem.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod response;

pub use headers::{apply_dev_headers, apply_standard_headers};
pub use response::{
    build_304_response, build_400_response, build_403_response, build_404_response,
    build_405_response, build_file_response, build_html_response, build_redirect_response, Body,
    HttpResponse,
};
