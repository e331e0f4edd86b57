//! Request handler module
//!
//! Maps requests onto the site root and finalizes every response with the dev headers.

pub mod listing;
pub mod path;
pub mod pipeline;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{RequestContext, RequestHandler};
