//! Static file serving module
//!
//! Maps a request path onto the site root and produces the file, directory index,
//! listing, redirect or error response for it.

use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use hyper::body::Bytes;
use tokio::fs;
use tokio::io::AsyncReadExt;

use super::listing;
use super::path::{self, PathError};
use super::router::RequestContext;
use crate::config::SiteRoot;
use crate::error::ServeError;
use crate::http::{self, cache, mime, HttpResponse};
use crate::logger;

/// A filesystem target that passed the containment checks
struct Target {
    path: PathBuf,
    metadata: Metadata,
}

/// Serve whatever `ctx.path` names under the site root
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    site: &SiteRoot,
) -> Result<HttpResponse, ServeError> {
    let decoded = match path::percent_decode(ctx.path) {
        Ok(decoded) => decoded,
        Err(e) => {
            logger::log_debug(&format!("Rejected path {:?}: {e}", ctx.path));
            return Ok(http::build_400_response());
        }
    };

    let candidate = match path::join_under_root(site.path(), &decoded) {
        Ok(candidate) => candidate,
        Err(PathError::Traversal) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            return Ok(http::build_403_response());
        }
        Err(PathError::BadEncoding) => return Ok(http::build_400_response()),
    };

    let target = match locate(site, &candidate).await {
        Ok(target) => target,
        Err(e) => return Ok(e.into_response(&candidate)),
    };

    if target.metadata.is_dir() {
        serve_directory(ctx, site, &decoded, &target).await
    } else if target.metadata.is_file() {
        // "/file.txt/" names a directory that does not exist
        if decoded.ends_with('/') {
            return Ok(http::build_404_response());
        }
        serve_file(ctx, &target).await
    } else {
        Ok(http::build_404_response())
    }
}

/// Why [`locate`] refused a candidate path
enum LocateError {
    Io(io::Error),
    /// Resolved (through a symlink) to somewhere outside the root
    Escaped(PathBuf),
}

impl LocateError {
    /// 404 for anything missing, 403 for permission problems and escapes
    fn into_response(self, candidate: &Path) -> HttpResponse {
        match self {
            Self::Escaped(resolved) => {
                logger::log_warning(&format!(
                    "Symlink escape blocked: {} -> {}",
                    candidate.display(),
                    resolved.display()
                ));
                http::build_403_response()
            }
            Self::Io(e) => lookup_error_response(candidate, &e),
        }
    }
}

/// Canonicalize `candidate`, confirm it is still inside the root and stat it.
///
/// Symlinks are followed, so one pointing outside the root is refused here.
async fn locate(site: &SiteRoot, candidate: &Path) -> Result<Target, LocateError> {
    let canonical = fs::canonicalize(candidate).await.map_err(LocateError::Io)?;
    if !canonical.starts_with(site.path()) {
        return Err(LocateError::Escaped(canonical));
    }
    let metadata = fs::metadata(&canonical).await.map_err(LocateError::Io)?;
    Ok(Target {
        path: canonical,
        metadata,
    })
}

fn lookup_error_response(path: &Path, error: &io::Error) -> HttpResponse {
    match error.kind() {
        ErrorKind::PermissionDenied => http::build_403_response(),
        ErrorKind::NotFound => http::build_404_response(),
        _ => {
            logger::log_debug(&format!("Lookup of {} failed: {error}", path.display()));
            http::build_404_response()
        }
    }
}

/// A file that was found but cannot be opened: 403 when unreadable, 404 when it
/// vanished in between, and a server fault for anything else.
fn open_error_response(path: &Path, error: io::Error) -> Result<HttpResponse, ServeError> {
    match error.kind() {
        ErrorKind::PermissionDenied => Ok(http::build_403_response()),
        ErrorKind::NotFound => Ok(http::build_404_response()),
        _ => Err(ServeError::Io {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    site: &SiteRoot,
    decoded: &str,
    dir: &Target,
) -> Result<HttpResponse, ServeError> {
    // Relative links in the page only resolve against a URL ending in '/'
    if !ctx.path.ends_with('/') {
        return Ok(match path::directory_location(decoded, ctx.query) {
            Ok(location) => http::build_redirect_response(&location),
            Err(_) => http::build_403_response(),
        });
    }

    for index_file in site.index_files() {
        let candidate = dir.path.join(index_file);
        if let Ok(index) = locate(site, &candidate).await {
            if index.metadata.is_file() {
                return serve_file(ctx, &index).await;
            }
        }
    }

    match listing::read_entries(&dir.path).await {
        Ok(entries) => Ok(http::build_html_response(listing::render_listing(
            decoded, &entries,
        ))),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(http::build_403_response()),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to list directory '{}': {e}",
                dir.path.display()
            ));
            Ok(http::build_404_response())
        }
    }
}

async fn serve_file(ctx: &RequestContext<'_>, file: &Target) -> Result<HttpResponse, ServeError> {
    let modified = file.metadata.modified().ok();
    if let Some(modified) = modified {
        if cache::is_not_modified(
            ctx.if_modified_since.as_deref(),
            ctx.if_none_match.as_deref(),
            modified,
        ) {
            return Ok(http::build_304_response(modified));
        }
    }

    let mut handle = match fs::File::open(&file.path).await {
        Ok(handle) => handle,
        Err(e) => return open_error_response(&file.path, e),
    };

    let content_type = mime::content_type_for(&file.path);
    if ctx.is_head {
        return Ok(http::build_file_response(
            Bytes::new(),
            file.metadata.len(),
            content_type,
            modified,
        ));
    }

    let mut content = Vec::with_capacity(usize::try_from(file.metadata.len()).unwrap_or(0));
    if let Err(source) = handle.read_to_end(&mut content).await {
        return Err(ServeError::Io {
            path: file.path.clone(),
            source,
        });
    }

    let len = content.len() as u64;
    Ok(http::build_file_response(
        Bytes::from(content),
        len,
        content_type,
        modified,
    ))
}
