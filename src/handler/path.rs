//! Request path resolution
//!
//! Turns the path of a request URI into a filesystem path under the site root.

use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Why a request path could not be mapped under the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// Malformed `%XX` escape, NUL byte, or non UTF-8 result.
    #[error("request path is not validly percent-encoded")]
    BadEncoding,

    /// The path climbs above the site root.
    #[error("request path escapes the site root")]
    Traversal,
}

/// Characters escaped in an `href` segment: everything outside the RFC 3986 unreserved set
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Decode `%XX` escapes in a URL path.
///
/// A `%` not followed by two hex digits is rejected rather than passed through.
pub fn percent_decode(raw: &str) -> Result<String, PathError> {
    let bytes = raw.as_bytes();
    let malformed = bytes.iter().enumerate().any(|(i, b)| {
        *b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    });
    if malformed {
        return Err(PathError::BadEncoding);
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| PathError::BadEncoding)?;
    if decoded.contains('\0') {
        return Err(PathError::BadEncoding);
    }
    Ok(decoded.into_owned())
}

/// Percent-encode one path segment for use in an `href`.
pub fn percent_encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Resolve `.`, `..` and empty segments of a decoded URL path.
///
/// A `..` with nothing left to remove is a traversal attempt.
pub fn normalize_segments(decoded: &str) -> Result<Vec<&str>, PathError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::Traversal);
                }
            }
            // Only matters where '/' is not the sole separator (e.g. '\' on Windows)
            s if s.chars().any(std::path::is_separator) => return Err(PathError::Traversal),
            s => segments.push(s),
        }
    }
    Ok(segments)
}

/// Join a decoded URL path onto `root` without touching the filesystem.
pub fn join_under_root(root: &Path, decoded: &str) -> Result<PathBuf, PathError> {
    let mut path = root.to_path_buf();
    for segment in normalize_segments(decoded)? {
        path.push(segment);
    }
    // Drive prefixes and the like could still replace the root when pushed
    if path.starts_with(root) {
        Ok(path)
    } else {
        Err(PathError::Traversal)
    }
}

/// Absolute, re-encoded URL of the directory named by `decoded`, with a trailing slash.
///
/// Always starts with exactly one `/`, so it can never be read as a
/// protocol-relative (`//host/...`) URL.
pub fn directory_location(decoded: &str, query: Option<&str>) -> Result<String, PathError> {
    let mut location = String::from("/");
    for segment in normalize_segments(decoded)? {
        location.push_str(&percent_encode_segment(segment));
        location.push('/');
    }
    if let Some(query) = query {
        location.push('?');
        location.push_str(query);
    }
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/plain/path.txt").unwrap(), "/plain/path.txt");
        assert_eq!(percent_decode("/with%20space").unwrap(), "/with space");
        assert_eq!(percent_decode("/%E2%9C%93.txt").unwrap(), "/\u{2713}.txt");
        assert_eq!(percent_decode("/%2e%2E/x").unwrap(), "/../x");
    }

    #[test]
    fn test_percent_decode_rejects_garbage() {
        assert_eq!(percent_decode("/bad%2"), Err(PathError::BadEncoding));
        assert_eq!(percent_decode("/bad%zz"), Err(PathError::BadEncoding));
        assert_eq!(percent_decode("/nul%00byte"), Err(PathError::BadEncoding));
        assert_eq!(percent_decode("/%FF%FE"), Err(PathError::BadEncoding));
    }

    #[test]
    fn test_percent_encode_segment() {
        assert_eq!(percent_encode_segment("app.js"), "app.js");
        assert_eq!(percent_encode_segment("my file#1.txt"), "my%20file%231.txt");
        assert_eq!(percent_encode_segment("\u{e9}"), "%C3%A9");
    }

    #[test]
    fn test_join_under_root() {
        let root = Path::new("/srv/site");
        assert_eq!(join_under_root(root, "/").unwrap(), root);
        assert_eq!(
            join_under_root(root, "/css/./main.css").unwrap(),
            root.join("css/main.css")
        );
        assert_eq!(
            join_under_root(root, "/a/b/../c//d").unwrap(),
            root.join("a/c/d")
        );
    }

    #[test]
    fn test_join_rejects_traversal() {
        let root = Path::new("/srv/site");
        assert_eq!(join_under_root(root, "/../etc/passwd"), Err(PathError::Traversal));
        assert_eq!(
            join_under_root(root, "/a/../../../etc/passwd"),
            Err(PathError::Traversal)
        );
        assert_eq!(join_under_root(root, "/.."), Err(PathError::Traversal));
    }

    #[test]
    fn test_directory_location() {
        assert_eq!(directory_location("/docs", None).unwrap(), "/docs/");
        assert_eq!(directory_location("//docs", None).unwrap(), "/docs/");
        assert_eq!(directory_location("///evil.com/x", None).unwrap(), "/evil.com/x/");
        assert_eq!(
            directory_location("/a/./b/../my dir", Some("q=1")).unwrap(),
            "/a/my%20dir/?q=1"
        );
        assert_eq!(directory_location("/../x", None), Err(PathError::Traversal));
    }
}
