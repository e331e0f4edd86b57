//! HTTP conditional request module
//!
//! `Last-Modified` formatting and `If-Modified-Since` evaluation. Responses are sent with
//! `Cache-Control: no-cache`, so browsers revalidate every time and this is what turns
//! those revalidations into cheap 304s.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Format a timestamp as an HTTP date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Decide whether a conditional GET can be answered with 304.
///
/// Like most static servers, `If-Modified-Since` is ignored when `If-None-Match`
/// is present, and unparseable dates are ignored. HTTP dates have second precision,
/// so the file's mtime is truncated before comparing.
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    if_none_match: Option<&str>,
    modified: SystemTime,
) -> bool {
    if if_none_match.is_some() {
        return false;
    }
    let Some(since) = if_modified_since.and_then(|v| httpdate::parse_http_date(v.trim()).ok())
    else {
        return false;
    };
    truncate_to_seconds(modified) <= since
}

fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    time.duration_since(UNIX_EPOCH)
        .map_or(time, |d| UNIX_EPOCH + Duration::from_secs(d.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64, millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_millis(millis)
    }

    #[test]
    fn test_format_http_date() {
        assert_eq!(
            format_http_date(at(784_111_777, 0)),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn test_not_modified_when_since_is_not_older() {
        let mtime = at(784_111_777, 450);
        let same = format_http_date(mtime);
        assert!(is_not_modified(Some(&same), None, mtime));
        let later = format_http_date(at(784_111_900, 0));
        assert!(is_not_modified(Some(&later), None, mtime));
    }

    #[test]
    fn test_modified_when_since_is_older() {
        let mtime = at(784_111_777, 0);
        let earlier = format_http_date(at(784_111_000, 0));
        assert!(!is_not_modified(Some(&earlier), None, mtime));
    }

    #[test]
    fn test_ignored_cases() {
        let mtime = at(784_111_777, 0);
        let same = format_http_date(mtime);
        assert!(!is_not_modified(None, None, mtime));
        assert!(!is_not_modified(Some("yesterday-ish"), None, mtime));
        assert!(!is_not_modified(Some(&same), Some("\"abc\""), mtime));
    }
}
