//! Object key convention for archived snapshots.

use chrono::{DateTime, Utc};
use url::Url;

/// Make a string safe for use as an object-key segment.
///
/// Runs of anything outside lowercase alphanumerics, `_` and `-` collapse
/// to a single hyphen; leading and trailing hyphens are trimmed.
#[must_use]
pub fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for ch in raw.to_ascii_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Compact UTC stamp used to version object keys: `YYYYMMDDThhmmssZ`.
#[must_use]
pub fn utc_version_stamp(t: DateTime<Utc>) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Default object key for an archived page.
///
/// `archive/<host>/<host>-<path>.v<stamp>.<ext>` with every path slash
/// folded into the hyphenated leaf. A URL with no usable host or path
/// falls back to the leaf `page`.
#[must_use]
pub fn default_object_key_for_url(url: &str, ext: &str, t: DateTime<Utc>) -> String {
    let (host, path) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or("").to_string(),
            parsed.path().to_string(),
        ),
        Err(_) => (String::new(), String::new()),
    };

    let host_segment = sanitize_segment(&host);
    let path_segment = sanitize_segment(&path.replace('/', "-"));

    let leaf = match (host_segment.is_empty(), path_segment.is_empty()) {
        (false, false) => format!("{host_segment}-{path_segment}"),
        (false, true) => host_segment.clone(),
        (true, false) => path_segment,
        (true, true) => "page".to_string(),
    };

    let dir = if host_segment.is_empty() {
        "page".to_string()
    } else {
        host_segment
    };

    format!("archive/{dir}/{leaf}.v{}.{ext}", utc_version_stamp(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn segments_are_lowercased_and_hyphenated() {
        assert_eq!(sanitize_segment("Example.COM"), "example-com");
        assert_eq!(sanitize_segment("/some/path/"), "some-path");
        assert_eq!(sanitize_segment("a__b--c"), "a__b-c");
        assert_eq!(sanitize_segment("---"), "");
    }

    #[test]
    fn version_stamp_is_compact_utc() {
        let t = Utc.with_ymd_and_hms(2025, 12, 27, 12, 1, 2).unwrap();
        assert_eq!(utc_version_stamp(t), "20251227T120102Z");
    }

    #[test]
    fn default_key_matches_convention() {
        let t = Utc.with_ymd_and_hms(2025, 12, 27, 12, 1, 2).unwrap();
        // Scheme and query dropped, host and path folded into the leaf.
        assert_eq!(
            default_object_key_for_url("https://Example.com/Some/Path?x=1", "html", t),
            "archive/example-com/example-com-some-path.v20251227T120102Z.html"
        );
    }

    #[test]
    fn bare_host_key_has_no_path_leaf() {
        let t = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            default_object_key_for_url("https://example.com/", "pdf", t),
            "archive/example-com/example-com.v20250102T030405Z.pdf"
        );
    }

    #[test]
    fn unparseable_url_falls_back_to_page() {
        let t = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            default_object_key_for_url("not a url", "html", t),
            "archive/page/page.v20250102T030405Z.html"
        );
    }

    #[test]
    fn key_generation_is_deterministic() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let a = default_object_key_for_url("https://example.com/a?q=1", "html", t);
        let b = default_object_key_for_url("https://example.com/a?q=1", "html", t);
        assert_eq!(a, b);
    }
}
