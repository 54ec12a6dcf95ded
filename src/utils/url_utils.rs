//! URL normalization and reference classification.
//!
//! Helpers shared by the resource fetcher, the CSS inliner and the DOM
//! sanitizer: fragment stripping for cache keys, resolution of document
//! references against a base URL, and content-type inference.

use url::Url;

/// Strip the fragment from a URL so in-page anchors do not multiply cache
/// entries.
///
/// Unparseable input is returned verbatim; it will fail later at fetch time
/// instead, which keeps this function total.
#[must_use]
pub fn strip_fragment(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Resolve a document reference against a base URL, classifying inputs that
/// are not fetchable resources at all.
///
/// Returns `None` for empty refs, `blob:`/`javascript:`/`mailto:`/`tel:`
/// pseudo-URLs and bare fragment anchors. `data:` URIs are already-inlined
/// content and are passed through unchanged. Everything else is joined
/// against `base_url`; resolution failure yields `None`.
#[must_use]
pub fn resolve_reference(reference: &str, base_url: &str) -> Option<String> {
    let raw = reference.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("data:") {
        return Some(raw.to_string());
    }
    if raw.starts_with("blob:")
        || raw.starts_with("javascript:")
        || raw.starts_with("mailto:")
        || raw.starts_with("tel:")
        || raw.starts_with('#')
    {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let mut resolved = base.join(raw).ok()?;

    // Re-encode the query string to fix unencoded special characters from
    // HTML. Some servers (Google Fonts among them) strictly require proper
    // percent-encoding of `:`, `,`, `@` and `;` in query strings.
    if resolved.query().is_some() {
        let query_pairs: Vec<(String, String)> = resolved
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        resolved.query_pairs_mut().clear();
        for (key, value) in query_pairs {
            resolved.query_pairs_mut().append_pair(&key, &value);
        }
    }

    Some(resolved.to_string())
}

/// Normalize a `Content-Type` header value: trim and drop parameters such as
/// `; charset=utf-8`. Empty input yields `None`.
#[must_use]
pub fn normalize_content_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let essence = trimmed.split(';').next().unwrap_or(trimmed).trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_string())
    }
}

/// Infer a MIME type from the URL's file extension.
///
/// Used when a response carries no usable `Content-Type` header. Unknown
/// extensions fall back to a generic binary type.
#[must_use]
pub fn guess_content_type_by_ext(url: &str) -> &'static str {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };

    let ext = path
        .rsplit('/')
        .next()
        .and_then(|leaf| leaf.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()))
        .unwrap_or_default();

    match ext.as_str() {
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fragment_removes_anchor_only() {
        assert_eq!(
            strip_fragment("https://example.com/a.css#section"),
            "https://example.com/a.css"
        );
        assert_eq!(
            strip_fragment("https://example.com/a.css"),
            "https://example.com/a.css"
        );
    }

    #[test]
    fn strip_fragment_keeps_unparseable_input() {
        assert_eq!(strip_fragment("not a url"), "not a url");
    }

    #[test]
    fn fragment_variants_share_a_key() {
        let a = strip_fragment("https://example.com/x.png#one");
        let b = strip_fragment("https://example.com/x.png#two");
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_reference_classifies_non_fetchable_schemes() {
        let base = "https://example.com/page";
        assert_eq!(resolve_reference("", base), None);
        assert_eq!(resolve_reference("   ", base), None);
        assert_eq!(resolve_reference("#top", base), None);
        assert_eq!(resolve_reference("javascript:void(0)", base), None);
        assert_eq!(resolve_reference("mailto:x@example.com", base), None);
        assert_eq!(resolve_reference("tel:+15551234", base), None);
        assert_eq!(resolve_reference("blob:https://example.com/uuid", base), None);
    }

    #[test]
    fn resolve_reference_passes_data_uris_through() {
        let data = "data:image/png;base64,AAAA";
        assert_eq!(
            resolve_reference(data, "https://example.com/").as_deref(),
            Some(data)
        );
    }

    #[test]
    fn resolve_reference_joins_relative_paths() {
        assert_eq!(
            resolve_reference("../styles/main.css", "https://example.com/path/page.html")
                .as_deref(),
            Some("https://example.com/styles/main.css")
        );
    }

    #[test]
    fn resolve_reference_encodes_query_specials() {
        let resolved = resolve_reference(
            "https://fonts.googleapis.com/css2?family=Sans:ital,wght@0,400;1,700&display=swap",
            "https://example.com/",
        )
        .unwrap();
        assert!(resolved.contains("%40"), "@ should be encoded");
        assert!(resolved.contains("%3B"), "; should be encoded");
    }

    #[test]
    fn content_type_normalization_drops_parameters() {
        assert_eq!(
            normalize_content_type("text/css; charset=utf-8").as_deref(),
            Some("text/css")
        );
        assert_eq!(normalize_content_type("  "), None);
    }

    #[test]
    fn content_type_guessing_by_extension() {
        assert_eq!(
            guess_content_type_by_ext("https://example.com/fonts/a.woff2?v=3"),
            "font/woff2"
        );
        assert_eq!(
            guess_content_type_by_ext("https://example.com/pic.JPG"),
            "image/jpeg"
        );
        assert_eq!(
            guess_content_type_by_ext("https://example.com/no-extension"),
            "application/octet-stream"
        );
    }
}
