//! Pure-text CSS inliner.
//!
//! Two transformations, in order: recursive `@import` expansion (with
//! media-query wrapping), then a single `url(...)` rewrite pass that embeds
//! fetched bodies as `data:` URIs. The inliner never touches a DOM; the
//! sanitizer feeds it stylesheet text and puts the result back.

use std::ops::Range;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::resources::Resolver;
use crate::utils::url_utils::resolve_reference;

// `@import "x.css" screen;` / `@import url(x.css);` with an optional media
// clause running up to the terminating semicolon.
static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)@import\s+(?:url\(\s*)?(?:'([^']+)'|"([^"]+)"|([^'")\s]+))\s*\)?\s*([^;]*);"#,
    )
    .expect("import regex is valid")
});

// Quoted or unquoted url() references. Three alternation branches instead of
// a backreference; the unquoted branch cannot match our own `url("")`
// placeholder, so rewritten output never rematches.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:'([^']+)'|"([^"]+)"|([^'")]+?))\s*\)"#)
        .expect("url regex is valid")
});

fn captured_ref<'t>(caps: &regex::Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str())
}

struct ImportMatch {
    span: Range<usize>,
    reference: String,
    media: String,
}

struct UrlMatch {
    span: Range<usize>,
    reference: String,
}

/// Inline a stylesheet: expand `@import` statements recursively (each level
/// consumes one unit of `max_import_depth`), then rewrite `url(...)`
/// references to data URIs.
///
/// Unresolvable or unfetchable imports are deleted; unresolvable or
/// unfetchable `url()` targets become `url("")`. `data:` and bare-fragment
/// references are left alone. When the depth budget is spent, remaining
/// `@import` statements stay in the text untouched.
pub async fn inline_css<R: Resolver>(
    css: &str,
    base_url: &str,
    max_import_depth: usize,
    resolver: &R,
) -> String {
    let expanded = if max_import_depth == 0 {
        css.to_string()
    } else {
        expand_imports(css, base_url, max_import_depth, resolver).await
    };
    rewrite_urls(&expanded, base_url, resolver).await
}

async fn expand_imports<R: Resolver>(
    css: &str,
    base_url: &str,
    max_import_depth: usize,
    resolver: &R,
) -> String {
    let matches: Vec<ImportMatch> = IMPORT_RE
        .captures_iter(css)
        .map(|caps| ImportMatch {
            span: caps.get(0).map_or(0..0, |m| m.range()),
            reference: captured_ref(&caps).to_string(),
            media: caps.get(4).map_or("", |m| m.as_str()).trim().to_string(),
        })
        .collect();
    if matches.is_empty() {
        return css.to_string();
    }

    let mut out = String::with_capacity(css.len());
    let mut cursor = 0;
    for m in matches {
        out.push_str(&css[cursor..m.span.start]);
        cursor = m.span.end;

        let fetched = match resolve_reference(&m.reference, base_url) {
            Some(absolute) => resolver
                .resolve(&absolute)
                .await
                .map(|record| (absolute, record)),
            None => None,
        };
        match fetched {
            Some((absolute, record)) => {
                let nested = record.text();
                let inlined = Box::pin(inline_css(
                    &nested,
                    &absolute,
                    max_import_depth - 1,
                    resolver,
                ))
                .await;
                if m.media.is_empty() {
                    out.push('\n');
                    out.push_str(&inlined);
                    out.push('\n');
                } else {
                    out.push_str(&format!("@media {} {{\n{}\n}}\n", m.media, inlined));
                }
            }
            None => {
                debug!("dropping unfetchable @import {}", m.reference);
            }
        }
    }
    out.push_str(&css[cursor..]);
    out
}

async fn rewrite_urls<R: Resolver>(css: &str, base_url: &str, resolver: &R) -> String {
    let matches: Vec<UrlMatch> = URL_RE
        .captures_iter(css)
        .map(|caps| UrlMatch {
            span: caps.get(0).map_or(0..0, |m| m.range()),
            reference: captured_ref(&caps).trim().to_string(),
        })
        .collect();
    if matches.is_empty() {
        return css.to_string();
    }

    let mut out = String::with_capacity(css.len());
    let mut cursor = 0;
    for m in matches {
        out.push_str(&css[cursor..m.span.start]);

        if m.reference.starts_with("data:") || m.reference.starts_with('#') {
            // Already inlined, or an in-document SVG reference.
            out.push_str(&css[m.span.clone()]);
        } else {
            let fetched = match resolve_reference(&m.reference, base_url) {
                Some(absolute) => resolver.resolve(&absolute).await,
                None => None,
            };
            match fetched {
                Some(record) => {
                    out.push_str(&format!("url(\"{}\")", record.to_data_uri()));
                }
                None => out.push_str("url(\"\")"),
            }
        }
        cursor = m.span.end;
    }
    out.push_str(&css[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceRecord;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapResolver {
        entries: HashMap<String, Arc<ResourceRecord>>,
    }

    impl MapResolver {
        fn new(pairs: &[(&str, &str, &str)]) -> Self {
            let entries = pairs
                .iter()
                .map(|(url, body, ct)| {
                    (
                        url.to_string(),
                        Arc::new(ResourceRecord::new(body.as_bytes().to_vec(), *ct)),
                    )
                })
                .collect();
            Self { entries }
        }
    }

    impl Resolver for MapResolver {
        async fn resolve(&self, url: &str) -> Option<Arc<ResourceRecord>> {
            self.entries.get(url).cloned()
        }
    }

    #[tokio::test]
    async fn imports_expand_with_media_wrapping() {
        let resolver = MapResolver::new(&[(
            "https://example.com/print.css",
            "body { color: black; }",
            "text/css",
        )]);
        let css = r#"@import url("print.css") print;
h1 { margin: 0; }"#;
        let out = inline_css(css, "https://example.com/main.css", 3, &resolver).await;
        assert!(out.contains("@media print {"));
        assert!(out.contains("body { color: black; }"));
        assert!(!out.contains("@import"));
        assert!(out.contains("h1 { margin: 0; }"));
    }

    #[tokio::test]
    async fn unfetchable_import_is_deleted() {
        let resolver = MapResolver::new(&[]);
        let css = "@import \"missing.css\";\np { margin: 0; }";
        let out = inline_css(css, "https://example.com/", 3, &resolver).await;
        assert!(!out.contains("@import"));
        assert!(out.contains("p { margin: 0; }"));
    }

    #[tokio::test]
    async fn cyclic_imports_terminate_within_depth() {
        let resolver = MapResolver::new(&[
            ("https://example.com/a.css", "@import \"b.css\";\n.a{}", "text/css"),
            ("https://example.com/b.css", "@import \"a.css\";\n.b{}", "text/css"),
        ]);
        let out = inline_css(
            "@import \"a.css\";",
            "https://example.com/",
            3,
            &resolver,
        )
        .await;
        // Depth budget spent, the innermost residual import stays as text.
        assert!(out.contains(".a{}"));
        assert!(out.contains(".b{}"));
    }

    #[tokio::test]
    async fn url_refs_become_data_uris() {
        let resolver = MapResolver::new(&[(
            "https://example.com/bg.png",
            "PNG",
            "image/png",
        )]);
        let css = ".hero { background: url('bg.png'); }";
        let out = inline_css(css, "https://example.com/style.css", 3, &resolver).await;
        assert!(out.contains("url(\"data:image/png;base64,"));
        assert!(!out.contains("bg.png"));
    }

    #[tokio::test]
    async fn unfetchable_url_becomes_empty() {
        let resolver = MapResolver::new(&[]);
        let out = inline_css(
            ".x { background: url(missing.png); }",
            "https://example.com/",
            3,
            &resolver,
        )
        .await;
        assert!(out.contains("url(\"\")"));
    }

    #[tokio::test]
    async fn data_and_fragment_urls_untouched() {
        let resolver = MapResolver::new(&[]);
        let css = ".a { background: url(data:image/png;base64,AAAA); clip-path: url(#clip); }";
        let out = inline_css(css, "https://example.com/", 3, &resolver).await;
        assert_eq!(out, css);
    }

    #[tokio::test]
    async fn unquoted_import_with_url_form() {
        let resolver = MapResolver::new(&[(
            "https://example.com/base.css",
            ".base{}",
            "text/css",
        )]);
        let out = inline_css(
            "@import url(base.css);",
            "https://example.com/",
            3,
            &resolver,
        )
        .await;
        assert!(out.contains(".base{}"));
        assert!(!out.contains("@import"));
    }
}
