//! DOM sanitizer and resource inliner.
//!
//! Takes the raw captured HTML and produces a self-contained document:
//! active content removed, stylesheets and images embedded as data URIs,
//! provenance metadata injected. Per-resource failures degrade the document
//! locally; only a parse or serialize failure aborts the run.

mod srcset;

pub use srcset::pick_best_from_srcset;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use log::{debug, warn};

use crate::inline_css::inline_css;
use crate::resources::Resolver;
use crate::utils::url_utils::resolve_reference;

/// Sanitize and inline a captured document.
///
/// The pass sequence is fixed; each pass collects its target nodes before
/// mutating, since detaching during selection iteration is not sound.
pub async fn sanitize_document<R: Resolver>(
    raw_html: &str,
    source_url: &str,
    captured_at: DateTime<Utc>,
    max_import_depth: usize,
    resolver: &R,
) -> Result<String> {
    let document = kuchiki::parse_html().one(raw_html);

    remove_dangerous_meta(&document)?;
    remove_all(&document, "base")?;
    remove_all(&document, "script")?;
    remove_all(&document, "iframe, frame, object, embed")?;
    triage_links(&document, source_url, max_import_depth, resolver).await?;
    reinline_style_blocks(&document, source_url, max_import_depth, resolver).await?;
    inline_images(&document, source_url, resolver).await?;
    remove_all(&document, "picture source")?;
    neutralize_videos(&document, source_url, resolver).await?;
    inline_style_attributes(&document, source_url, resolver).await?;
    sweep_remaining_links(&document)?;
    inject_metadata(&document, source_url, captured_at)?;

    serialize_with_doctype(&document)
}

fn select_all(node: &NodeRef, selector: &str) -> Result<Vec<NodeDataRef<ElementData>>> {
    node.select(selector)
        .map(Iterator::collect)
        .map_err(|()| anyhow::anyhow!("Invalid selector: {selector}"))
}

fn remove_all(document: &NodeRef, selector: &str) -> Result<()> {
    for element in select_all(document, selector)? {
        element.as_node().detach();
    }
    Ok(())
}

/// Drop `<meta http-equiv>` directives that would interfere with offline
/// viewing: CSP (blocks data URIs), frame options and refresh redirects.
fn remove_dangerous_meta(document: &NodeRef) -> Result<()> {
    for element in select_all(document, "meta[http-equiv]")? {
        let remove = {
            let attrs = element.attributes.borrow();
            attrs.get("http-equiv").is_some_and(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "content-security-policy" | "x-frame-options" | "refresh"
                )
            })
        };
        if remove {
            element.as_node().detach();
        }
    }
    Ok(())
}

fn rel_tokens(element: &NodeDataRef<ElementData>) -> Vec<String> {
    let attrs = element.attributes.borrow();
    attrs
        .get("rel")
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect()
}

fn is_stylesheet_link(tokens: &[String], element: &NodeDataRef<ElementData>) -> bool {
    if tokens.iter().any(|t| t == "stylesheet") {
        return true;
    }
    if tokens.iter().any(|t| t == "preload") {
        let attrs = element.attributes.borrow();
        return attrs
            .get("as")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("style"));
    }
    false
}

const HINT_RELS: &[&str] = &[
    "preconnect",
    "dns-prefetch",
    "prefetch",
    "prerender",
    "modulepreload",
    "preload",
];

/// Triage `<link>` elements: resource hints go away, stylesheets (including
/// `preload as=style`) are fetched and replaced by `<style>` blocks with
/// provenance attributes, anything that cannot be fetched is removed.
async fn triage_links<R: Resolver>(
    document: &NodeRef,
    source_url: &str,
    max_import_depth: usize,
    resolver: &R,
) -> Result<()> {
    for element in select_all(document, "link[href]")? {
        let node = element.as_node();
        let tokens = rel_tokens(&element);

        if is_stylesheet_link(&tokens, &element) {
            let href = {
                let attrs = element.attributes.borrow();
                attrs.get("href").unwrap_or("").trim().to_string()
            };
            // An empty or data: href is already self-contained.
            if href.is_empty() || href.starts_with("data:") {
                continue;
            }
            let fetched = match resolve_reference(&href, source_url) {
                Some(absolute) => resolver
                    .resolve(&absolute)
                    .await
                    .map(|record| (absolute, record)),
                None => None,
            };
            match fetched {
                Some((absolute, record)) => {
                    let css = record.text();
                    let inlined = inline_css(&css, &absolute, max_import_depth, resolver).await;
                    let style_html = format!(
                        "<style data-lecture-inline=\"stylesheet\" data-lecture-source=\"{}\">\n{}\n</style>",
                        html_escape::encode_double_quoted_attribute(&absolute),
                        inlined
                    );
                    for fragment in fragment_nodes(&style_html) {
                        node.insert_before(fragment);
                    }
                    node.detach();
                    debug!("inlined stylesheet {href}");
                }
                None => {
                    warn!("removing unfetchable stylesheet link {href}");
                    node.detach();
                }
            }
        } else if tokens.iter().any(|t| HINT_RELS.contains(&t.as_str())) {
            node.detach();
        }
        // Remaining links (icons etc.) are handled by the final sweep.
    }
    Ok(())
}

/// Run existing `<style>` blocks through the CSS inliner in place.
async fn reinline_style_blocks<R: Resolver>(
    document: &NodeRef,
    source_url: &str,
    max_import_depth: usize,
    resolver: &R,
) -> Result<()> {
    for element in select_all(document, "style")? {
        let node = element.as_node();
        let css = node.text_contents();
        if css.trim().is_empty() {
            continue;
        }
        let inlined = inline_css(&css, source_url, max_import_depth, resolver).await;
        for child in node.children().collect::<Vec<_>>() {
            child.detach();
        }
        node.append(NodeRef::new_text(inlined));
    }
    Ok(())
}

/// Embed image bodies as data URIs.
///
/// The candidate is `src` when present, otherwise the best `srcset` entry.
/// `srcset` and `sizes` are dropped in every branch; on fetch failure the
/// element stays but loses its `src`, so the page keeps its layout hole
/// instead of a broken network reference.
async fn inline_images<R: Resolver>(
    document: &NodeRef,
    source_url: &str,
    resolver: &R,
) -> Result<()> {
    for element in select_all(document, "img")? {
        let (src, srcset) = {
            let attrs = element.attributes.borrow();
            (
                attrs.get("src").unwrap_or("").trim().to_string(),
                attrs.get("srcset").unwrap_or("").to_string(),
            )
        };
        let candidate = if src.is_empty() {
            pick_best_from_srcset(&srcset)
        } else {
            Some(src)
        };

        let mut attrs = element.attributes.borrow_mut();
        attrs.remove("srcset");
        attrs.remove("sizes");

        let Some(candidate) = candidate else { continue };
        if candidate.starts_with("data:") {
            continue;
        }
        let Some(absolute) = resolve_reference(&candidate, source_url) else {
            continue;
        };
        drop(attrs);

        match resolver.resolve(&absolute).await {
            Some(record) => {
                let mut attrs = element.attributes.borrow_mut();
                attrs.insert("src", record.to_data_uri());
            }
            None => {
                warn!("dropping unreachable image {absolute}");
                let mut attrs = element.attributes.borrow_mut();
                attrs.remove("src");
            }
        }
    }
    Ok(())
}

/// Videos are not inlined; keep the element as a placeholder with its poster
/// embedded, and strip the playable sources.
async fn neutralize_videos<R: Resolver>(
    document: &NodeRef,
    source_url: &str,
    resolver: &R,
) -> Result<()> {
    for element in select_all(document, "video")? {
        let node = element.as_node();
        let poster = {
            let attrs = element.attributes.borrow();
            attrs.get("poster").unwrap_or("").trim().to_string()
        };
        if !poster.is_empty() && !poster.starts_with("data:") {
            let fetched = match resolve_reference(&poster, source_url) {
                Some(absolute) => resolver.resolve(&absolute).await,
                None => None,
            };
            let mut attrs = element.attributes.borrow_mut();
            match fetched {
                Some(record) => {
                    attrs.insert("poster", record.to_data_uri());
                }
                None => {
                    attrs.remove("poster");
                }
            }
        }
        element.attributes.borrow_mut().remove("src");
        for child in select_all(node, "source")? {
            child.as_node().detach();
        }
    }
    Ok(())
}

/// Inline `url(...)` references inside `style="..."` attributes. Import
/// expansion does not apply to attribute CSS, so depth is zero.
async fn inline_style_attributes<R: Resolver>(
    document: &NodeRef,
    source_url: &str,
    resolver: &R,
) -> Result<()> {
    for element in select_all(document, "[style]")? {
        let style = {
            let attrs = element.attributes.borrow();
            attrs.get("style").unwrap_or("").to_string()
        };
        if !style.contains("url(") {
            continue;
        }
        let inlined = inline_css(&style, source_url, 0, resolver).await;
        element.attributes.borrow_mut().insert("style", inlined);
    }
    Ok(())
}

/// Any `link[href]` still standing that is not a stylesheet points at the
/// network; remove it.
fn sweep_remaining_links(document: &NodeRef) -> Result<()> {
    for element in select_all(document, "link[href]")? {
        let tokens = rel_tokens(&element);
        if !tokens.iter().any(|t| t == "stylesheet") {
            element.as_node().detach();
        }
    }
    Ok(())
}

/// Prepend the provenance block into `<head>`, falling back to `<html>` and
/// then the document root for pathological inputs.
fn inject_metadata(
    document: &NodeRef,
    source_url: &str,
    captured_at: DateTime<Utc>,
) -> Result<()> {
    let injection = format!(
        "<!-- lecture: archived html (self-contained) -->\n\
         <meta name=\"x-lecture-source-url\" content=\"{}\">\n\
         <meta name=\"x-lecture-captured-at\" content=\"{}\">\n",
        html_escape::encode_double_quoted_attribute(source_url),
        captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let nodes = fragment_nodes(&injection);

    let target = select_all(document, "head")?
        .into_iter()
        .next()
        .map(|head| head.as_node().clone())
        .or_else(|| {
            select_all(document, "html")
                .ok()?
                .into_iter()
                .next()
                .map(|html| html.as_node().clone())
        })
        .unwrap_or_else(|| document.clone());

    for node in nodes.into_iter().rev() {
        target.prepend(node);
    }
    Ok(())
}

/// Parse an HTML fragment and return its meaningful nodes in order.
///
/// `parse_html` always synthesizes a full `html`/`head`/`body` scaffold;
/// this collects document-level comments plus the children of `head` and
/// `body` so fragment insertion never drags scaffold elements along.
fn fragment_nodes(html: &str) -> Vec<NodeRef> {
    let fragment = kuchiki::parse_html().one(html);
    let mut nodes = Vec::new();
    for child in fragment.children() {
        match child.as_element() {
            Some(el) if &*el.name.local == "html" => {
                for section in child.children() {
                    nodes.extend(section.children());
                }
            }
            _ => nodes.push(child),
        }
    }
    nodes
}

fn serialize_with_doctype(document: &NodeRef) -> Result<String> {
    let mut out = Vec::new();
    document
        .serialize(&mut out)
        .context("Failed to serialize sanitized document")?;
    let html = String::from_utf8(out).context("Serialized document is not valid UTF-8")?;
    if html.to_ascii_lowercase().contains("<!doctype") {
        Ok(html)
    } else {
        Ok(format!("<!doctype html>\n{html}"))
    }
}
