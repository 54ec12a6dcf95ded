//! lecture-archiver: archive external web pages into self-contained
//! offline snapshots.
//!
//! A run drives a headless Chromium through one page load, streams the
//! sub-resource responses into a byte-budgeted cache, sanitizes the DOM
//! (scripts, frames and resource hints removed), recursively inlines
//! stylesheets and images as data URIs, injects provenance metadata and
//! hands back a single HTML payload ready for upload to an S3-compatible
//! store. A PDF mode prints the settled page instead.

pub mod archiver;
pub mod capture;
pub mod config;
pub mod error;
pub mod inline_css;
pub mod model;
pub mod resources;
pub mod sanitizer;
pub mod store;
pub mod utils;

pub use archiver::{ArchiveOutcome, archive_url_to_html, archive_url_to_pdf};
pub use config::{ArchiveConfig, StoreConfig};
pub use error::ArchiveError;
