//! Lesson content model.
//!
//! This is the external data shape the learning-path site consumes. The
//! archiver never mutates lesson files; it only emits the `assetKey` values
//! that `archiveHtml`/`archivePdf` blocks reference, so the model lives here
//! for round-tripping and for tooling that stitches snippets into lessons.

use serde::{Deserialize, Serialize};

/// A reference to an uploaded archive object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    #[serde(rename = "assetKey")]
    pub asset_key: String,
}

/// How an external URL is presented to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMode {
    /// Open in a new tab.
    Open,
    /// Embed in the lesson page.
    Embed,
}

/// One item in a lesson's content list, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LessonItem {
    Pdf {
        #[serde(rename = "assetKey")]
        asset_key: String,
    },
    Url {
        url: String,
        mode: UrlMode,
        #[serde(
            rename = "archivePdf",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        archive_pdf: Option<ArchiveRef>,
        #[serde(
            rename = "archiveHtml",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        archive_html: Option<ArchiveRef>,
    },
    Md {
        body: String,
    },
    Html {
        body: String,
    },
}
