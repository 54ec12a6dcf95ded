//! Shared configuration constants for the archiver
//!
//! Default values used across the codebase to ensure consistency and
//! avoid magic numbers. All of them can be overridden per run through
//! `ArchiveConfig`.

/// Aggregate cap on embedded resource bytes for one archival run: 60 MiB
///
/// Once the sum of admitted resource bodies reaches this value, further
/// cache misses resolve to "resource unavailable" without any network I/O.
/// Keeps the output document within a size browsers will still open.
pub const MAX_TOTAL_EMBED_BYTES: usize = 60 * 1024 * 1024;

/// Cap on a single embedded resource body: 12 MiB
///
/// Anything larger is rejected outright rather than inlined as a data URI.
/// Typical inlined assets (stylesheets, images, fonts) are well below this.
pub const MAX_SINGLE_EMBED_BYTES: usize = 12 * 1024 * 1024;

/// Timeout for a single direct resource fetch
///
/// A hung request is abandoned and treated as a failed fetch; it never
/// stalls the run.
pub const RESOURCE_FETCH_TIMEOUT_SECS: u64 = 25;

/// Timeout for `page.goto()` during capture
pub const NAVIGATION_TIMEOUT_SECS: u64 = 60;

/// Maximum time to wait for the page to reach network quiescence
/// (readyState complete, images loaded) before falling back
pub const QUIESCENCE_TIMEOUT_SECS: u64 = 10;

/// Settle delay applied after the quiescence wait gives up
///
/// Pages with polling or analytics scripts never fully quiesce; a fixed
/// delay after DOM-ready is the best we can do for those.
pub const FALLBACK_SETTLE_MS: u64 = 1500;

/// Synthetic scroll sequence used to trigger lazy-loading observers
pub const SCROLL_STEPS: u32 = 20;
pub const SCROLL_STEP_PX: u32 = 800;
pub const SCROLL_PAUSE_MS: u64 = 200;

/// Delay after scrolling back to the top, before the DOM snapshot
pub const POST_SCROLL_SETTLE_MS: u64 = 800;

/// Maximum number of `@import` expansion passes in the CSS inliner
///
/// Real-world stylesheet nesting rarely exceeds three levels; the bound
/// also terminates cyclic import chains.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 3;

/// Viewport used for capture
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 720;

/// User agent sent on direct resource fetches
pub const ARCHIVER_USER_AGENT: &str = "lecture-archiver/1.0";
