//! Run-scoped resource handling.
//!
//! A single archival run shares one [`ResourceCache`] between the browser
//! capture path (CDP response bodies) and the direct HTTP fetch path. The
//! cache is guarded by a [`ByteBudget`] so one pathological page cannot
//! produce an unbounded output document. The [`Resolver`] trait is the
//! lookup capability handed to the sanitizer and the CSS inliner.

mod budget;
mod cache;
mod fetcher;
mod types;

pub use budget::ByteBudget;
pub use cache::ResourceCache;
pub use fetcher::{ResourceFetcher, RunResolver};
pub use types::ResourceRecord;

use std::sync::Arc;

/// Resolves a URL to a captured resource, from cache or network.
///
/// Absence is the only failure mode. Every reason a resource cannot be
/// embedded (bad scheme, transport error, non-2xx, budget) collapses to
/// `None`; callers degrade the document locally instead of aborting.
pub trait Resolver {
    fn resolve(&self, url: &str) -> impl std::future::Future<Output = Option<Arc<ResourceRecord>>>;
}
