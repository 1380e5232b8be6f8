// src/crawl/mod.rs
// =============================================================================
// This module runs the crawl and talks to the outside world.
//
// Submodules:
// - frontier: pending URLs, the seen-set and in-flight bookkeeping
// - pipeline: the driver loop and the per-URL work
// - fetch: the Fetcher trait and its reqwest implementation
// - store: the Store trait and its on-disk implementation
// - lang: the --langs page filter
// - report: per-URL states and the final totals
// =============================================================================

mod fetch;
mod frontier;
mod lang;
mod pipeline;
mod report;
mod store;

#[cfg(test)]
pub(crate) mod fakes;

pub use fetch::{FetchedResource, Fetcher, HttpFetcher};
pub use frontier::{Claim, Entry, Frontier};
pub use lang::{declared_language, language_allowed};
pub use pipeline::Mirror;
pub use report::{CrawlReport, FailedUrl, UrlState};
pub use store::{DiskStore, Store};
