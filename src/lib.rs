// src/lib.rs
// =============================================================================
// The mirror engine as a library. main.rs is a thin CLI on top of it.
//
// Modules, leaves first:
// - error: MirrorError
// - links: normalize, extract and resolve URLs
// - scope: what may be fetched and what may be kept
// - naming: URL -> path inside the mirror
// - offline: offline host list and page rewriting
// - crawl: frontier, pipeline, fetcher, store
// - cli / config / logging: the application shell
// =============================================================================

pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod links;
pub mod logging;
pub mod naming;
pub mod offline;
pub mod scope;

pub use config::MirrorConfig;
pub use error::MirrorError;
