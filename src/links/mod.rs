// src/links/mod.rs
// =============================================================================
// Everything about turning text into URLs we can fetch.
//
// Submodules:
// - normalize: raw string -> canonical absolute http(s) URL
// - extract: markup -> raw href/src values
// - resolve: (page URL, raw value) -> absolute URL
// =============================================================================

mod extract;
mod normalize;
mod resolve;

pub use extract::{extract, extract_links, LinkKind};
pub use normalize::normalize;
pub use resolve::{resolve, resolve_path, Reference};
