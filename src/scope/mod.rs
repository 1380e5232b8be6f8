// src/scope/mod.rs
// =============================================================================
// What the mirror is allowed to fetch and keep.
//
// Submodules:
// - policy: URL-level rules (skip/only lists, query strings, no-parent)
// - content: response-level rules (archives, media, HTML detection)
// =============================================================================

mod content;
mod policy;

pub use content::{is_archive, is_html, is_media, ContentPolicy};
pub use policy::{is_parent, may_fetch, within_seeds, ScopeConfig};
