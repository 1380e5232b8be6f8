// src/offline/mod.rs
// =============================================================================
// Making a mirrored site safe to browse without network access.
//
// Submodules:
// - hosts: loading the list of hosts to cut off
// - rewrite: pointing references to those hosts at 0.0.0.0, plus small
//   attribute/tag cleanups on saved pages
// =============================================================================

mod hosts;
mod rewrite;

pub use hosts::{load_offline_hosts, OfflineHosts};
pub use rewrite::{rewrite_for_offline, strip_integrity_attrs, strip_pingback_meta, LOOPBACK_HOST};
