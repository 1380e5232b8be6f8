// src/error.rs
// =============================================================================
// Error types for the mirror engine.
//
// Every failure the engine can hit maps to exactly one variant here. Most of
// them only concern a single URL: the pipeline logs and counts them, then
// moves on. Only `NoSeeds` and `OfflineHosts` stop a crawl before it starts.
//
// The application layer (main.rs) still uses anyhow::Result, so any of these
// converts into an anyhow::Error with the ? operator.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// The string could not be parsed as a URL at all
    #[error("malformed URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },

    /// Parsed fine, but the scheme is not http or https
    #[error("unsupported scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    /// A link found inside a page could not be parsed
    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The page a link was found on could not be parsed
    #[error("invalid base URL '{base}': {reason}")]
    InvalidBase { base: String, reason: String },

    /// Transport error, timeout, oversized body or non-2xx status
    #[error("fetching {url} failed: {reason}")]
    FetchFailure { url: String, reason: String },

    /// Disk I/O while writing a mirrored file
    #[error("storing {} failed: {source}", path.display())]
    StoreFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The offline host list could not be read or downloaded
    #[error("loading offline hosts from '{source_name}' failed: {reason}")]
    OfflineHosts { source_name: String, reason: String },

    #[error("no valid URL provided")]
    NoSeeds,
}

impl MirrorError {
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        MirrorError::FetchFailure {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MirrorError::StoreFailure {
            path: path.into(),
            source,
        }
    }

    /// Fetch failures are the only ones worth trying again
    pub fn is_retryable(&self) -> bool {
        matches!(self, MirrorError::FetchFailure { .. })
    }
}
