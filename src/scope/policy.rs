// src/scope/policy.rs
// =============================================================================
// Decides whether a URL may be fetched at all.
//
// The checks run in a fixed order and the first "no" wins:
// 1. query strings, unless --dl-query
// 2. --skipped-urls (substring match on the whole URL)
// 3. --skipped-hosts (exact host match)
// 4. --only-urls (if set, the URL must contain one of them)
// 5. --only-hosts (if set, the host must equal one of them)
//
// Nothing here touches the network or the disk.
// =============================================================================

use serde::Serialize;
use url::Url;

use crate::error::MirrorError;

/// Read-only scope settings, built once from the command line
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScopeConfig {
    pub skipped_hosts: Vec<String>,
    pub skipped_urls: Vec<String>,
    pub only_hosts: Vec<String>,
    pub only_urls: Vec<String>,
    /// Whether URLs like /list?page=2 are eligible
    pub allow_query: bool,
}

// Checks `url` against the scope settings
//
// Returns:
//   Ok(true)  = go ahead and fetch it
//   Ok(false) = out of scope
//   Err       = the URL doesn't even parse
pub fn may_fetch(url: &str, cfg: &ScopeConfig) -> Result<bool, MirrorError> {
    let parsed = Url::parse(url).map_err(|e| MirrorError::MalformedUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed.host_str().unwrap_or("");

    if !cfg.allow_query && parsed.query().is_some() {
        return Ok(false);
    }

    if cfg.skipped_urls.iter().any(|skipped| url.contains(skipped.as_str())) {
        return Ok(false);
    }

    if cfg.skipped_hosts.iter().any(|skipped| host == skipped) {
        return Ok(false);
    }

    if !cfg.only_urls.is_empty() && !cfg.only_urls.iter().any(|only| url.contains(only.as_str())) {
        return Ok(false);
    }

    if !cfg.only_hosts.is_empty() && !cfg.only_hosts.iter().any(|only| host == only) {
        return Ok(false);
    }

    Ok(true)
}

// Checks whether `uri` is a parent of `other` in a directory-like structure
//
// Examples:
//   ("https://example.org/about", "https://example.org/about/site") -> true
//   ("https://example.org/home", "https://example.org/about/")      -> false
pub fn is_parent(uri: &str, other: &str) -> bool {
    let uri = uri.trim_matches(|c| c == '/' || c == ' ');
    let other = other.trim_matches(|c| c == '/' || c == ' ');

    other.matches('/').count() > uri.matches('/').count() && other.starts_with(uri)
}

// Used by --no-parent: is `url` one of the seeds, or somewhere below the
// directory of one of them (on the same host)?
pub fn within_seeds(url: &str, seeds: &[String]) -> bool {
    seeds.iter().any(|seed| {
        if url == seed {
            return true;
        }
        let (Ok(seed_url), Ok(candidate)) = (Url::parse(seed), Url::parse(url)) else {
            return false;
        };
        if seed_url.host_str() != candidate.host_str() || seed_url.port() != candidate.port() {
            return false;
        }
        // the trailing slash keeps "/docs-old/" out of "/docs/"
        let dir = seed_dir(seed);
        url.starts_with(dir) && is_parent(dir, url)
    })
}

// "http://example.com/docs/index.html" -> "http://example.com/docs/"
fn seed_dir(seed: &str) -> &str {
    let path_start = seed.find("://").map(|i| i + 3).unwrap_or(0);
    match seed[path_start..].rfind('/') {
        Some(slash) => &seed[..path_start + slash + 1],
        None => seed,
    }
}
