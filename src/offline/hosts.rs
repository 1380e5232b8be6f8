// src/offline/hosts.rs
// =============================================================================
// The list of hosts that must not be contacted when browsing the mirror
// (ad networks, trackers, analytics, ...).
//
// Format, one host per line:
//
//   # comments and blank lines are ignored
//   doubleclick.net
//   0.0.0.0 tracker.example     <- only the first token counts
//
// The list comes from a local file or from an http(s) URL and is loaded once,
// before the crawl starts. A host is "offline" when it contains any listed
// entry, so "doubleclick.net" also covers "ad.doubleclick.net".
// =============================================================================

use std::time::Duration;

use crate::crawl::Fetcher;
use crate::error::MirrorError;

#[derive(Debug, Clone, Default)]
pub struct OfflineHosts {
    hosts: Vec<String>,
}

impl OfflineHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut hosts: Vec<String> = hosts
            .into_iter()
            .map(Into::into)
            .filter(|host| !host.is_empty())
            .collect();
        hosts.sort();
        hosts.dedup();
        Self { hosts }
    }

    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .filter_map(|line| line.split_whitespace().next()),
        )
    }

    pub fn matches(&self, host: &str) -> bool {
        !host.is_empty() && self.hosts.iter().any(|entry| host.contains(entry.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }
}

// Reads the offline list from `source`
//
// "http://..." and "https://..." are downloaded with `fetcher`, anything else
// is treated as a path on the local disk.
pub async fn load_offline_hosts(source: &str, fetcher: &dyn Fetcher) -> Result<OfflineHosts, MirrorError> {
    let failed = |reason: String| MirrorError::OfflineHosts {
        source_name: source.to_string(),
        reason,
    };

    let lowered = source.to_ascii_lowercase();
    let text = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        let resource = fetcher
            .fetch(source, Duration::ZERO)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !resource.is_success() {
            return Err(failed(format!("HTTP {}", resource.status)));
        }
        String::from_utf8_lossy(&resource.body).into_owned()
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| failed(e.to_string()))?
    };

    Ok(OfflineHosts::parse(&text))
}
