// src/crawl/report.rs
// =============================================================================
// What happened to every URL during a crawl.
//
// Each URL moves through:
//   Pending -> Fetching -> Stored | Rejected | Skipped | Failed
//
// (with --retry, a Failed fetch may go back to Pending a few times first)
//
// The report keeps the latest state per URL and, at the end, the totals
// that main.rs prints or serializes to JSON.
// =============================================================================

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    /// Waiting in the frontier
    Pending,
    /// Popped and being worked on
    Fetching,
    /// Fetched and written to disk
    Stored,
    /// Declined by the scope policy before any request
    Rejected,
    /// Fetched, but the content policy or language filter declined it
    Skipped,
    /// Fetch or store error, retries exhausted
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct CrawlReport {
    pub stored: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Links that could not be resolved or normalized
    pub dropped: usize,
    /// Re-submissions made by --retry
    pub retried: usize,
    pub failures: Vec<FailedUrl>,
    #[serde(skip)]
    states: HashMap<String, UrlState>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, url: &str, state: UrlState) {
        self.states.insert(url.to_string(), state);
    }

    pub fn record_failure(&mut self, url: &str, error: impl ToString) {
        self.record(url, UrlState::Failed);
        self.failures.push(FailedUrl {
            url: url.to_string(),
            error: error.to_string(),
        });
    }

    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        self.states.get(url).copied()
    }

    // URLs that ended in `state`, sorted
    pub fn urls_in(&self, state: UrlState) -> Vec<&str> {
        let mut urls: Vec<&str> = self
            .states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(url, _)| url.as_str())
            .collect();
        urls.sort_unstable();
        urls
    }

    // Recomputes the totals from the per-URL states
    pub fn finish(&mut self) {
        let count = |state| self.states.values().filter(|s| **s == state).count();

        let stored = count(UrlState::Stored);
        let rejected = count(UrlState::Rejected);
        let skipped = count(UrlState::Skipped);
        let failed = count(UrlState::Failed);

        self.stored = stored;
        self.rejected = rejected;
        self.skipped = skipped;
        self.failed = failed;
        self.failures.sort_by(|a, b| a.url.cmp(&b.url));
    }

    pub fn total(&self) -> usize {
        self.states.len()
    }
}
