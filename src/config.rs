// src/config.rs
// =============================================================================
// The one configuration value every component reads from.
//
// Built once from the command line, wrapped in an Arc and handed to the
// pipeline. Nothing mutates it after that.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Cli, DEFAULT_SKIPPED_HOSTS, DEFAULT_USER_AGENT};
use crate::naming::Layout;
use crate::scope::{ContentPolicy, ScopeConfig};

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Start pages as typed by the user (normalized when the crawl starts)
    pub seeds: Vec<String>,
    pub scope: ScopeConfig,
    pub layout: Layout,
    pub content: ContentPolicy,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub no_parent: bool,
    /// 0 = unlimited
    pub max_depth: usize,
    /// Re-submissions allowed per URL; 0 when --retry is off
    pub retry_max_count: usize,
    pub langs: Vec<String>,
    pub offline_source: Option<String>,
    pub keep_meta: bool,
    pub keep_integrity: bool,
    pub max_body_bytes: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            scope: ScopeConfig {
                skipped_hosts: split_csv(DEFAULT_SKIPPED_HOSTS),
                ..ScopeConfig::default()
            },
            layout: Layout::default(),
            content: ContentPolicy::default(),
            output_dir: PathBuf::from("."),
            concurrency: 1,
            delay: Duration::from_millis(3000),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            no_parent: false,
            max_depth: 0,
            retry_max_count: 0,
            langs: Vec::new(),
            offline_source: None,
            keep_meta: false,
            keep_integrity: false,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl MirrorConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let csv = |value: &Option<String>| split_csv(value.as_deref().unwrap_or(""));

        Self {
            seeds: cli.urls.clone(),
            scope: ScopeConfig {
                skipped_hosts: split_csv(&cli.skipped_hosts),
                skipped_urls: csv(&cli.skipped_urls),
                only_hosts: csv(&cli.only_hosts),
                only_urls: csv(&cli.only_urls),
                allow_query: cli.dl_query,
            },
            layout: Layout {
                assets: cli.dir_assets.clone(),
                media: cli.dir_media.clone(),
                docs: cli.dir_docs.clone(),
                archives: cli.dir_archives.clone(),
                pages: cli.dir_pages.clone(),
            },
            content: ContentPolicy {
                download_media: cli.dl_media,
                download_archives: cli.dl_archive,
            },
            output_dir: cli.dir.clone(),
            concurrency: cli.concurrency.max(1),
            delay: Duration::from_millis(cli.delay_ms),
            timeout: Duration::from_secs(cli.timeout_secs),
            user_agent: cli.user_agent.clone(),
            no_parent: cli.no_parent,
            max_depth: cli.max_depth,
            retry_max_count: if cli.retry { cli.retry_max_count } else { 0 },
            langs: csv(&cli.langs)
                .into_iter()
                .map(|lang| lang.to_ascii_lowercase())
                .collect(),
            offline_source: cli.offline_list.clone(),
            keep_meta: cli.keep_meta,
            keep_integrity: cli.keep_integrity,
            max_body_bytes: cli.max_body_mb.saturating_mul(1024 * 1024),
        }
    }
}

// "a, b,,c " -> ["a", "b", "c"]
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
