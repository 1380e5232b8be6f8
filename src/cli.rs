// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command:
//
//   site-mirror [OPTIONS] <URLS>...
//
// The parsed arguments are turned into an immutable MirrorConfig exactly once
// (see config.rs); nothing else in the crate looks at the Cli struct.
//
// List-valued options (hosts, urls, languages) take comma-separated values:
//   --skipped-hosts youtube.com,vimeo.com
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; site-mirror/", env!("CARGO_PKG_VERSION"), ")");

pub const DEFAULT_SKIPPED_HOSTS: &str = "youtube.com,vimeo.com,github.com,bitbucket.com";

// #[derive(Parser)] tells clap to generate the parsing code
// The #[command(...)] attributes configure --help and --version
#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    version,
    about = "Mirror a website to local disk for offline browsing",
    long_about = "site-mirror starts from one or more pages, follows the links it finds, \
                  and saves every in-scope page and asset under a predictable directory layout. \
                  References to known tracking hosts can be cut off so the copy works offline."
)]
pub struct Cli {
    /// Pages to start from (http:// is assumed when no scheme is given)
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Number of downloads running at the same time (at least 1)
    #[arg(short = 'c', long, default_value_t = 1)]
    pub concurrency: usize,

    /// Pause before every request, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub delay_ms: u64,

    /// Give up on a request after this many seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Directory the mirror is written to
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Bucket for stylesheets, scripts, fonts and images
    #[arg(long, default_value = "assets")]
    pub dir_assets: String,

    /// Bucket for videos and audio
    #[arg(long, default_value = "media")]
    pub dir_media: String,

    /// Bucket for pdf, epub and office documents
    #[arg(long, default_value = "docs")]
    pub dir_docs: String,

    /// Bucket for zip, tar, rpm, ...
    #[arg(long, default_value = "archives")]
    pub dir_archives: String,

    /// Bucket for pages and anything without a better guess
    #[arg(long, default_value = "html")]
    pub dir_pages: String,

    /// Hosts never to fetch (exact match)
    #[arg(long, default_value = DEFAULT_SKIPPED_HOSTS)]
    pub skipped_hosts: String,

    /// Never fetch URLs containing any of these
    #[arg(long)]
    pub skipped_urls: Option<String>,

    /// Only fetch from these hosts (exact match)
    #[arg(long)]
    pub only_hosts: Option<String>,

    /// Only fetch URLs containing one of these
    #[arg(long)]
    pub only_urls: Option<String>,

    /// Also fetch URLs with a query string (?page=2)
    #[arg(long)]
    pub dl_query: bool,

    /// Also store audio and video files
    #[arg(long)]
    pub dl_media: bool,

    /// Also store archives (zip, tar, ...)
    #[arg(long)]
    pub dl_archive: bool,

    /// Don't follow links above the directory of the start pages
    #[arg(long)]
    pub no_parent: bool,

    /// How many links deep to follow from a start page (0 = no limit)
    #[arg(long, default_value_t = 0)]
    pub max_depth: usize,

    /// Try failed downloads again
    #[arg(long)]
    pub retry: bool,

    /// How many times a failed download is tried again with --retry
    #[arg(long, default_value_t = 3)]
    pub retry_max_count: usize,

    /// Only keep pages declaring one of these languages (e.g. en,fr)
    #[arg(long)]
    pub langs: Option<String>,

    /// File or http(s) URL with hosts to cut off in saved pages
    #[arg(long)]
    pub offline_list: Option<String>,

    /// Keep <meta rel="pingback"> tags
    #[arg(long)]
    pub keep_meta: bool,

    /// Keep integrity/crossorigin attributes
    #[arg(long)]
    pub keep_integrity: bool,

    /// Largest response body to accept, in MiB
    #[arg(long, default_value_t = 64)]
    pub max_body_mb: usize,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Option<String> for some lists but String for --skipped-hosts?
//    - --skipped-hosts has a non-empty default, so it always has a value
//    - the others are "not given" by default, and None says that directly
//
// 2. What does `version` without a value do?
//    - clap fills it in from Cargo.toml (CARGO_PKG_VERSION)
//
// 3. Why concat!/env! for the user agent?
//    - both run at compile time, so the result is a plain &'static str that
//      can be used as a default value
// -----------------------------------------------------------------------------
