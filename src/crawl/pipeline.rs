// src/crawl/pipeline.rs
// =============================================================================
// The mirror engine: drives the frontier until there is nothing left to do.
//
// How it works:
// 1. Normalize the seeds and push them onto the frontier
// 2. The driver loop waits for a free slot (semaphore), pops a URL and
//    spawns a task for it
// 3. Each task:
//    - checks the scope policy        -> Rejected
//    - fetches the URL                -> Failed on error or non-2xx
//    - checks the content policy      -> Skipped (media, archives, language)
//    - stores the body under its name -> Failed on disk errors
//    - for HTML pages, finds the links, resolves and normalizes them and
//      pushes every URL it hasn't seen before
// 4. The driver stops once the frontier is empty and no task is running
//
// With --retry, a failed fetch goes back onto the frontier a few times before
// it counts as Failed.
// =============================================================================

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::fetch::{FetchedResource, Fetcher};
use super::frontier::{Claim, Entry, Frontier};
use super::lang::language_allowed;
use super::report::{CrawlReport, UrlState};
use super::store::Store;
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::links::{extract_links, normalize, resolve};
use crate::naming::name_path;
use crate::offline::{rewrite_for_offline, strip_integrity_attrs, strip_pingback_meta, OfflineHosts};
use crate::scope::{is_html, may_fetch, within_seeds};

// How a fetched URL ended, when nothing went wrong
enum Outcome {
    Stored,
    Skipped(&'static str),
}

pub struct Mirror {
    shared: Arc<Shared>,
}

// Everything the tasks need, shared read-only (apart from the frontier and
// the report, which have their own locks)
struct Shared {
    config: Arc<MirrorConfig>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn Store>,
    offline: OfflineHosts,
    seeds: Vec<String>,
    frontier: Arc<Frontier>,
    report: Mutex<CrawlReport>,
}

impl Mirror {
    pub fn new(
        config: Arc<MirrorConfig>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn Store>,
        offline: OfflineHosts,
    ) -> Self {
        let mut seeds = Vec::new();
        for raw in &config.seeds {
            match normalize(raw) {
                Ok(url) if !seeds.contains(&url) => seeds.push(url),
                Ok(_) => {}
                Err(e) => warn!(seed = %raw, error = %e, "ignoring seed"),
            }
        }

        Self {
            shared: Arc::new(Shared {
                config,
                fetcher,
                store,
                offline,
                seeds,
                frontier: Arc::new(Frontier::new()),
                report: Mutex::new(CrawlReport::new()),
            }),
        }
    }

    // Runs the crawl to completion
    //
    // Returns: the report, or NoSeeds if none of the seeds was usable.
    // Per-URL problems never abort the crawl; they end up in the report.
    pub async fn run(self) -> Result<CrawlReport, MirrorError> {
        let shared = self.shared;
        if shared.seeds.is_empty() {
            return Err(MirrorError::NoSeeds);
        }

        // LIFO frontier: push in reverse so the first seed is visited first
        for seed in shared.seeds.iter().rev() {
            if shared.frontier.mark_seen(seed) {
                shared.record(seed, UrlState::Pending);
                shared.frontier.push(Entry::seed(seed.clone()));
            }
        }

        info!(
            seeds = shared.seeds.len(),
            concurrency = shared.config.concurrency,
            "starting mirror"
        );
        drive(&shared).await;

        let mut report = std::mem::take(&mut *shared.report());
        report.finish();
        info!(
            stored = report.stored,
            rejected = report.rejected,
            skipped = report.skipped,
            failed = report.failed,
            "mirror finished"
        );
        Ok(report)
    }
}

// The driver loop
//
// Only this loop pops from the frontier. A slot is taken before popping, so
// at most `concurrency` tasks run at once, and the slot travels with the
// task until it finishes (successfully or not).
async fn drive(shared: &Arc<Shared>) {
    let slots = Arc::new(Semaphore::new(shared.config.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    loop {
        while let Some(joined) = tasks.try_join_next() {
            log_joined(joined);
        }

        let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };

        match shared.frontier.pop() {
            Some(claim) => {
                let shared = Arc::clone(shared);
                tasks.spawn(async move {
                    let _permit = permit;
                    shared.visit(claim).await;
                });
            }
            None => {
                drop(permit);
                if shared.frontier.is_drained() {
                    break;
                }
                // A running task will push links or finish; either wakes us
                shared.frontier.changed().await;
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        log_joined(joined);
    }
}

fn log_joined(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "mirror task failed");
    }
}

impl Shared {
    fn report(&self) -> MutexGuard<'_, CrawlReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, url: &str, state: UrlState) {
        self.report().record(url, state);
    }

    async fn visit(&self, claim: Claim) {
        let entry = &claim.entry;
        let url = entry.url.as_str();
        self.record(url, UrlState::Fetching);

        if !self.in_scope(entry) {
            debug!(url = %url, "rejected by scope policy");
            self.record(url, UrlState::Rejected);
            return;
        }

        match self.fetch_and_store(entry).await {
            Ok(Outcome::Stored) => self.record(url, UrlState::Stored),
            Ok(Outcome::Skipped(reason)) => {
                debug!(url = %url, reason, "skipped");
                self.record(url, UrlState::Skipped);
            }
            Err(e) if e.is_retryable() && entry.attempts < self.config.retry_max_count => {
                warn!(url = %url, attempt = entry.attempts + 1, error = %e, "retrying");
                {
                    let mut report = self.report();
                    report.retried += 1;
                    report.record(url, UrlState::Pending);
                }
                self.frontier.push(entry.retry());
            }
            Err(e) => {
                warn!(url = %url, error = %e, "failed");
                self.report().record_failure(url, &e);
            }
        }
        // `claim` drops here, after any links were pushed
    }

    fn in_scope(&self, entry: &Entry) -> bool {
        match may_fetch(&entry.url, &self.config.scope) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "cannot check scope");
                return false;
            }
        }

        // --no-parent never applies to the seeds themselves
        !(self.config.no_parent && entry.depth > 0 && !within_seeds(&entry.url, &self.seeds))
    }

    async fn fetch_and_store(&self, entry: &Entry) -> Result<Outcome, MirrorError> {
        let url = entry.url.as_str();
        let resource = self.fetcher.fetch(url, self.config.delay).await?;

        if !resource.is_success() {
            return Err(MirrorError::fetch(url, format!("HTTP {}", resource.status)));
        }

        let content_type = resource.content_type();
        if !self.config.content.allows(content_type) {
            return Ok(Outcome::Skipped("content type"));
        }

        let layout = &self.config.layout;
        let path = name_path(url, layout);

        // No Content-Type: trust the name we gave it
        let is_page = is_html(content_type).unwrap_or_else(|| layout.is_page_bucket(&layout.bucket(url)));
        if !is_page {
            self.store.store(&resource.body, &path).await?;
            info!(url = %url, path = %path, "stored");
            return Ok(Outcome::Stored);
        }

        let text = String::from_utf8_lossy(&resource.body);
        if !language_allowed(&text, &self.config.langs) {
            return Ok(Outcome::Skipped("language"));
        }

        let body = self.prepare_document(&resource.body);
        self.store.store(&body, &path).await?;
        info!(url = %url, path = %path, "stored");

        if self.config.max_depth == 0 || entry.depth < self.config.max_depth {
            self.discover(entry, &resource, &text);
        }

        Ok(Outcome::Stored)
    }

    // Offline rewrite and tag cleanup, as configured
    fn prepare_document<'a>(&self, document: &'a [u8]) -> Cow<'a, [u8]> {
        let mut document = Cow::Borrowed(document);

        if !self.offline.is_empty() {
            document = Cow::Owned(rewrite_for_offline(&document, &self.offline));
        }
        if !self.config.keep_integrity {
            document = Cow::Owned(strip_integrity_attrs(&document));
        }
        if !self.config.keep_meta {
            document = Cow::Owned(strip_pingback_meta(&document).into_owned());
        }

        document
    }

    // Pushes every link on the page that the frontier hasn't seen yet
    //
    // Links are resolved against the URL we were redirected to, because that's
    // what the browser would do.
    fn discover(&self, entry: &Entry, resource: &FetchedResource, document: &str) {
        let base = resource.final_url.as_str();
        let mut pushed = 0;
        let mut dropped = 0;

        for raw in extract_links(document) {
            if raw.starts_with('#') {
                continue;
            }

            let absolute = match resolve(base, raw, true) {
                Ok(absolute) => absolute,
                Err(e) => {
                    debug!(base = %base, link = %raw, error = %e, "dropping link");
                    dropped += 1;
                    continue;
                }
            };
            let without_fragment = absolute.split('#').next().unwrap_or(&absolute);

            let url = match normalize(without_fragment) {
                Ok(url) => url,
                Err(e) => {
                    debug!(base = %base, link = %raw, error = %e, "dropping link");
                    dropped += 1;
                    continue;
                }
            };

            if self.frontier.mark_seen(&url) {
                self.record(&url, UrlState::Pending);
                self.frontier.push(entry.child(url));
                pushed += 1;
            }
        }

        if dropped > 0 {
            self.report().dropped += dropped;
        }
        debug!(url = %entry.url, pushed, dropped, "links discovered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fakes::{FakeFetcher, MemoryStore};
    use crate::scope::ScopeConfig;
    use std::time::Duration;

    fn config(seeds: &[&str]) -> MirrorConfig {
        MirrorConfig {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            delay: Duration::ZERO,
            ..MirrorConfig::default()
        }
    }

    async fn mirror(
        cfg: MirrorConfig,
        fetcher: &Arc<FakeFetcher>,
        store: &Arc<MemoryStore>,
    ) -> Result<CrawlReport, MirrorError> {
        Mirror::new(Arc::new(cfg), fetcher.clone(), store.clone(), OfflineHosts::default())
            .run()
            .await
    }

    fn three_pages() -> Arc<FakeFetcher> {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html(
            "http://example.com/home.html",
            r#"<a href="about.html">About</a> <a href='/contact.html'>Contact</a>"#,
        );
        fetcher.html("http://example.com/about.html", "<p>about</p>");
        fetcher.html("http://example.com/contact.html", "<p>contact</p>");
        fetcher
    }

    #[tokio::test]
    async fn test_three_page_site() {
        let fetcher = three_pages();
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["example.com/home.html"]), &fetcher, &store)
            .await
            .unwrap();

        assert_eq!(report.stored, 3);
        assert_eq!(report.failed, 0);
        for url in [
            "http://example.com/home.html",
            "http://example.com/about.html",
            "http://example.com/contact.html",
        ] {
            assert_eq!(report.state_of(url), Some(UrlState::Stored), "{}", url);
        }
        assert_eq!(
            store.paths(),
            vec![
                "html/example.com/about.html",
                "html/example.com/contact.html",
                "html/example.com/home.html",
            ]
        );
    }

    #[tokio::test]
    async fn test_cycles_terminate() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html("http://example.com/a.html", r#"<a href="b.html">b</a> <a href="a.html#top">me</a>"#);
        fetcher.html("http://example.com/b.html", r##"<a href="a.html">a</a> <a href="#">top</a>"##);
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["http://example.com/a.html"]), &fetcher, &store)
            .await
            .unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(fetcher.request_count("http://example.com/a.html"), 1);
        assert_eq!(fetcher.request_count("http://example.com/b.html"), 1);
    }

    #[tokio::test]
    async fn test_stored_urls_are_in_scope() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html(
            "http://example.com/",
            r#"<a href="/list?page=2">next</a>
               <a href="https://youtube.com/watch">video</a>
               <a href="/private/x.html">private</a>
               <a href="/docs/a.html">docs</a>"#,
        );
        fetcher.html("http://example.com/docs/a.html", "<p>a</p>");
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/"]);
        cfg.scope.skipped_urls = vec!["/private/".to_string()];
        let scope: ScopeConfig = cfg.scope.clone();

        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(report.rejected, 3);
        for url in report.urls_in(UrlState::Stored) {
            assert!(may_fetch(url, &scope).unwrap(), "{}", url);
        }
        // rejected URLs never reach the network
        assert_eq!(fetcher.request_count("https://youtube.com/watch"), 0);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_no_usable_seeds() {
        let fetcher = Arc::new(FakeFetcher::new());
        let store = Arc::new(MemoryStore::new());

        let err = mirror(config(&["ftp://example.com/", "mailto:me@example.com"]), &fetcher, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::NoSeeds));
    }

    #[tokio::test]
    async fn test_failed_fetches() {
        let fetcher = three_pages();
        fetcher.status("http://example.com/about.html", 404);
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["example.com/home.html"]), &fetcher, &store)
            .await
            .unwrap();

        assert_eq!((report.stored, report.failed), (2, 1));
        assert_eq!(report.failures[0].url, "http://example.com/about.html");
        assert!(report.failures[0].error.contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let fetcher = three_pages();
        fetcher.flaky("http://example.com/about.html", 2);
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/home.html"]);
        cfg.retry_max_count = 3;
        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 3);
        assert_eq!(report.retried, 2);
        assert_eq!(fetcher.request_count("http://example.com/about.html"), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let fetcher = three_pages();
        fetcher.flaky("http://example.com/about.html", 10);
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/home.html"]);
        cfg.retry_max_count = 2;
        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.retried, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(fetcher.request_count("http://example.com/about.html"), 3);
    }

    #[tokio::test]
    async fn test_store_failures_are_not_retried() {
        let fetcher = three_pages();
        let store = Arc::new(MemoryStore::new());
        store.fail_on("html/example.com/contact.html");

        let mut cfg = config(&["example.com/home.html"]);
        cfg.retry_max_count = 3;
        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.state_of("http://example.com/contact.html"), Some(UrlState::Failed));
        assert_eq!(report.retried, 0);
        assert_eq!(fetcher.request_count("http://example.com/contact.html"), 1);
    }

    #[tokio::test]
    async fn test_media_and_archives_are_skipped() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html(
            "http://example.com/",
            r#"<video src="/intro.mp4"></video> <a href="/src.zip">source</a> <img src="/logo.png">"#,
        );
        fetcher.page("http://example.com/intro.mp4", "video/mp4", "....");
        fetcher.page("http://example.com/src.zip", "application/zip", "PK..");
        fetcher.page("http://example.com/logo.png", "image/png", "png");
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["example.com/"]), &fetcher, &store).await.unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.stored, 2);
        assert!(store.paths().contains(&"assets/images/png/example.com/logo.png".to_string()));

        let mut cfg = config(&["example.com/"]);
        cfg.content.download_media = true;
        let store = Arc::new(MemoryStore::new());
        let report = mirror(cfg, &fetcher, &store).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert!(store.paths().contains(&"media/videos/mp4/example.com/intro.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_assets_are_not_scanned() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html("http://example.com/", r#"<link href="/site.css">"#);
        fetcher.page("http://example.com/site.css", "text/css", r#"a { background: url(x.png) } href="/hidden.html""#);
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["example.com/"]), &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(fetcher.request_count("http://example.com/hidden.html"), 0);
    }

    #[tokio::test]
    async fn test_untyped_response_uses_name() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.untyped("http://example.com/", br#"<a href="/next">next</a>"#);
        fetcher.html("http://example.com/next", "<p>end</p>");
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["example.com/"]), &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(report.state_of("http://example.com/next"), Some(UrlState::Stored));
    }

    #[tokio::test]
    async fn test_max_depth() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html("http://example.com/0.html", r#"<a href="1.html">1</a>"#);
        fetcher.html("http://example.com/1.html", r#"<a href="2.html">2</a>"#);
        fetcher.html("http://example.com/2.html", "<p>deep</p>");
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/0.html"]);
        cfg.max_depth = 1;
        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(report.state_of("http://example.com/2.html"), None);
    }

    #[tokio::test]
    async fn test_no_parent() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html(
            "http://example.com/docs/index.html",
            r#"<a href="guide/intro.html">intro</a> <a href="/blog/">blog</a>"#,
        );
        fetcher.html("http://example.com/docs/guide/intro.html", "<p>intro</p>");
        fetcher.html("http://example.com/blog/", "<p>blog</p>");
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/docs/index.html"]);
        cfg.no_parent = true;
        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(report.state_of("http://example.com/blog/"), Some(UrlState::Rejected));
    }

    #[tokio::test]
    async fn test_language_filter() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html(
            "http://example.com/",
            r#"<html lang="en"><a href="/ja/">ja</a> <a href="/fr/">fr</a></html>"#,
        );
        fetcher.html("http://example.com/ja/", r#"<html lang="ja"><a href="/ja/more">more</a></html>"#);
        fetcher.html("http://example.com/fr/", r#"<html lang="fr-CA"></html>"#);
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/"]);
        cfg.langs = vec!["en".to_string(), "fr".to_string()];
        let report = mirror(cfg, &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert_eq!(report.state_of("http://example.com/ja/"), Some(UrlState::Skipped));
        // links on a skipped page are not followed
        assert_eq!(fetcher.request_count("http://example.com/ja/more"), 0);
    }

    #[tokio::test]
    async fn test_saved_pages_are_prepared_for_offline_use() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.html(
            "http://example.com/",
            r#"<head><meta rel="pingback" href="/xmlrpc.php"><script src="https://cdn.tracker.com/t.js" integrity="sha384-x"></script></head>"#,
        );
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/"]);
        cfg.scope.skipped_hosts = vec!["cdn.tracker.com".to_string()];
        let offline = OfflineHosts::new(["tracker.com"]);
        let report = Mirror::new(Arc::new(cfg), fetcher.clone(), store.clone(), offline)
            .run()
            .await
            .unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(
            store.text("html/example.com/index.html").unwrap(),
            r#"<head><script src="https://0.0.0.0/cdn.tracker.com/t.js"></script></head>"#
        );
    }

    #[tokio::test]
    async fn test_non_utf8_pages_are_rewritten_too() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.untyped(
            "http://example.com/",
            b"<p>caf\xE9</p><script src=\"https://cdn.tracker.com/t.js\" integrity=\"sha384-x\"></script>",
        );
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/"]);
        cfg.scope.skipped_hosts = vec!["cdn.tracker.com".to_string()];
        let offline = OfflineHosts::new(["tracker.com"]);
        let report = Mirror::new(Arc::new(cfg), fetcher.clone(), store.clone(), offline)
            .run()
            .await
            .unwrap();

        assert_eq!(report.state_of("http://example.com/"), Some(UrlState::Stored));
        let saved = store.bytes("html/example.com/index.html").unwrap();
        assert_eq!(
            saved,
            b"<p>caf\xE9</p><script src=\"https://0.0.0.0/cdn.tracker.com/t.js\"></script>".to_vec()
        );
    }

    #[tokio::test]
    async fn test_redirected_page_resolves_against_final_url() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.redirected("http://example.com/old", "http://example.com/new/", r#"<a href="child.html">c</a>"#);
        fetcher.html("http://example.com/new/child.html", "<p>child</p>");
        let store = Arc::new(MemoryStore::new());

        let report = mirror(config(&["example.com/old"]), &fetcher, &store).await.unwrap();

        assert_eq!(report.stored, 2);
        assert!(store.paths().contains(&"html/example.com/old".to_string()));
        assert!(store.paths().contains(&"html/example.com/new/child.html".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_crawl_finishes() {
        let fetcher = Arc::new(FakeFetcher::new());
        let mut index = String::new();
        for i in 0..20 {
            index.push_str(&format!(r#"<a href="/p{}.html">{}</a>"#, i, i));
            fetcher.html(
                &format!("http://example.com/p{}.html", i),
                &format!(r#"<a href="/p{}.html">next</a> <a href="/">home</a>"#, (i + 1) % 20),
            );
        }
        fetcher.html("http://example.com/", &index);
        let store = Arc::new(MemoryStore::new());

        let mut cfg = config(&["example.com/"]);
        cfg.concurrency = 4;
        let report = tokio::time::timeout(Duration::from_secs(10), mirror(cfg, &fetcher, &store))
            .await
            .expect("crawl should terminate")
            .unwrap();

        assert_eq!(report.stored, 21);
        assert_eq!(fetcher.requests().len(), 21);
    }
}
