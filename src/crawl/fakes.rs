// src/crawl/fakes.rs
// In-memory Fetcher and Store used by the tests. No network, no disk.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use super::fetch::{FetchedResource, Fetcher};
use super::store::Store;
use crate::error::MirrorError;

#[derive(Clone)]
struct Route {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
    final_url: Option<String>,
    transport_failures: usize,
}

/// Serves canned responses; unknown URLs get a 404
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, url: &str, route: Route) {
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }

    pub fn page(&self, url: &str, content_type: &str, body: &str) {
        self.insert(
            url,
            Route {
                status: 200,
                content_type: Some(content_type.to_string()),
                body: body.as_bytes().to_vec(),
                final_url: None,
                transport_failures: 0,
            },
        );
    }

    pub fn html(&self, url: &str, body: &str) {
        self.page(url, "text/html; charset=utf-8", body);
    }

    // Response without any Content-Type header
    pub fn untyped(&self, url: &str, body: &[u8]) {
        self.insert(
            url,
            Route {
                status: 200,
                content_type: None,
                body: body.to_vec(),
                final_url: None,
                transport_failures: 0,
            },
        );
    }

    pub fn status(&self, url: &str, status: u16) {
        self.insert(
            url,
            Route {
                status,
                content_type: None,
                body: Vec::new(),
                final_url: None,
                transport_failures: 0,
            },
        );
    }

    // `url` answers as if the server redirected to `final_url`
    pub fn redirected(&self, url: &str, final_url: &str, body: &str) {
        self.html(url, body);
        if let Some(route) = self.routes.lock().unwrap().get_mut(url) {
            route.final_url = Some(final_url.to_string());
        }
    }

    // The next `times` requests for `url` fail before reaching the server
    pub fn flaky(&self, url: &str, times: usize) {
        if let Some(route) = self.routes.lock().unwrap().get_mut(url) {
            route.transport_failures = times;
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, _delay: Duration) -> Result<FetchedResource, MirrorError> {
        self.requests.lock().unwrap().push(url.to_string());

        let route = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(route) if route.transport_failures > 0 => {
                    route.transport_failures -= 1;
                    return Err(MirrorError::fetch(url, "connection failed"));
                }
                Some(route) => route.clone(),
                None => Route {
                    status: 404,
                    content_type: None,
                    body: Vec::new(),
                    final_url: None,
                    transport_failures: 0,
                },
            }
        };

        // Let other tasks run, like a real request would
        tokio::task::yield_now().await;

        let mut headers = HashMap::new();
        if let Some(content_type) = route.content_type {
            headers.insert("content-type".to_string(), content_type);
        }

        Ok(FetchedResource {
            url: url.to_string(),
            final_url: route.final_url.unwrap_or_else(|| url.to_string()),
            status: route.status,
            headers,
            body: route.body,
        })
    }
}

/// Keeps stored files in a map; paths listed in `fail_on` error out
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_on: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: &str) {
        self.fail_on.lock().unwrap().push(path.to_string());
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn store(&self, body: &[u8], path: &str) -> Result<(), MirrorError> {
        if self.fail_on.lock().unwrap().iter().any(|p| p == path) {
            return Err(MirrorError::store(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ));
        }
        self.files.lock().unwrap().insert(path.to_string(), body.to_vec());
        Ok(())
    }
}
