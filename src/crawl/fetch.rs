// src/crawl/fetch.rs
// =============================================================================
// Downloading one URL.
//
// The pipeline only needs "give me the status, headers and body of this URL",
// so that's all the Fetcher trait promises. HttpFetcher is the real thing,
// built on reqwest; tests swap in an in-memory fake.
//
// HttpFetcher:
// - waits the politeness delay before each request
// - sends our User-Agent and gives up after the request timeout
// - follows up to 10 redirects (the final URL is reported back)
// - streams the body and stops once it grows past the size cap
//
// A non-2xx status is NOT an error at this level: the response comes back
// as-is and the caller decides what to do with it.
// =============================================================================

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{redirect, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::MirrorError;

const MAX_REDIRECTS: usize = 10;

/// Everything we keep from one HTTP response
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// The URL we asked for
    pub url: String,
    /// Where we ended up after redirects
    pub final_url: String,
    pub status: u16,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl FetchedResource {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to download a URL after waiting `delay`
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, delay: Duration) -> Result<FetchedResource, MirrorError>;
}

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    // Builds the shared reqwest client
    //
    // The client is created once and reused for every request so connections
    // get pooled.
    pub fn new(user_agent: &str, timeout: Duration, max_body_bytes: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, delay: Duration) -> Result<FetchedResource, MirrorError> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        if let Some(length) = response.content_length() {
            if usize::try_from(length).map_or(true, |length| length > self.max_body_bytes) {
                return Err(too_large(url, self.max_body_bytes));
            }
        }

        // Read the body chunk by chunk so a huge file can't eat all our memory
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| categorize_error(url, e))?;
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large(url, self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %url, status, bytes = body.len(), "fetched");

        Ok(FetchedResource {
            url: url.to_string(),
            final_url,
            status,
            headers,
            body,
        })
    }
}

fn too_large(url: &str, limit: usize) -> MirrorError {
    MirrorError::fetch(url, format!("body larger than {} bytes", limit))
}

// Turns a reqwest error into a FetchFailure with a readable reason
//
// reqwest errors can happen for many reasons:
// - request timeout
// - redirect loop / too many redirects
// - connection refused, DNS failure
// - TLS problems
fn categorize_error(url: &str, error: reqwest::Error) -> MirrorError {
    let error_string = error.to_string();

    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        if error_string.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            "connection failed".to_string()
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "SSL certificate error".to_string()
    } else {
        error_string
    };

    MirrorError::fetch(url, reason)
}
