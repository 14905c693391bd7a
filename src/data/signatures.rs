use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Deserialize;
use tracing::debug;

use crate::data::retry::{RetryConfig, RetryPolicy};

const DEFAULT_REGISTRY_URL: &str = "https://www.4byte.directory/api/v1";
const SELECTOR_CACHE_SIZE: usize = 2000;

#[derive(Debug, Deserialize)]
struct SignaturePage {
    #[serde(default)]
    results: Vec<SignatureEntry>,
}

#[derive(Debug, Deserialize)]
struct SignatureEntry {
    text_signature: String,
    #[serde(default)]
    created_at: Option<String>,
}

/// Resolves 4-byte method selectors to function names via the 4byte.directory
/// registry. Lookups never fail; the selector itself is the fallback.
pub struct SignatureResolver {
    client: reqwest::Client,
    registry_url: String,
    retry: RetryPolicy,
    selector_cache: Mutex<LruCache<String, String>>,
}

impl SignatureResolver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(6))
                .build()
                .unwrap_or_default(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            retry: RetryPolicy::new(RetryConfig::lookup()),
            selector_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(SELECTOR_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Function name for `selector` (e.g. `0xa9059cbb` -> `transfer`).
    /// Empty input returns an empty string without a request; any failure
    /// or empty result returns the selector unchanged.
    pub async fn resolve_function_name(&self, selector: &str) -> String {
        if selector.is_empty() {
            return String::new();
        }
        let key = selector.to_lowercase();

        if let Ok(mut cache) = self.selector_cache.lock() {
            if let Some(name) = cache.get(&key) {
                return name.clone();
            }
        }

        match self.lookup(&key).await {
            Some(name) => {
                if let Ok(mut cache) = self.selector_cache.lock() {
                    cache.put(key, name.clone());
                }
                name
            }
            None => selector.to_string(),
        }
    }

    /// GET {registry}/signatures/?hex_signature={selector}
    async fn lookup(&self, selector: &str) -> Option<String> {
        let url = format!("{}/signatures/", self.registry_url.trim_end_matches('/'));
        let page = self
            .retry
            .retry_if(
                selector,
                || async {
                    self.client
                        .get(&url)
                        .query(&[("hex_signature", selector)])
                        .send()
                        .await?
                        .error_for_status()?
                        .json::<SignaturePage>()
                        .await
                },
                crate::data::error::is_retryable_http,
            )
            .await;

        match page {
            Ok(page) => newest_function_name(&page.results),
            Err(e) => {
                debug!(selector, error = %e, "signature lookup failed");
                None
            }
        }
    }
}

impl Default for SignatureResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of the most recently created signature, i.e. the text before `(`.
fn newest_function_name(entries: &[SignatureEntry]) -> Option<String> {
    let newest = entries.iter().max_by_key(|e| {
        e.created_at
            .as_deref()
            .and_then(|ts| ts.parse::<DateTime<Utc>>().ok())
    })?;
    let name = newest
        .text_signature
        .split('(')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() { None } else { Some(name.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn resolver(url: String) -> SignatureResolver {
        SignatureResolver::new()
            .with_registry_url(url)
            .with_retry(RetryPolicy::new(RetryConfig::immediate(1)))
    }

    fn entry(sig: &str, created_at: Option<&str>) -> SignatureEntry {
        SignatureEntry {
            text_signature: sig.to_string(),
            created_at: created_at.map(str::to_string),
        }
    }

    #[test]
    fn test_newest_entry_wins() {
        let entries = vec![
            entry("transfer(address,uint256)", Some("2016-07-09T03:58:28.234977Z")),
            entry("many_msg_babbage(bytes1)", Some("2018-05-11T08:39:29.708250Z")),
            entry("func_2093253501(bytes)", Some("2017-01-01T00:00:00Z")),
        ];
        assert_eq!(newest_function_name(&entries).as_deref(), Some("many_msg_babbage"));
    }

    #[test]
    fn test_empty_results() {
        assert!(newest_function_name(&[]).is_none());
    }

    #[tokio::test]
    async fn test_empty_selector_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/signatures/")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        assert_eq!(resolver(server.url()).resolve_function_name("").await, "");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolves_and_memoises() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/signatures/")
            .match_query(Matcher::UrlEncoded("hex_signature".into(), "0xa9059cbb".into()))
            .with_status(200)
            .with_body(
                r#"{"count":1,"results":[{"id":145,"created_at":"2016-07-09T03:58:28.234977Z","text_signature":"transfer(address,uint256)","hex_signature":"0xa9059cbb"}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(server.url());
        assert_eq!(resolver.resolve_function_name("0xa9059cbb").await, "transfer");
        assert_eq!(resolver.resolve_function_name("0xA9059CBB").await, "transfer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_selector_returned_unchanged() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/signatures/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"count":0,"results":[]}"#)
            .create_async()
            .await;
        assert_eq!(resolver(server.url()).resolve_function_name("0xdeadbeef").await, "0xdeadbeef");
    }

    #[tokio::test]
    async fn test_registry_error_returns_selector() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/signatures/")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        assert_eq!(resolver(server.url()).resolve_function_name("0x095ea7b3").await, "0x095ea7b3");
    }
}
