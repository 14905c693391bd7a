use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::data::chains::V2_API_URL;
use crate::data::error::FetchError;
use crate::data::retry::RetryPolicy;
use crate::data::types::{ApiVersion, ChainTarget};

/// JSON object returned in the `result` field of a proxy call.
pub type ProxyObject = Map<String, Value>;

const DATA_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the explorer's JSON-RPC proxy module
/// (`module=proxy&action=eth_*`).
pub struct ExplorerClient {
    client: reqwest::Client,
    api_key: Option<String>,
    version: ApiVersion,
    base_url: Option<String>,
    retry: RetryPolicy,
}

impl ExplorerClient {
    pub fn new(api_key: Option<String>, version: ApiVersion) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DATA_CALL_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            version,
            base_url: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Send every request to `url` instead of the chain's endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The configured API key, or `MissingCredential`.
    pub fn api_key(&self) -> Result<&str, FetchError> {
        self.api_key.as_deref().ok_or(FetchError::MissingCredential)
    }

    fn endpoint<'a>(&'a self, chain: &'a ChainTarget) -> &'a str {
        if let Some(url) = &self.base_url {
            return url;
        }
        match self.version {
            ApiVersion::V1 => chain.api_url,
            ApiVersion::V2 => V2_API_URL,
        }
    }

    fn query(
        &self,
        chain: &ChainTarget,
        action: &str,
        api_key: &str,
        params: &[(&'static str, String)],
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![("module", "proxy".to_string()), ("action", action.to_string())];
        if self.version == ApiVersion::V2 {
            query.push(("chainid", chain.chain_id.to_string()));
        }
        query.push(("apikey", api_key.to_string()));
        query.extend(params.iter().cloned());
        query
    }

    /// Issue one proxy action with retry. Every failure, including a
    /// response without a usable `result`, counts as a failed attempt.
    pub async fn proxy_call(
        &self,
        chain: &ChainTarget,
        action: &str,
        params: &[(&'static str, String)],
    ) -> Result<ProxyObject, FetchError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(chain);
        let query = self.query(chain, action, api_key, params);
        let label = format!("{}:{action}", chain.name);

        self.retry
            .retry_if(
                &label,
                || async {
                    debug!(chain = chain.name, action, "explorer request");
                    let body: Value = self
                        .client
                        .get(url)
                        .query(&query)
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?;
                    extract_result(body)
                },
                FetchError::is_transient,
            )
            .await
    }

    pub async fn get_transaction(&self, chain: &ChainTarget, hash: &str) -> Result<ProxyObject, FetchError> {
        self.proxy_call(chain, "eth_getTransactionByHash", &[("txhash", hash.to_string())])
            .await
    }

    pub async fn get_transaction_receipt(
        &self,
        chain: &ChainTarget,
        hash: &str,
    ) -> Result<ProxyObject, FetchError> {
        self.proxy_call(chain, "eth_getTransactionReceipt", &[("txhash", hash.to_string())])
            .await
    }

    /// Block header only; `block_tag` is the hex block number.
    pub async fn get_block(&self, chain: &ChainTarget, block_tag: &str) -> Result<ProxyObject, FetchError> {
        self.proxy_call(
            chain,
            "eth_getBlockByNumber",
            &[("tag", block_tag.to_string()), ("boolean", "false".to_string())],
        )
        .await
    }
}

/// Pull the structured `result` out of a proxy response.
fn extract_result(body: Value) -> Result<ProxyObject, FetchError> {
    let Value::Object(mut body) = body else {
        return Err(FetchError::InvalidResult("response is not a JSON object".into()));
    };
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(FetchError::InvalidResult(message));
    }
    match body.remove("result") {
        Some(Value::Object(result)) => Ok(result),
        Some(Value::String(message)) => Err(FetchError::InvalidResult(message)),
        Some(Value::Null) | None => Err(FetchError::InvalidResult("result is empty".into())),
        Some(other) => Err(FetchError::InvalidResult(format!("unexpected result: {other}"))),
    }
}
