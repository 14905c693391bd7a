use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::error::RateError;
use crate::data::retry::{RetryConfig, RetryPolicy};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(6);

/// Endpoints for the primary market-price source and the composed
/// ticker x FX fallback.
#[derive(Debug, Clone)]
pub struct RateSources {
    pub market_url: String,
    pub ticker_url: String,
    pub fx_url: String,
}

impl Default for RateSources {
    fn default() -> Self {
        Self {
            market_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            ticker_url: "https://api.binance.com/api/v3/ticker/price".to_string(),
            fx_url: "https://api.frankfurter.app/latest".to_string(),
        }
    }
}

/// Native token to local currency exchange rate, with ordered fallbacks.
pub struct RateProvider {
    client: reqwest::Client,
    sources: RateSources,
    /// Market-price id of the native token, e.g. `ethereum`.
    token_id: String,
    /// Ticker pair priced in USD, e.g. `ETHUSDT`.
    ticker_symbol: String,
    /// Lowercase ISO currency code, e.g. `idr`.
    currency: String,
    retry: RetryPolicy,
}

impl RateProvider {
    pub fn new(token_id: &str, ticker_symbol: &str, currency: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(LOOKUP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            sources: RateSources::default(),
            token_id: token_id.to_lowercase(),
            ticker_symbol: ticker_symbol.to_uppercase(),
            currency: currency.to_lowercase(),
            retry: RetryPolicy::new(RetryConfig::lookup()),
        }
    }

    pub fn with_sources(mut self, sources: RateSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Best-effort rate: market price, then ticker x FX, then 0.0.
    pub async fn fetch_rate(&self) -> f64 {
        let rate = try_in_order(
            vec![
                ("market", self.market_rate().boxed()),
                ("ticker x fx", self.composed_rate().boxed()),
            ],
            0.0,
        )
        .await;
        if rate == 0.0 {
            warn!(currency = %self.currency, "all exchange-rate sources failed");
        }
        rate
    }

    /// Source A: `GET /simple/price?ids=<token>&vs_currencies=<currency>`.
    pub async fn market_rate(&self) -> Result<f64, RateError> {
        let body = self
            .get_json(
                &self.sources.market_url,
                &[("ids", self.token_id.as_str()), ("vs_currencies", self.currency.as_str())],
            )
            .await?;
        let value = body
            .get(&self.token_id)
            .and_then(|t| t.get(&self.currency))
            .and_then(Value::as_f64)
            .ok_or(RateError::MissingField("price"))?;
        positive(value)
    }

    /// Source B: USD ticker price multiplied by the USD to local FX rate.
    pub async fn composed_rate(&self) -> Result<f64, RateError> {
        let ticker = self
            .get_json(&self.sources.ticker_url, &[("symbol", self.ticker_symbol.as_str())])
            .await?;
        let usd_price = ticker
            .get("price")
            .and_then(|p| match p {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            })
            .ok_or(RateError::MissingField("price"))?;
        let usd_price = positive(usd_price)?;

        let symbol = self.currency.to_uppercase();
        let fx = self
            .get_json(&self.sources.fx_url, &[("base", "USD"), ("symbols", symbol.as_str())])
            .await?;
        let usd_to_local = fx
            .get("rates")
            .and_then(|r| r.get(&symbol))
            .and_then(Value::as_f64)
            .ok_or(RateError::MissingField("rates"))?;

        positive(usd_price * positive(usd_to_local)?)
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, RateError> {
        self.retry
            .retry_if(
                url,
                || async {
                    let body = self
                        .client
                        .get(url)
                        .query(query)
                        .send()
                        .await?
                        .error_for_status()?
                        .json::<Value>()
                        .await?;
                    Ok(body)
                },
                RateError::is_transient,
            )
            .await
    }
}

fn positive(value: f64) -> Result<f64, RateError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RateError::NonPositive(value))
    }
}

/// Await each labelled source in turn and return the first success, or
/// `default` when every source fails. Later sources are never polled once
/// an earlier one succeeds.
pub async fn try_in_order<'a, T, E>(sources: Vec<(&'static str, BoxFuture<'a, Result<T, E>>)>, default: T) -> T
where
    E: std::fmt::Display,
{
    for (name, source) in sources {
        match source.await {
            Ok(value) => {
                debug!(source = name, "rate source succeeded");
                return value;
            }
            Err(e) => warn!(source = name, error = %e, "rate source failed"),
        }
    }
    default
}
