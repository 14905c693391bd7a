pub mod batch;
pub mod cache;
pub mod chains;
pub mod error;
pub mod explorer;
pub mod export;
pub mod normalize;
pub mod rates;
pub mod retry;
pub mod signatures;
pub mod simulator;
pub mod types;

use serde_json::Value;
use tracing::info;

use crate::data::cache::RateCache;
use crate::data::error::FetchError;
use crate::data::explorer::{ExplorerClient, ProxyObject};
use crate::data::rates::RateProvider;
use crate::data::signatures::SignatureResolver;
use crate::data::types::{ChainTarget, RawFeeRecord, TxStatus};
use crate::utils::{compute_native_cost, format_local, format_utc, is_valid_tx_hash, parse_field, wei_to_gwei};

/// Ties the explorer, signature registry and rate provider together into
/// the fee lookup pipeline. Holds no mutable state of its own; the rate
/// cache is owned by the caller.
pub struct FeeService {
    explorer: ExplorerClient,
    signatures: SignatureResolver,
    rates: RateProvider,
    local_offset_hours: Option<i32>,
}

impl FeeService {
    pub fn new(
        explorer: ExplorerClient,
        signatures: SignatureResolver,
        rates: RateProvider,
        local_offset_hours: Option<i32>,
    ) -> Self {
        Self {
            explorer,
            signatures,
            rates,
            local_offset_hours,
        }
    }

    /// Current rate through the caller's cache.
    pub async fn current_rate(&self, cache: &RateCache) -> f64 {
        cache.get_or_refresh(&self.rates).await
    }

    /// Fails when no explorer API key is configured.
    pub fn ensure_credentials(&self) -> Result<(), FetchError> {
        self.explorer.api_key().map(|_| ())
    }

    pub fn rates(&self) -> &RateProvider {
        &self.rates
    }

    /// Look up `hash` on the chain registered under `chain`. When `rate` is
    /// `None` the exchange rate is read through `cache`.
    pub async fn fetch_transaction(
        &self,
        chain: &str,
        hash: &str,
        rate: Option<f64>,
        cache: &RateCache,
    ) -> Result<RawFeeRecord, FetchError> {
        let target = chains::get_chain(chain)
            .ok_or_else(|| FetchError::UnsupportedChain(chain.to_string()))?;
        check_hash(hash)?;
        let rate = match rate {
            Some(rate) => rate,
            None => {
                // A missing key must fail before any request.
                self.explorer.api_key()?;
                self.current_rate(cache).await
            }
        };
        self.fetch_on(target, hash, rate).await
    }

    pub async fn fetch_on(
        &self,
        chain: &ChainTarget,
        hash: &str,
        rate: f64,
    ) -> Result<RawFeeRecord, FetchError> {
        check_hash(hash)?;
        self.explorer.api_key()?;

        let tx = self.explorer.get_transaction(chain, hash).await?;
        let block_tag = non_empty_str(tx.get("blockNumber"))
            .ok_or_else(|| FetchError::Pending(hash.to_string()))?
            .to_string();
        let receipt = self.explorer.get_transaction_receipt(chain, hash).await?;
        let block = self.explorer.get_block(chain, &block_tag).await?;

        let block_time = to_u64(parse_field(block.get("timestamp"), 0));
        let gas_used = to_u64(parse_field(receipt.get("gasUsed"), 0));
        let gas_price_wei = effective_gas_price(&receipt, &tx);
        let cost_native = compute_native_cost(gas_used, gas_price_wei);

        let cost_local = if rate.is_finite() && rate > 0.0 {
            cost_native * rate
        } else {
            0.0
        };

        let selector = method_selector(non_empty_str(tx.get("input")).unwrap_or("0x"));
        let function_name = self.signatures.resolve_function_name(selector).await;

        let record = RawFeeRecord {
            timestamp: format_utc(block_time),
            local_timestamp: self.local_offset_hours.map(|h| format_local(block_time, h)),
            network: chain.display_name.to_string(),
            tx_hash: hash.to_string(),
            contract: non_empty_str(tx.get("to")).map(str::to_string),
            from: non_empty_str(tx.get("from")).map(str::to_string),
            function_name: Some(function_name).filter(|f| !f.is_empty()),
            block_number: to_u64(parse_field(Some(&Value::String(block_tag)), 0)),
            gas_used,
            gas_price_wei,
            gas_price_gwei: wei_to_gwei(gas_price_wei),
            cost_native,
            cost_local,
            status: Some(TxStatus::from_receipt_status(parse_field(receipt.get("status"), 0))),
        };
        info!(chain = chain.name, hash, gas_used, cost_native, "transaction fetched");
        Ok(record)
    }
}

fn check_hash(hash: &str) -> Result<(), FetchError> {
    if is_valid_tx_hash(hash) {
        Ok(())
    } else {
        Err(FetchError::InvalidHash(hash.to_string()))
    }
}

/// Receipt `effectiveGasPrice`, then transaction `gasPrice`, then 0.
fn effective_gas_price(receipt: &ProxyObject, tx: &ProxyObject) -> u128 {
    non_empty(receipt.get("effectiveGasPrice"))
        .or_else(|| non_empty(tx.get("gasPrice")))
        .map(|v| crate::utils::parse_int(v, 0))
        .unwrap_or(0)
}

/// First 4 bytes of calldata as `0x` + 8 hex chars; empty for plain transfers.
fn method_selector(input: &str) -> &str {
    if input.is_empty() || input == "0x" {
        return "";
    }
    input.get(..10).unwrap_or(input)
}

fn non_empty(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn to_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
