use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::data::FeeService;
use crate::data::error::FetchError;
use crate::data::normalize::normalize;
use crate::data::types::{BatchFailure, BatchResult, ChainTarget, RawFeeRecord};
use crate::utils::is_valid_tx_hash;

/// Anything that can produce a fee record for one (chain, hash) pair.
pub trait FeeSource {
    fn fetch_fee(
        &self,
        chain: &ChainTarget,
        hash: &str,
        rate: f64,
    ) -> impl Future<Output = Result<RawFeeRecord, FetchError>>;
}

impl FeeSource for FeeService {
    async fn fetch_fee(&self, chain: &ChainTarget, hash: &str, rate: f64) -> Result<RawFeeRecord, FetchError> {
        self.fetch_on(chain, hash, rate).await
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pause between consecutive pairs.
    pub delay: Duration,
    pub cancel: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(250),
            cancel: CancellationToken::new(),
        }
    }
}

/// Well-formed hashes in first-seen order, duplicates removed
/// case-insensitively.
pub fn prepare_hashes(hashes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    hashes
        .iter()
        .map(|h| h.trim())
        .filter(|h| is_valid_tx_hash(h))
        .filter(|h| seen.insert(h.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Fetch every (chain, hash) pair sequentially, chains outer and hashes
/// inner. Per-pair failures are recorded and never abort the run.
/// `progress` receives `(done, total)` after each pair.
pub async fn run_batch<S, P>(
    source: &S,
    hashes: &[String],
    chains: &[&ChainTarget],
    rate: f64,
    options: &BatchOptions,
    mut progress: P,
) -> BatchResult
where
    S: FeeSource,
    P: FnMut(usize, usize),
{
    let hashes = prepare_hashes(hashes);
    let total = chains.len() * hashes.len();
    let mut result = BatchResult::default();
    let mut done = 0;

    'pairs: for chain in chains {
        for hash in &hashes {
            if options.cancel.is_cancelled() {
                result.cancelled = true;
                break 'pairs;
            }
            if done > 0 && !options.delay.is_zero() {
                tokio::select! {
                    _ = options.cancel.cancelled() => {
                        result.cancelled = true;
                        break 'pairs;
                    }
                    _ = tokio::time::sleep(options.delay) => {}
                }
            }

            match source.fetch_fee(chain, hash, rate).await {
                Ok(raw) => {
                    let mut row = normalize(&raw);
                    row.network = chain.display_name.to_string();
                    row.tx_hash = hash.clone();
                    result.rows.push(row);
                }
                Err(e) => {
                    warn!(chain = chain.name, hash = %hash, error = %e, "batch pair failed");
                    result.failures.push(BatchFailure {
                        chain: chain.display_name.to_string(),
                        hash: hash.clone(),
                        error: e.to_string(),
                    });
                }
            }

            done += 1;
            progress(done, total);
        }
    }

    info!(
        rows = result.rows.len(),
        failures = result.failures.len(),
        cancelled = result.cancelled,
        "batch finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chains::get_chain;
    use std::sync::Mutex;

    struct FakeSource {
        failing: Option<(&'static str, String)>,
        calls: Mutex<Vec<(String, String)>>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                failing: None,
                calls: Mutex::new(Vec::new()),
                cancel_after: None,
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FeeSource for FakeSource {
        async fn fetch_fee(&self, chain: &ChainTarget, hash: &str, rate: f64) -> Result<RawFeeRecord, FetchError> {
            let count = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((chain.name.to_string(), hash.to_string()));
                calls.len()
            };
            if let Some((n, token)) = &self.cancel_after {
                if count == *n {
                    token.cancel();
                }
            }
            if let Some((c, h)) = &self.failing {
                if *c == chain.name && h == hash {
                    return Err(FetchError::InvalidResult("not found".to_string()));
                }
            }
            Ok(RawFeeRecord {
                timestamp: "2024-01-01 00:00:00".to_string(),
                local_timestamp: None,
                network: "whatever".to_string(),
                tx_hash: hash.to_uppercase(),
                contract: None,
                from: None,
                function_name: None,
                block_number: 1,
                gas_used: 21_000,
                gas_price_wei: 1_000_000_000,
                gas_price_gwei: 1.0,
                cost_native: 0.000021,
                cost_local: 0.000021 * rate,
                status: None,
            })
        }
    }

    fn hash(byte: &str) -> String {
        format!("0x{}", byte.repeat(32))
    }

    fn no_delay() -> BatchOptions {
        BatchOptions {
            delay: Duration::ZERO,
            ..BatchOptions::default()
        }
    }

    #[test]
    fn test_prepare_hashes_filters_and_dedupes() {
        let input = vec![
            hash("ab"),
            "0x1234".to_string(),
            hash("cd"),
            hash("AB"),
            format!("  {}  ", hash("ef")),
            "not a hash".to_string(),
        ];
        assert_eq!(prepare_hashes(&input), vec![hash("ab"), hash("cd"), hash("ef")]);
    }

    #[tokio::test]
    async fn test_two_by_two_with_one_failure() {
        let sepolia = get_chain("sepolia").unwrap();
        let holesky = get_chain("holesky").unwrap();
        let source = FakeSource {
            failing: Some(("holesky", hash("cd"))),
            ..FakeSource::new()
        };

        let mut reports = Vec::new();
        let result = run_batch(
            &source,
            &[hash("ab"), hash("cd")],
            &[sepolia, holesky],
            2.0,
            &no_delay(),
            |done, total| reports.push((done, total)),
        )
        .await;

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.failures.len(), 1);
        assert!(!result.cancelled);
        assert_eq!(result.failures[0].chain, result.rows[2].network);
        assert_eq!(result.failures[0].chain, "Holesky");
        assert_eq!(result.failures[0].hash, hash("cd"));
        assert!(result.failures[0].error.contains("not found"));

        assert_eq!(result.rows[0].network, "Sepolia");
        assert_eq!(result.rows[0].tx_hash, hash("ab"));
        assert_eq!(result.rows[2].network, "Holesky");
        assert_eq!(reports, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        assert_eq!(
            source.calls(),
            vec![
                ("sepolia".to_string(), hash("ab")),
                ("sepolia".to_string(), hash("cd")),
                ("holesky".to_string(), hash("ab")),
                ("holesky".to_string(), hash("cd")),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_and_duplicate_hashes_are_skipped() {
        let sepolia = get_chain("sepolia").unwrap();
        let source = FakeSource::new();
        let result = run_batch(
            &source,
            &[hash("ab"), "0xnope".to_string(), hash("ab")],
            &[sepolia],
            1.0,
            &no_delay(),
            |_, _| {},
        )
        .await;
        assert_eq!(result.rows.len(), 1);
        assert!(result.failures.is_empty());
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_result() {
        let sepolia = get_chain("sepolia").unwrap();
        let result = run_batch(&FakeSource::new(), &[], &[sepolia], 1.0, &no_delay(), |_, _| {}).await;
        assert_eq!(result, BatchResult::default());
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_pair() {
        let sepolia = get_chain("sepolia").unwrap();
        let options = no_delay();
        let source = FakeSource {
            cancel_after: Some((2, options.cancel.clone())),
            ..FakeSource::new()
        };

        let result = run_batch(
            &source,
            &[hash("ab"), hash("cd"), hash("ef")],
            &[sepolia],
            1.0,
            &options,
            |_, _| {},
        )
        .await;
        assert!(result.cancelled);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_delay() {
        let sepolia = get_chain("sepolia").unwrap();
        let options = BatchOptions {
            delay: Duration::from_secs(3600),
            ..BatchOptions::default()
        };
        let source = FakeSource::new();
        let token = options.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_batch(&source, &[hash("ab"), hash("cd")], &[sepolia], 1.0, &options, |_, _| {}),
        )
        .await
        .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.rows.len(), 1);
    }
}
