mod config;
mod data;
mod report;
mod shell;
mod utils;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config};
use crate::data::FeeService;
use crate::data::batch::{BatchOptions, run_batch};
use crate::data::cache::{RateCache, default_fallback_rate};
use crate::data::chains::{all_chains, get_chain, supported_chains};
use crate::data::explorer::ExplorerClient;
use crate::data::export::{
    BATCH_EXPORT_NAME, SIMULATION_EXPORT_NAME, default_export_path, export_failures_csv, export_rows_csv,
    export_simulation_csv, failures_path, single_export_name,
};
use crate::data::normalize::normalize;
use crate::data::rates::RateProvider;
use crate::data::signatures::SignatureResolver;
use crate::data::simulator::{all_networks, preset_gas, simulate_fee_table};
use crate::data::types::{ChainTarget, FeeUnits};
use crate::shell::Shell;
use crate::utils::{format_amount, parse_tx_hash};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let mut explorer = ExplorerClient::new(config.etherscan_api_key.clone(), config.api_version);
    if let Some(url) = &config.explorer_url {
        explorer = explorer.with_base_url(url.clone());
    }
    let service = FeeService::new(
        explorer,
        SignatureResolver::new(),
        RateProvider::new(&config.token, &config.ticker, &config.currency),
        config.local_utc_offset,
    );
    let fallback = config
        .fallback_rate
        .unwrap_or_else(|| default_fallback_rate(&config.currency));
    let cache = RateCache::new(Duration::from_secs(config.rate_ttl_secs), fallback);
    let currency = config.currency.to_uppercase();
    // Every supported chain pays fees in ETH.
    let units = FeeUnits::new("ETH", &config.currency);

    match config.command {
        Command::Lookup {
            hash,
            chain,
            rate,
            export,
        } => {
            let target = resolve_chain(&chain)?;
            let hash = parse_tx_hash(&hash)
                .map(|h| format!("{h:#x}"))
                .ok_or_else(|| eyre!("'{hash}' is not a transaction hash (0x + 64 hex chars)"))?;

            let record = service
                .fetch_transaction(target.name, &hash, rate, &cache)
                .await
                .wrap_err_with(|| format!("lookup of {hash} on {} failed", target.display_name))?;
            println!("{}", report::render_record(&record, target.symbol, &currency));

            if export.enabled() {
                let path = export
                    .output
                    .unwrap_or_else(|| default_export_path(&single_export_name(&record.network)));
                let units = FeeUnits::new(target.symbol, &config.currency);
                let message =
                    export_rows_csv(&[normalize(&record)], &path, &units, export.wallets).map_err(|e| eyre!(e))?;
                eprintln!("{message}");
            }
        }

        Command::Batch {
            mut hashes,
            file,
            chains,
            delay_ms,
            rate,
            export,
        } => {
            if let Some(file) = file {
                let text = std::fs::read_to_string(&file)
                    .wrap_err_with(|| format!("could not read {}", file.display()))?;
                hashes.extend(text.lines().map(str::to_string));
            }
            if hashes.is_empty() {
                bail!("no transaction hashes given");
            }
            let targets = resolve_chains(&chains)?;
            service.ensure_credentials()?;

            let rate = match rate {
                Some(rate) => rate,
                None => service.current_rate(&cache).await,
            };
            let options = BatchOptions {
                delay: Duration::from_millis(delay_ms),
                cancel: CancellationToken::new(),
            };
            let token = options.cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, stopping after the current request");
                    token.cancel();
                }
            });

            let result = run_batch(&service, &hashes, &targets, rate, &options, |done, total| {
                info!(done, total, "batch progress");
            })
            .await;
            println!("{}", report::render_batch(&result, &currency));

            if export.enabled() {
                let path = export.output.unwrap_or_else(|| default_export_path(BATCH_EXPORT_NAME));
                eprintln!("{}", export_rows_csv(&result.rows, &path, &units, export.wallets).map_err(|e| eyre!(e))?);
                if !result.failures.is_empty() {
                    let failures = failures_path(&path);
                    eprintln!("{}", export_failures_csv(&result.failures, &failures).map_err(|e| eyre!(e))?);
                }
            }
        }

        Command::Simulate {
            tx_type,
            gas_used,
            speed,
            networks,
            rate,
            export,
        } => {
            let gas_used = match gas_used {
                Some(gas) => gas,
                None => preset_gas(&tx_type).ok_or_else(|| eyre!("unknown transaction type '{tx_type}'"))?,
            };
            let networks = if networks.is_empty() { all_networks() } else { networks };
            let rate = match rate {
                Some(rate) => rate,
                None => service.current_rate(&cache).await,
            };

            let table = simulate_fee_table(gas_used, speed, &networks, rate);
            if table.is_empty() {
                bail!("none of the requested networks can be simulated");
            }
            println!("{} at {} ({} gwei)", tx_type, speed, speed.gwei());
            println!("{}", report::render_simulation(&table, &currency));

            if export.enabled() {
                let path: PathBuf = export.output.unwrap_or_else(|| default_export_path(SIMULATION_EXPORT_NAME));
                eprintln!("{}", export_simulation_csv(&table, &path, &units).map_err(|e| eyre!(e))?);
            }
        }

        Command::Rate => {
            let rate = service.current_rate(&cache).await;
            println!("1 {} = {} {currency}", config.token, format_amount(rate));
        }

        Command::Chains => {
            println!("{}", report::render_chains(all_chains()));
        }

        Command::Shell { chain, wallets } => {
            let target = resolve_chain(&chain)?;
            if let Err(e) = service.ensure_credentials() {
                warn!("{e}; lookups will fail until a key is configured");
            }
            Shell::new(&service, &cache, target, wallets).run().await?;
        }
    }

    Ok(())
}

fn resolve_chain(name: &str) -> Result<&'static ChainTarget> {
    get_chain(name).ok_or_else(|| eyre!("unsupported chain '{name}' (supported: {})", supported_chains().join(", ")))
}

fn resolve_chains(names: &[String]) -> Result<Vec<&'static ChainTarget>> {
    let mut targets: Vec<&'static ChainTarget> = Vec::new();
    for name in names {
        let target = resolve_chain(name)?;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    Ok(targets)
}
