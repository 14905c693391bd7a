use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::simulator::GasSpeed;
use crate::data::types::ApiVersion;

#[derive(Parser, Debug)]
#[command(name = "gas-vision", about = "Transaction fee tracker for EVM testnets", version)]
pub struct Config {
    /// Block explorer API key
    #[arg(long, env = "ETHERSCAN_API_KEY", global = true, hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Explorer API flavour (v1 per-chain endpoints, v2 unified endpoint)
    #[arg(long, value_enum, env = "GASVISION_API_VERSION", default_value_t = ApiVersion::V2, global = true)]
    pub api_version: ApiVersion,

    /// Hours east of UTC for the local timestamp column (e.g. 7 for WIB)
    #[arg(long, env = "GASVISION_LOCAL_UTC_OFFSET", allow_negative_numbers = true, global = true)]
    pub local_utc_offset: Option<i32>,

    /// Local currency fees are converted to
    #[arg(long, env = "GASVISION_CURRENCY", default_value = "idr", global = true)]
    pub currency: String,

    /// Explorer endpoint override (e.g. a self-hosted proxy)
    #[arg(long, env = "GASVISION_EXPLORER_URL", global = true)]
    pub explorer_url: Option<String>,

    /// Market-price id of the native token
    #[arg(long, default_value = "ethereum", global = true)]
    pub token: String,

    /// USD ticker pair of the native token
    #[arg(long, default_value = "ETHUSDT", global = true)]
    pub ticker: String,

    /// Rate used when no source has produced one yet (defaults to 60,000,000
    /// for IDR and 0 for any other currency)
    #[arg(long, env = "GASVISION_FALLBACK_RATE", global = true)]
    pub fallback_rate: Option<f64>,

    /// Seconds a fetched exchange rate stays fresh
    #[arg(long, env = "GASVISION_RATE_TTL_SECS", default_value = "600", global = true)]
    pub rate_ttl_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up the fee of one transaction
    Lookup {
        /// Transaction hash (0x + 64 hex chars)
        hash: String,

        #[arg(short, long, default_value = "sepolia")]
        chain: String,

        /// Use this rate instead of fetching one
        #[arg(long)]
        rate: Option<f64>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Look up many transactions across one or more chains
    Batch {
        /// Transaction hashes; read from --file when omitted
        hashes: Vec<String>,

        /// File with one hash per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Chains to query, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "sepolia")]
        chains: Vec<String>,

        /// Pause between requests in milliseconds
        #[arg(long, default_value = "250")]
        delay_ms: u64,

        #[arg(long)]
        rate: Option<f64>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Estimate fees for a preset transaction type
    Simulate {
        /// Transaction type preset (e.g. "ERC20 Transfer")
        #[arg(short = 't', long, default_value = "Transfer ETH")]
        tx_type: String,

        /// Gas used, overriding the preset
        #[arg(long)]
        gas_used: Option<u64>,

        #[arg(short, long, value_enum, default_value_t = GasSpeed::Standard)]
        speed: GasSpeed,

        /// Networks to include, comma separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        networks: Vec<String>,

        #[arg(long)]
        rate: Option<f64>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Print the current exchange rate
    Rate,

    /// List supported chains
    Chains,

    /// Interactive session
    Shell {
        #[arg(short, long, default_value = "sepolia")]
        chain: String,

        /// Add Wallet From / Wallet To columns to exports
        #[arg(long)]
        wallets: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Write results as CSV
    #[arg(long)]
    pub export: bool,

    /// CSV path (defaults to the download directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Add Wallet From / Wallet To columns
    #[arg(long)]
    pub wallets: bool,
}

impl ExportArgs {
    pub fn enabled(&self) -> bool {
        self.export || self.output.is_some()
    }
}
