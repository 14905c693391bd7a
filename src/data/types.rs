/// A block-explorer network the fetcher can dispatch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTarget {
    pub name: &'static str,
    pub display_name: &'static str,
    pub chain_id: u64,
    /// Per-chain endpoint used by the v1 API.
    pub api_url: &'static str,
    pub symbol: &'static str,
}

/// Explorer API flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ApiVersion {
    /// Per-chain endpoints, no `chainid` parameter.
    V1,
    /// Unified endpoint keyed by `chainid`.
    #[default]
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
}

impl TxStatus {
    /// `Success` iff the receipt status decodes to 1.
    pub fn from_receipt_status(status: u128) -> Self {
        if status == 1 {
            TxStatus::Success
        } else {
            TxStatus::Failed
        }
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Success => write!(f, "Success"),
            TxStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Fee data for one transaction on one chain, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeeRecord {
    pub timestamp: String,
    pub local_timestamp: Option<String>,
    pub network: String,
    pub tx_hash: String,
    /// Recipient; `None` for contract creation.
    pub contract: Option<String>,
    pub from: Option<String>,
    pub function_name: Option<String>,
    pub block_number: u64,
    pub gas_used: u64,
    pub gas_price_wei: u128,
    pub gas_price_gwei: f64,
    pub cost_native: f64,
    pub cost_local: f64,
    pub status: Option<TxStatus>,
}

/// Units the two fee columns are expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeUnits {
    /// Native token symbol, e.g. `ETH`.
    pub symbol: String,
    /// Lowercase ISO currency code, e.g. `idr`.
    pub currency: String,
}

impl FeeUnits {
    pub fn new(symbol: &str, currency: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            currency: currency.to_lowercase(),
        }
    }

    /// Column label for the local currency: `Rp` for rupiah, otherwise the
    /// uppercase code.
    pub fn currency_label(&self) -> String {
        if self.currency == "idr" {
            "Rp".to_string()
        } else {
            self.currency.to_uppercase()
        }
    }
}

impl Default for FeeUnits {
    fn default() -> Self {
        Self::new("ETH", "idr")
    }
}

pub const ROW_COLUMNS: usize = 11;

/// Export column names, in the order the analytics consumer expects.
pub fn row_headers(units: &FeeUnits) -> [String; ROW_COLUMNS] {
    [
        "Timestamp".to_string(),
        "Network".to_string(),
        "Tx Hash".to_string(),
        "Contract".to_string(),
        "Function".to_string(),
        "Block".to_string(),
        "Gas Used".to_string(),
        "Gas Price (Gwei)".to_string(),
        format!("Estimated Fee ({})", units.symbol),
        format!("Estimated Fee ({})", units.currency_label()),
        "Status".to_string(),
    ]
}

pub const WALLET_HEADERS: [&str; 2] = ["Wallet From", "Wallet To"];

/// Presentation-facing projection of a [`RawFeeRecord`]. Field order
/// matches [`row_headers`] followed by [`WALLET_HEADERS`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub timestamp: String,
    pub network: String,
    pub tx_hash: String,
    pub contract: String,
    pub function: String,
    pub block: u64,
    pub gas_used: u64,
    pub gas_price_gwei: f64,
    pub fee_native: f64,
    pub fee_local: f64,
    pub status: String,
    pub wallet_from: String,
    pub wallet_to: String,
}

impl NormalizedRow {
    /// Render the row as CSV fields, optionally with the wallet columns.
    pub fn to_record(&self, include_wallets: bool) -> Vec<String> {
        let mut record = vec![
            self.timestamp.clone(),
            self.network.clone(),
            self.tx_hash.clone(),
            self.contract.clone(),
            self.function.clone(),
            self.block.to_string(),
            self.gas_used.to_string(),
            self.gas_price_gwei.to_string(),
            self.fee_native.to_string(),
            self.fee_local.to_string(),
            self.status.clone(),
        ];
        if include_wallets {
            record.push(self.wallet_from.clone());
            record.push(self.wallet_to.clone());
        }
        record
    }
}

/// A (chain, hash) pair that could not be fetched during a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub chain: String,
    pub hash: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub rows: Vec<NormalizedRow>,
    pub failures: Vec<BatchFailure>,
    /// Set when the run was stopped before every pair was attempted.
    pub cancelled: bool,
}

/// One line of the what-if fee table.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedFee {
    pub network: String,
    pub token: String,
    pub gas_used: u64,
    pub gas_price_gwei: u64,
    pub fee_native: f64,
    pub fee_local: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_status_display() {
        assert_eq!(TxStatus::Success.to_string(), "Success");
        assert_eq!(TxStatus::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_status_decoding() {
        assert_eq!(TxStatus::from_receipt_status(1), TxStatus::Success);
        assert_eq!(TxStatus::from_receipt_status(0), TxStatus::Failed);
        assert_eq!(TxStatus::from_receipt_status(2), TxStatus::Failed);
    }

    #[test]
    fn test_record_column_count() {
        let row = NormalizedRow {
            timestamp: String::new(),
            network: "Sepolia".to_string(),
            tx_hash: String::new(),
            contract: String::new(),
            function: String::new(),
            block: 1,
            gas_used: 21000,
            gas_price_gwei: 1.5,
            fee_native: 0.0,
            fee_local: 0.0,
            status: "Success".to_string(),
            wallet_from: "0xa".to_string(),
            wallet_to: "0xb".to_string(),
        };
        assert_eq!(row.to_record(false).len(), ROW_COLUMNS);
        let with_wallets = row.to_record(true);
        assert_eq!(with_wallets.len(), ROW_COLUMNS + WALLET_HEADERS.len());
        assert_eq!(with_wallets[1], "Sepolia");
        assert_eq!(with_wallets[7], "1.5");
        assert_eq!(with_wallets[12], "0xb");
    }

    #[test]
    fn test_fee_headers_follow_units() {
        let idr = row_headers(&FeeUnits::default());
        assert_eq!(idr[8], "Estimated Fee (ETH)");
        assert_eq!(idr[9], "Estimated Fee (Rp)");

        let usd = row_headers(&FeeUnits::new("eth", "USD"));
        assert_eq!(usd[9], "Estimated Fee (USD)");
        assert_eq!(usd[0], "Timestamp");
        assert_eq!(usd[10], "Status");
    }
}
