use tracing::warn;

use crate::data::types::{FeeUnits, SimulatedFee};

/// Typical gas used per transaction type.
pub const TX_PRESETS: [(&str, u64); 6] = [
    ("Transfer ETH", 21_000),
    ("ERC20 Approve", 45_000),
    ("ERC20 Transfer", 65_000),
    ("Deploy Contract", 1_500_000),
    ("Uniswap Swap", 150_000),
    ("Add Liquidity", 270_000),
];

/// Networks offered in the simulator and the token fees are paid in.
pub const SIMULATED_NETWORKS: [(&str, &str); 4] = [
    ("Sepolia", "ETH"),
    ("Goerli", "ETH"),
    ("Polygon Mumbai", "ETH"),
    ("Arbitrum Sepolia", "ETH"),
];

/// What-if table columns; the fee columns name `units`.
pub fn simulation_headers(units: &FeeUnits) -> [String; 6] {
    [
        "Network".to_string(),
        "Token".to_string(),
        "Gas Used".to_string(),
        "Gas Price (Gwei)".to_string(),
        format!("Fee ({})", units.symbol),
        format!("Fee ({})", units.currency_label()),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GasSpeed {
    #[default]
    Standard,
    Fast,
    Instant,
}

impl GasSpeed {
    pub fn gwei(self) -> u64 {
        match self {
            GasSpeed::Standard => 20,
            GasSpeed::Fast => 50,
            GasSpeed::Instant => 100,
        }
    }
}

impl std::fmt::Display for GasSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GasSpeed::Standard => write!(f, "Standard"),
            GasSpeed::Fast => write!(f, "Fast"),
            GasSpeed::Instant => write!(f, "Instant"),
        }
    }
}

/// Gas used for a preset transaction type, matched case-insensitively.
pub fn preset_gas(tx_type: &str) -> Option<u64> {
    let wanted = tx_type.trim();
    TX_PRESETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, gas)| *gas)
}

fn network_token(network: &str) -> Option<(&'static str, &'static str)> {
    let wanted = network.trim();
    SIMULATED_NETWORKS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .copied()
}

/// `(fee_native, fee_local)` for `gas_used` units at `gas_price_gwei`.
pub fn calculate_gas_fees(gas_used: u64, gas_price_gwei: u64, rate: f64) -> (f64, f64) {
    let fee_native = gas_used as f64 * gas_price_gwei as f64 * 1e-9;
    (fee_native, fee_native * rate)
}

/// One row per requested network. Unknown networks are skipped.
pub fn simulate_fee_table(gas_used: u64, speed: GasSpeed, networks: &[String], rate: f64) -> Vec<SimulatedFee> {
    let gwei = speed.gwei();
    networks
        .iter()
        .filter_map(|requested| {
            let Some((network, token)) = network_token(requested) else {
                warn!(network = %requested, "not a simulated network, skipping");
                return None;
            };
            let (fee_native, fee_local) = calculate_gas_fees(gas_used, gwei, rate);
            Some(SimulatedFee {
                network: network.to_string(),
                token: token.to_string(),
                gas_used,
                gas_price_gwei: gwei,
                fee_native: round_to(fee_native, 8),
                fee_local: round_to(fee_local, 2),
            })
        })
        .collect()
}

/// Every simulated network, in table order.
pub fn all_networks() -> Vec<String> {
    SIMULATED_NETWORKS.iter().map(|(name, _)| name.to_string()).collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(preset_gas("Transfer ETH"), Some(21_000));
        assert_eq!(preset_gas("uniswap swap"), Some(150_000));
        assert_eq!(preset_gas("Bridge"), None);
        assert_eq!(GasSpeed::Standard.gwei(), 20);
        assert_eq!(GasSpeed::Fast.gwei(), 50);
        assert_eq!(GasSpeed::Instant.gwei(), 100);
    }

    #[test]
    fn test_calculate_gas_fees() {
        let (native, local) = calculate_gas_fees(21_000, 20, 60_000_000.0);
        assert!((native - 0.00042).abs() < 1e-15);
        assert!((local - 25_200.0).abs() < 1e-6);
    }

    #[test]
    fn test_fee_table_rounds_and_skips_unknown() {
        let networks = vec!["Sepolia".to_string(), "Mainnet".to_string(), "polygon mumbai".to_string()];
        let table = simulate_fee_table(65_000, GasSpeed::Fast, &networks, 51_234_567.891);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].network, "Sepolia");
        assert_eq!(table[1].network, "Polygon Mumbai");
        assert_eq!(table[0].token, "ETH");
        assert_eq!(table[0].gas_used, 65_000);
        assert_eq!(table[0].gas_price_gwei, 50);
        assert_eq!(table[0].fee_native, 0.00325);
        assert_eq!(table[0].fee_local, 166_512.35);
    }

    #[test]
    fn test_all_networks_order() {
        assert_eq!(all_networks(), vec!["Sepolia", "Goerli", "Polygon Mumbai", "Arbitrum Sepolia"]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456789, 8), 0.12345679);
        assert_eq!(round_to(1.005, 0), 1.0);
    }
}
