use crate::data::types::{NormalizedRow, RawFeeRecord};

/// Project a raw fee record onto the fixed export schema. Absent strings
/// become `""` and an absent status becomes `"Unknown"`.
pub fn normalize(raw: &RawFeeRecord) -> NormalizedRow {
    let contract = raw.contract.clone().unwrap_or_default();
    NormalizedRow {
        timestamp: raw.timestamp.clone(),
        network: raw.network.clone(),
        tx_hash: raw.tx_hash.clone(),
        wallet_to: contract.clone(),
        contract,
        function: raw.function_name.clone().unwrap_or_default(),
        block: raw.block_number,
        gas_used: raw.gas_used,
        gas_price_gwei: finite_or_zero(raw.gas_price_gwei),
        fee_native: finite_or_zero(raw.cost_native),
        fee_local: finite_or_zero(raw.cost_local),
        status: raw
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        wallet_from: raw.from.clone().unwrap_or_default(),
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
