use crate::data::types::{BatchResult, ChainTarget, RawFeeRecord, SimulatedFee};
use crate::utils::{format_amount, format_gwei, format_number, truncate_hash};

/// Multi-line terminal view of one fee record.
pub fn render_record(raw: &RawFeeRecord, symbol: &str, currency: &str) -> String {
    let mut lines = vec![
        format!("Network      {}", raw.network),
        format!("Tx Hash      {}", raw.tx_hash),
        format!("Time         {} UTC", raw.timestamp),
    ];
    if let Some(local) = raw.local_timestamp.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("Local Time   {local}"));
    }
    lines.extend([
        format!("Block        {}", format_number(raw.block_number)),
        format!("From         {}", raw.from.as_deref().unwrap_or("-")),
        format!("To           {}", raw.contract.as_deref().unwrap_or("(contract creation)")),
        format!("Function     {}", raw.function_name.as_deref().unwrap_or("-")),
        format!("Gas Used     {}", format_number(raw.gas_used)),
        format!("Gas Price    {}", format_gwei(raw.gas_price_gwei)),
        format!("Fee          {:.8} {symbol}", raw.cost_native),
        format!("Fee          {} {}", format_amount(raw.cost_local), currency.to_uppercase()),
        format!(
            "Status       {}",
            raw.status.map(|s| s.to_string()).unwrap_or_else(|| "Unknown".to_string())
        ),
    ]);
    lines.join("\n")
}

pub fn render_batch(result: &BatchResult, currency: &str) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + result.failures.len() + 1);
    for row in &result.rows {
        lines.push(format!(
            "{:<18} {:<15} {:>12} gas  {:.8}  {} {}  {}",
            row.network,
            truncate_hash(&row.tx_hash),
            format_number(row.gas_used),
            row.fee_native,
            format_amount(row.fee_local),
            currency.to_uppercase(),
            row.status,
        ));
    }
    for failure in &result.failures {
        lines.push(format!(
            "{:<18} {:<15} FAILED: {}",
            failure.chain,
            truncate_hash(&failure.hash),
            failure.error
        ));
    }
    let mut summary = format!("{} ok, {} failed", result.rows.len(), result.failures.len());
    if result.cancelled {
        summary.push_str(" (cancelled)");
    }
    lines.push(summary);
    lines.join("\n")
}

pub fn render_simulation(table: &[SimulatedFee], currency: &str) -> String {
    let mut lines = vec![format!(
        "{:<18} {:<6} {:>10} {:>6}  {:>12}  {:>16}",
        "Network",
        "Token",
        "Gas Used",
        "Gwei",
        "Fee",
        currency.to_uppercase()
    )];
    for fee in table {
        lines.push(format!(
            "{:<18} {:<6} {:>10} {:>6}  {:>12.8}  {:>16}",
            fee.network,
            fee.token,
            format_number(fee.gas_used),
            fee.gas_price_gwei,
            fee.fee_native,
            format_amount(fee.fee_local),
        ));
    }
    lines.join("\n")
}

pub fn render_chains(chains: &[ChainTarget]) -> String {
    chains
        .iter()
        .map(|c| format!("{:<18} {:<18} {:>10}  {}", c.name, c.display_name, c.chain_id, c.symbol))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chains::all_chains;
    use crate::data::types::{BatchFailure, TxStatus};

    fn record() -> RawFeeRecord {
        RawFeeRecord {
            timestamp: "2023-11-14 22:13:20".to_string(),
            local_timestamp: Some("2023-11-15 05:13:20 (UTC+7)".to_string()),
            network: "Sepolia".to_string(),
            tx_hash: format!("0x{}", "ab".repeat(32)),
            contract: None,
            from: Some("0x2222222222222222222222222222222222222222".to_string()),
            function_name: None,
            block_number: 5_814_464,
            gas_used: 21_000,
            gas_price_wei: 20_000_000_000,
            gas_price_gwei: 20.0,
            cost_native: 0.00042,
            cost_local: 25_200.0,
            status: Some(TxStatus::Success),
        }
    }

    #[test]
    fn test_render_record() {
        let text = render_record(&record(), "ETH", "idr");
        assert!(text.contains("Local Time   2023-11-15 05:13:20 (UTC+7)"));
        assert!(text.contains("Block        5,814,464"));
        assert!(text.contains("To           (contract creation)"));
        assert!(text.contains("0.00042000 ETH"));
        assert!(text.contains("25,200.00 IDR"));
        assert!(text.contains("Status       Success"));
    }

    #[test]
    fn test_render_batch_summary() {
        let result = BatchResult {
            rows: Vec::new(),
            failures: vec![BatchFailure {
                chain: "Holesky".to_string(),
                hash: format!("0x{}", "cd".repeat(32)),
                error: "boom".to_string(),
            }],
            cancelled: true,
        };
        let text = render_batch(&result, "idr");
        assert!(text.contains("FAILED: boom"));
        assert!(text.ends_with("0 ok, 1 failed (cancelled)"));
    }

    #[test]
    fn test_render_chains_lists_every_chain() {
        assert_eq!(render_chains(all_chains()).lines().count(), all_chains().len());
    }
}
