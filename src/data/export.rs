use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::data::simulator::simulation_headers;
use crate::data::types::{BatchFailure, FeeUnits, NormalizedRow, SimulatedFee, WALLET_HEADERS, row_headers};

/// `<download dir>/<file_name>`, falling back to the working directory.
pub fn default_export_path(file_name: &str) -> PathBuf {
    dirs::download_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(file_name)
}

/// File name for a single-transaction export, e.g. `gas_tracker_sepolia.csv`.
pub fn single_export_name(network: &str) -> String {
    format!("gas_tracker_{}.csv", network.to_lowercase().replace(' ', "_"))
}

pub const BATCH_EXPORT_NAME: &str = "gas_batch.csv";
pub const SIMULATION_EXPORT_NAME: &str = "simulasi_biaya_gas.csv";

/// `gas_batch.csv` -> `gas_batch.failures.csv`
pub fn failures_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!("{stem}.failures.csv"))
}

/// Write the header and one record per row.
pub fn write_rows_csv<W: Write>(
    rows: &[NormalizedRow],
    writer: W,
    units: &FeeUnits,
    include_wallets: bool,
) -> Result<(), String> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = row_headers(units).to_vec();
    if include_wallets {
        header.extend(WALLET_HEADERS.map(String::from));
    }
    wtr.write_record(&header)
        .map_err(|e| format!("Failed to write CSV header: {e}"))?;

    for row in rows {
        wtr.write_record(row.to_record(include_wallets))
            .map_err(|e| format!("Failed to write CSV row: {e}"))?;
    }

    wtr.flush().map_err(|e| format!("Failed to flush CSV: {e}"))
}

/// Export normalized fee rows to CSV.
pub fn export_rows_csv(
    rows: &[NormalizedRow],
    path: &Path,
    units: &FeeUnits,
    include_wallets: bool,
) -> Result<String, String> {
    let file = fs::File::create(path).map_err(|e| format!("Failed to create file: {e}"))?;
    write_rows_csv(rows, file, units, include_wallets)?;
    Ok(format!("Exported {} rows to {}", rows.len(), path.display()))
}

/// Export batch failures (chain, hash, error).
pub fn export_failures_csv(failures: &[BatchFailure], path: &Path) -> Result<String, String> {
    let file = fs::File::create(path).map_err(|e| format!("Failed to create file: {e}"))?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record(["Chain", "Tx Hash", "Error"])
        .map_err(|e| format!("Failed to write CSV header: {e}"))?;
    for failure in failures {
        wtr.write_record([&failure.chain, &failure.hash, &failure.error])
            .map_err(|e| format!("Failed to write CSV row: {e}"))?;
    }
    wtr.flush().map_err(|e| format!("Failed to flush CSV: {e}"))?;

    Ok(format!("Exported {} failures to {}", failures.len(), path.display()))
}

/// Export the what-if fee table.
pub fn export_simulation_csv(table: &[SimulatedFee], path: &Path, units: &FeeUnits) -> Result<String, String> {
    let file = fs::File::create(path).map_err(|e| format!("Failed to create file: {e}"))?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record(simulation_headers(units))
        .map_err(|e| format!("Failed to write CSV header: {e}"))?;
    for fee in table {
        wtr.write_record(&[
            fee.network.clone(),
            fee.token.clone(),
            fee.gas_used.to_string(),
            fee.gas_price_gwei.to_string(),
            fee.fee_native.to_string(),
            fee.fee_local.to_string(),
        ])
        .map_err(|e| format!("Failed to write CSV row: {e}"))?;
    }
    wtr.flush().map_err(|e| format!("Failed to flush CSV: {e}"))?;

    Ok(format!("Exported {} simulated fees to {}", table.len(), path.display()))
}
