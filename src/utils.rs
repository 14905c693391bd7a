use alloy::primitives::B256;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

const WEI_PER_GWEI: f64 = 1e9;
const WEI_PER_ETHER: f64 = 1e18;

/// Parse a JSON value holding an integer, a `0x`-prefixed hex string or a
/// decimal string. Anything else (including negatives and overflow) yields
/// `default`.
pub fn parse_int(value: &Value, default: u128) -> u128 {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from).unwrap_or(default),
        Value::String(s) => parse_int_str(s, default),
        _ => default,
    }
}

/// String form of [`parse_int`].
pub fn parse_int_str(s: &str, default: u128) -> u128 {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => s.parse::<u128>(),
    };
    parsed.unwrap_or(default)
}

/// Parse an optional JSON field, treating absence like a malformed value.
pub fn parse_field(value: Option<&Value>, default: u128) -> u128 {
    value.map(|v| parse_int(v, default)).unwrap_or(default)
}

pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / WEI_PER_GWEI
}

/// Fee in native-token units: `gas_used * gas_price_wei / 1e18`.
pub fn compute_native_cost(gas_used: u64, gas_price_wei: u128) -> f64 {
    match u128::from(gas_used).checked_mul(gas_price_wei) {
        Some(wei) => wei as f64 / WEI_PER_ETHER,
        None => gas_used as f64 * gas_price_wei as f64 / WEI_PER_ETHER,
    }
}

/// `0x` followed by exactly 64 hex characters.
pub fn is_valid_tx_hash(input: &str) -> bool {
    match input.strip_prefix("0x") {
        Some(hex) => hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Validate and parse a transaction hash.
pub fn parse_tx_hash(input: &str) -> Option<B256> {
    if !is_valid_tx_hash(input) {
        return None;
    }
    input.parse::<B256>().ok()
}

/// Format a Unix timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_utc(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Format a Unix timestamp in a fixed UTC offset. Any conversion failure
/// yields an empty string.
pub fn format_local(timestamp: u64, offset_hours: i32) -> String {
    let Some(offset) = offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
    else {
        return String::new();
    };
    let Some(utc) = i64::try_from(timestamp)
        .ok()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    else {
        return String::new();
    };
    let sign = if offset_hours < 0 { '-' } else { '+' };
    format!(
        "{} (UTC{sign}{})",
        utc.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S"),
        offset_hours.unsigned_abs()
    )
}

/// Format gas price in Gwei
pub fn format_gwei(gwei: f64) -> String {
    if gwei < 0.01 {
        format!("{gwei:.4} Gwei")
    } else if gwei < 10.0 {
        format!("{gwei:.2} Gwei")
    } else {
        format!("{gwei:.1} Gwei")
    }
}

/// Format a number with comma separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a local-currency amount as "1,234.56"
pub fn format_amount(value: f64) -> String {
    let rounded = (value.max(0.0) * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;
    format!("{}.{cents:02}", format_number(whole))
}

/// Truncate a hash to "0xabcd...ef12" format
pub fn truncate_hash(hash: &str) -> String {
    if hash.len() > 14 {
        format!("{}...{}", &hash[..8], &hash[hash.len() - 4..])
    } else {
        hash.to_string()
    }
}
