use chrono::{DateTime, Local};
use serde_json::Value;

/// Placeholder shown for absent values.
pub const PLACEHOLDER: &str = "-";

/// Format a JSON cell value for display.
///
/// Null renders empty, strings verbatim, integral floats without a
/// trailing `.0`. Arrays and objects fall back to compact JSON.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Format an optional number with two decimals, or the placeholder.
pub fn format_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => PLACEHOLDER.to_string(),
    }
}

/// Convert a unix timestamp (seconds) to local time.
///
/// Returns the placeholder for absent, zero or out-of-range timestamps.
/// The backend sends `0` before its first load.
pub fn format_timestamp(timestamp: Option<f64>) -> String {
    timestamp
        .filter(|ts| ts.is_finite() && *ts != 0.0)
        .and_then(|ts| {
            let secs = ts.floor();
            let nanos = ((ts - secs) * 1e9) as u32;
            DateTime::from_timestamp(secs as i64, nanos)
        })
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
