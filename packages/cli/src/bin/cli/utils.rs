// ABOUTME: Shared helpers for the agentbox CLI
// ABOUTME: Tracing setup, key=value argument parsing and JSON output

use agentbox_config::constants;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays machine-readable
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Filter from `RUST_LOG`, falling back to `info`
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(constants::RUST_LOG).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Parse repeated `key=value` arguments. Later keys win.
pub fn parse_key_values(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected key=value, got '{}'", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Empty key in '{}'", pair);
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse an octal file mode such as `644` or `0o755`
pub fn parse_mode(raw: &str) -> Result<u32> {
    let digits = raw.trim_start_matches("0o");
    u32::from_str_radix(digits, 8).with_context(|| format!("Invalid octal mode '{}'", raw))
}
