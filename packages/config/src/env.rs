// ABOUTME: Environment variable parsing utilities
// ABOUTME: Typed readers with defaults, validation and boolean flag handling

use std::str::FromStr;

/// Read a variable, treating unset and blank values the same way
pub fn env_non_empty(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable with a fallback default value
/// Returns the parsed value or the default if the variable is not set or cannot be parsed
pub fn parse_env_or_default<T>(var_name: &str, default: T) -> T
where
    T: FromStr,
{
    env_non_empty(var_name)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parse an environment variable with validation
///
/// Logs a warning when the variable is set but unparseable or rejected by the
/// validator, then falls back to the default.
pub fn parse_env_or_default_with_validation<T, F>(var_name: &str, default: T, validator: F) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(T) -> bool,
{
    let Some(raw_value) = env_non_empty(var_name) else {
        return default;
    };

    match raw_value.parse::<T>() {
        Ok(parsed_value) if validator(parsed_value) => parsed_value,
        Ok(_) => {
            tracing::warn!(
                "Environment variable {} has invalid value '{}', using default: {}",
                var_name,
                raw_value,
                default
            );
            default
        }
        Err(_) => {
            tracing::warn!(
                "Environment variable {} has unparseable value '{}', using default: {}",
                var_name,
                raw_value,
                default
            );
            default
        }
    }
}

/// Parse a boolean flag. Accepts true/false, 1/0, yes/no, on/off (any case).
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    match env_non_empty(var_name).map(|v| v.to_lowercase()).as_deref() {
        Some("true" | "1" | "yes" | "on") => true,
        Some("false" | "0" | "no" | "off") => false,
        Some(other) => {
            tracing::warn!(
                "Environment variable {} has non-boolean value '{}', using default: {}",
                var_name,
                other,
                default
            );
            default
        }
        None => default,
    }
}
