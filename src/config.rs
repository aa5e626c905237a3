//! Environment-driven configuration.
//!
//! Reads an optional `.env` file, then `DOMAIN_ORACLE_*` variables on top
//! of [`ResolverConfig::default`]. Unset variables keep their defaults; a
//! set but malformed variable is a configuration error.

use crate::error::Result;
use crate::types::ResolverConfig;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const ENV_HTTP_TIMEOUT_SECS: &str = "DOMAIN_ORACLE_HTTP_TIMEOUT_SECS";
pub const ENV_RDAP_TIMEOUT_SECS: &str = "DOMAIN_ORACLE_RDAP_TIMEOUT_SECS";
pub const ENV_PROVIDER_TIMEOUT_SECS: &str = "DOMAIN_ORACLE_PROVIDER_TIMEOUT_SECS";
pub const ENV_PROBE_GROUP_SIZE: &str = "DOMAIN_ORACLE_PROBE_GROUP_SIZE";
pub const ENV_PROBE_PAUSE_MS: &str = "DOMAIN_ORACLE_PROBE_PAUSE_MS";
pub const ENV_REGISTRY_DELAY_MS: &str = "DOMAIN_ORACLE_REGISTRY_DELAY_MS";
pub const ENV_DEFAULT_TLDS: &str = "DOMAIN_ORACLE_TLDS";
pub const ENV_USER_AGENT: &str = "DOMAIN_ORACLE_USER_AGENT";
pub const ENV_RDAP_FALLBACK: &str = "DOMAIN_ORACLE_RDAP_FALLBACK";
pub const ENV_ENABLE_PORKBUN: &str = "DOMAIN_ORACLE_ENABLE_PORKBUN";

/// Load configuration from `.env` and the process environment
pub fn load_from_env() -> Result<ResolverConfig> {
    dotenv::dotenv().ok();
    let vars: HashMap<String, String> = env::vars()
        .filter(|(key, _)| key.starts_with("DOMAIN_ORACLE_"))
        .collect();
    from_vars(&vars)
}

/// Build a configuration from an explicit variable map
pub fn from_vars(vars: &HashMap<String, String>) -> Result<ResolverConfig> {
    let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
    let mut config = ResolverConfig::default();

    if let Some(v) = get(ENV_HTTP_TIMEOUT_SECS) {
        config.http_timeout = Duration::from_secs(parse_positive(ENV_HTTP_TIMEOUT_SECS, v)?);
    }
    if let Some(v) = get(ENV_RDAP_TIMEOUT_SECS) {
        config.rdap_timeout = Duration::from_secs(parse_positive(ENV_RDAP_TIMEOUT_SECS, v)?);
    }
    if let Some(v) = get(ENV_PROVIDER_TIMEOUT_SECS) {
        config.provider_timeout = Duration::from_secs(parse_positive(ENV_PROVIDER_TIMEOUT_SECS, v)?);
    }
    if let Some(v) = get(ENV_PROBE_GROUP_SIZE) {
        let size = parse_positive(ENV_PROBE_GROUP_SIZE, v)? as usize;
        let pause = config.probe_group_pause;
        config = config.with_probe_group(size, pause);
    }
    if let Some(v) = get(ENV_PROBE_PAUSE_MS) {
        config.probe_group_pause = Duration::from_millis(parse_number(ENV_PROBE_PAUSE_MS, v)?);
    }
    if let Some(v) = get(ENV_REGISTRY_DELAY_MS) {
        config.registry_bulk_delay = Duration::from_millis(parse_number(ENV_REGISTRY_DELAY_MS, v)?);
    }
    if let Some(v) = get(ENV_DEFAULT_TLDS) {
        let tlds: Vec<String> = v
            .split(',')
            .map(|t| t.trim().trim_start_matches('.').to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tlds.is_empty() {
            return Err(crate::config_error!("{} lists no TLDs", ENV_DEFAULT_TLDS));
        }
        config.default_tlds = tlds;
    }
    if let Some(v) = get(ENV_USER_AGENT) {
        config.user_agent = v.to_string();
    }
    if let Some(v) = get(ENV_RDAP_FALLBACK) {
        config.rdap_fallback_url = match v.to_lowercase().as_str() {
            "none" | "off" | "false" => None,
            _ => Some(v.to_string()),
        };
    }
    if let Some(v) = get(ENV_ENABLE_PORKBUN) {
        config.enable_porkbun = parse_bool(ENV_ENABLE_PORKBUN, v)?;
    }

    Ok(config)
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| crate::config_error!("{} must be a whole number, got '{}'", key, value))
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match parse_number(key, value)? {
        0 => Err(crate::config_error!("{} must be greater than zero", key)),
        n => Ok(n),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(crate::config_error!("{} must be true or false, got '{}'", key, value)),
    }
}
