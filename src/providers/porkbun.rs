//! Porkbun public TLD price list.
//!
//! The pricing endpoint needs no credentials and returns every TLD at once,
//! so the whole table is cached and refreshed after [`PRICE_TABLE_TTL`].

use crate::error::{DomainOracleError, Result};
use crate::providers::PricingProvider;
use crate::types::{RegistrarPrice, ResolverConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_PRICING_URL: &str = "https://api.porkbun.com/api/json/v3/pricing/get";

/// Registrar prices change rarely
pub const PRICE_TABLE_TTL: Duration = Duration::from_secs(3600);

type PriceTable = Arc<HashMap<String, RegistrarPrice>>;

struct CachedTable {
    table: PriceTable,
    fetched_at: Instant,
}

/// Pricing provider backed by Porkbun's public price list
pub struct PorkbunProvider {
    client: Client,
    url: String,
    timeout: Duration,
    cache: Mutex<Option<CachedTable>>,
}

impl PorkbunProvider {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.provider_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DomainOracleError::network(e.to_string(), None, None))?;

        Ok(Self {
            client,
            url: DEFAULT_PRICING_URL.to_string(),
            timeout: config.provider_timeout,
            cache: Mutex::new(None),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn cached(&self) -> Option<PriceTable> {
        let cache = self.cache.lock();
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < PRICE_TABLE_TTL)
            .map(|c| Arc::clone(&c.table))
    }

    async fn price_table(&self) -> Result<PriceTable> {
        if let Some(table) = self.cached() {
            return Ok(table);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainOracleError::timeout("Porkbun pricing", self.timeout.as_secs())
                } else {
                    DomainOracleError::upstream("porkbun", e.to_string(), None)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainOracleError::upstream(
                "porkbun",
                format!("Pricing request failed ({})", status),
                Some(status.as_u16()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DomainOracleError::upstream("porkbun", e.to_string(), None))?;
        let table = Arc::new(parse_price_table(&text)?);

        tracing::debug!(tlds = table.len(), "Porkbun price table refreshed");
        *self.cache.lock() = Some(CachedTable {
            table: Arc::clone(&table),
            fetched_at: Instant::now(),
        });
        Ok(table)
    }
}

#[async_trait]
impl PricingProvider for PorkbunProvider {
    fn name(&self) -> &str {
        "porkbun"
    }

    async fn get_tld_pricing(&self, tld: &str) -> Result<Vec<RegistrarPrice>> {
        let table = self.price_table().await?;
        let tld = tld.trim_start_matches('.').to_lowercase();
        Ok(table.get(&tld).cloned().into_iter().collect())
    }
}

/// Parse the pricing payload; prices arrive as decimal strings
pub fn parse_price_table(body: &str) -> Result<HashMap<String, RegistrarPrice>> {
    let response: PorkbunPricingResponse = serde_json::from_str(body)
        .map_err(|e| DomainOracleError::parse(e.to_string(), Some(body.chars().take(256).collect())))?;

    if !response.status.eq_ignore_ascii_case("SUCCESS") {
        return Err(DomainOracleError::upstream(
            "porkbun",
            response
                .message
                .unwrap_or_else(|| format!("status {}", response.status)),
            None,
        ));
    }

    let parse = |value: &Option<String>| value.as_deref().and_then(|v| v.trim().parse::<f64>().ok());

    Ok(response
        .pricing
        .into_iter()
        .map(|(tld, entry)| {
            let price = RegistrarPrice {
                registrar: "porkbun".to_string(),
                registration: parse(&entry.registration),
                renewal: parse(&entry.renewal),
                transfer: parse(&entry.transfer),
                currency: "USD".to_string(),
            };
            (tld.to_lowercase(), price)
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct PorkbunPricingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    pricing: HashMap<String, PorkbunTldPrice>,
}

#[derive(Debug, Deserialize)]
struct PorkbunTldPrice {
    registration: Option<String>,
    renewal: Option<String>,
    transfer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "SUCCESS",
        "pricing": {
            "com": {"registration": "9.73", "renewal": "10.37", "transfer": "9.73", "coupons": []},
            "io": {"registration": "28.12", "renewal": "43.99", "transfer": "43.99", "coupons": []},
            "xyz": {"registration": "n/a", "renewal": "12.98", "transfer": "12.98"}
        }
    }"#;

    #[test]
    fn test_parse_price_table() {
        let table = parse_price_table(SAMPLE).unwrap();
        assert_eq!(table.len(), 3);

        let com = &table["com"];
        assert_eq!(com.registrar, "porkbun");
        assert_eq!(com.registration, Some(9.73));
        assert_eq!(com.renewal, Some(10.37));
        assert_eq!(com.currency, "USD");

        assert_eq!(table["xyz"].registration, None);
    }

    #[test]
    fn test_error_status() {
        let err = parse_price_table(r#"{"status": "ERROR", "message": "rate limited"}"#).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert!(parse_price_table("<html>").is_err());
    }

    #[tokio::test]
    async fn test_cached_table_is_served() {
        let provider = PorkbunProvider::new(&ResolverConfig::default())
            .unwrap()
            .with_url("http://0.0.0.0:1/unreachable");
        *provider.cache.lock() = Some(CachedTable {
            table: Arc::new(parse_price_table(SAMPLE).unwrap()),
            fetched_at: Instant::now(),
        });

        let prices = provider.get_tld_pricing(".IO").await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].registration, Some(28.12));
        assert!(provider.get_tld_pricing("dev").await.unwrap().is_empty());
    }
}
