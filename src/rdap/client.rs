//! RDAP client

use crate::error::{DomainOracleError, Result};
use crate::rdap::registry::rdap_domain_url;
use crate::rdap::RegistryLookup;
use crate::types::{RegistryRecord, ResolverConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// RDAP client for registration lookups
pub struct RdapClient {
    client: Client,
    timeout: Duration,
    fallback_url: Option<String>,
    bulk_delay: Duration,
}

impl RdapClient {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| DomainOracleError::internal(format!("Failed to build RDAP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.rdap_timeout,
            fallback_url: config.rdap_fallback_url.clone(),
            bulk_delay: config.registry_bulk_delay,
        })
    }

    /// Query URL for a domain, if any RDAP server is known for its TLD
    pub fn lookup_url(&self, domain: &str) -> Option<String> {
        rdap_domain_url(domain, self.fallback_url.as_deref())
    }

    async fn query(&self, domain: &str) -> Result<RegistryRecord> {
        let url = self.lookup_url(domain).ok_or_else(|| {
            DomainOracleError::upstream(
                "rdap",
                format!("No RDAP server found for {}", domain),
                None,
            )
        })?;

        let response = timeout(
            self.timeout,
            self.client
                .get(&url)
                .header("Accept", "application/rdap+json, application/json")
                .send(),
        )
        .await
        .map_err(|_| DomainOracleError::timeout("RDAP request", self.timeout.as_secs()))?
        .map_err(|e| DomainOracleError::network(e.to_string(), None, Some(url.clone())))?;

        let status = response.status().as_u16();
        let body = if status == 200 {
            timeout(self.timeout, response.text())
                .await
                .map_err(|_| DomainOracleError::timeout("RDAP body", self.timeout.as_secs()))?
                .map_err(|e| DomainOracleError::network(e.to_string(), None, Some(url.clone())))?
        } else {
            String::new()
        };

        interpret_response(domain, status, &body)
    }
}

#[async_trait]
impl RegistryLookup for RdapClient {
    async fn check_domain(&self, domain: &str) -> RegistryRecord {
        let start = Instant::now();
        match self.query(domain).await {
            Ok(record) => {
                tracing::debug!(
                    domain = %domain,
                    available = record.available,
                    registered = record.registered,
                    duration_ms = %start.elapsed().as_millis(),
                    "RDAP lookup completed"
                );
                record
            }
            Err(e) => {
                tracing::debug!(domain = %domain, error = %e, "RDAP lookup failed");
                RegistryRecord::no_answer(domain, e.to_string())
            }
        }
    }

    /// No bulk endpoint exists, so lookups run one at a time with a delay
    async fn check_bulk(&self, domains: &[String]) -> HashMap<String, RegistryRecord> {
        let batch_start = Instant::now();
        let mut results = HashMap::with_capacity(domains.len());

        for domain in domains {
            if results.contains_key(domain) {
                continue;
            }
            if !results.is_empty() && !self.bulk_delay.is_zero() {
                tokio::time::sleep(self.bulk_delay).await;
            }
            let record = self.check_domain(domain).await;
            results.insert(domain.clone(), record);
        }

        tracing::info!(
            domains = %results.len(),
            batch_duration_ms = %batch_start.elapsed().as_millis(),
            "RDAP bulk lookup completed"
        );
        results
    }
}

/// Map an RDAP HTTP answer to a record: 404 is unregistered, 200 is
/// registered, anything else is no answer.
pub fn interpret_response(domain: &str, status: u16, body: &str) -> Result<RegistryRecord> {
    match status {
        404 => Ok(RegistryRecord::available(domain)),
        200 => parse_rdap_response(domain, body),
        other => Err(DomainOracleError::upstream(
            "rdap",
            format!("RDAP request failed with status {}", other),
            Some(other),
        )),
    }
}

/// Extract registration details from an RDAP domain object
pub fn parse_rdap_response(domain: &str, body: &str) -> Result<RegistryRecord> {
    let response: RdapResponse = serde_json::from_str(body)
        .map_err(|e| DomainOracleError::parse(e.to_string(), Some(body.chars().take(512).collect())))?;

    let registrar = response
        .entities
        .iter()
        .find(|e| e.roles.iter().any(|r| r == "registrar"))
        .and_then(|e| e.vcard_array.as_ref())
        .and_then(vcard_full_name);

    let event_date = |action: &str| {
        response
            .events
            .iter()
            .find(|e| e.event_action == action)
            .and_then(|e| e.event_date.parse::<DateTime<Utc>>().ok())
    };

    let mut record = RegistryRecord::registered(domain, registrar);
    record.creation_date = event_date("registration");
    record.expiration_date = event_date("expiration");
    record.status = response.status.clone();
    record.nameservers = response
        .nameservers
        .iter()
        .map(|ns| ns.ldh_name.to_lowercase())
        .collect();
    Ok(record)
}

/// `fn` property of a jCard: `["vcard", [["fn", {}, "text", "Name"], ...]]`
fn vcard_full_name(vcard: &serde_json::Value) -> Option<String> {
    vcard
        .get(1)?
        .as_array()?
        .iter()
        .filter_map(|prop| prop.as_array())
        .find(|prop| prop.first().and_then(|n| n.as_str()) == Some("fn"))
        .and_then(|prop| prop.get(3))
        .and_then(|name| name.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// RDAP response structures
#[derive(Debug, Deserialize)]
struct RdapResponse {
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
    #[serde(default)]
    events: Vec<RdapEvent>,
    #[serde(default)]
    nameservers: Vec<RdapNameserver>,
}

#[derive(Debug, Deserialize)]
struct RdapEntity {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(rename = "vcardArray")]
    vcard_array: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction")]
    event_action: String,
    #[serde(rename = "eventDate")]
    event_date: String,
}

#[derive(Debug, Deserialize)]
struct RdapNameserver {
    #[serde(rename = "ldhName")]
    ldh_name: String,
}
