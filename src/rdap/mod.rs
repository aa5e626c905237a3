//! Registry lookup over RDAP.
//!
//! Registry data is the base truth for registration state. The lookup
//! contract never fails: a registry that cannot answer yields a
//! [`RegistryRecord`] with neither `available` nor `registered` set.

pub mod client;
pub mod registry;

pub use client::RdapClient;

use crate::types::RegistryRecord;
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of registration state for domains
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn check_domain(&self, domain: &str) -> RegistryRecord;

    /// Look up many domains; one entry per distinct input
    async fn check_bulk(&self, domains: &[String]) -> HashMap<String, RegistryRecord> {
        let mut results = HashMap::with_capacity(domains.len());
        for domain in domains {
            if !results.contains_key(domain) {
                let record = self.check_domain(domain).await;
                results.insert(domain.clone(), record);
            }
        }
        results
    }
}
