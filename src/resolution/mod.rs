//! Status resolution engine.
//!
//! Combines the registry lookup, pricing and aftermarket providers and the
//! HTTP verifier into one [`DomainResolution`] per domain, following the
//! merge policy in [`merge`].

pub mod merge;

use crate::domain::{expand_keyword, DomainValidator};
use crate::error::{DomainOracleError, Result};
use crate::probe::{DomainVerifier, HttpVerifier};
use crate::providers::ProviderRegistry;
use crate::rdap::{RdapClient, RegistryLookup};
use crate::types::{
    AftermarketListing, BatchResolution, DomainResolution, DomainStatus, ListingFilters,
    LookupOptions, RegistrarPrice, ResolverConfig,
};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Resolves domains to one canonical status
pub struct StatusResolver {
    registry: Arc<dyn RegistryLookup>,
    providers: Arc<ProviderRegistry>,
    verifier: Arc<dyn DomainVerifier>,
    validator: DomainValidator,
    config: ResolverConfig,
}

impl StatusResolver {
    /// Resolver wired to RDAP, the configured providers and a live HTTP verifier
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let registry = Arc::new(RdapClient::new(&config)?);
        let providers = Arc::new(ProviderRegistry::from_config(&config)?);
        let verifier = Arc::new(HttpVerifier::from_config(&config)?);
        Ok(Self::with_components(config, registry, providers, verifier))
    }

    pub fn with_components(
        config: ResolverConfig,
        registry: Arc<dyn RegistryLookup>,
        providers: Arc<ProviderRegistry>,
        verifier: Arc<dyn DomainVerifier>,
    ) -> Self {
        Self {
            registry,
            providers,
            verifier,
            validator: DomainValidator::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Resolve one domain. Only invalid input is an error; every network
    /// failure is folded into the result.
    pub async fn resolve_domain(&self, domain: &str, options: LookupOptions) -> Result<DomainResolution> {
        let start = Instant::now();
        let validated = self.validator.validate(domain)?;
        let full = validated.full_domain.as_str();

        let record = self.registry.check_domain(full).await;
        let mut resolution = merge::from_registry(full, &validated.tld, &record);

        if options.include_pricing {
            let prices = self.fetch_pricing(&validated.tld).await;
            merge::apply_pricing(&mut resolution, prices);
        }

        if options.include_aftermarket && resolution.status != DomainStatus::Available {
            let listings = self.fetch_listings(full).await;
            merge::apply_aftermarket(&mut resolution, listings);
        }

        if options.include_parking {
            let outcome = self.verifier.verify(full).await;
            merge::apply_verification(&mut resolution, &outcome);
        }

        resolution.verified_at = Utc::now();
        tracing::debug!(
            domain = %full,
            status = %resolution.status,
            method = %resolution.verification_method,
            duration_ms = %start.elapsed().as_millis(),
            "Domain resolved"
        );
        Ok(resolution)
    }

    /// Resolve many domains, keeping input order.
    ///
    /// More than `max_bulk_domains` inputs is a validation error; an invalid
    /// member becomes an `unknown` entry instead of failing the batch.
    pub async fn resolve_batch(&self, domains: &[String], options: LookupOptions) -> Result<BatchResolution> {
        if domains.len() > self.config.max_bulk_domains {
            return Err(crate::validation_error!(
                "Too many domains: {} (maximum {})",
                domains.len(),
                self.config.max_bulk_domains
            ));
        }

        let batch_start = Instant::now();
        let entries: Vec<std::result::Result<(String, String), DomainResolution>> = domains
            .iter()
            .map(|input| match self.validator.validate(input) {
                Ok(v) => Ok((v.full_domain, v.tld)),
                Err(e) => Err(invalid_entry(&self.validator, input, &e)),
            })
            .collect();

        let mut valid: Vec<String> = Vec::new();
        let mut tlds: Vec<String> = Vec::new();
        for (full, tld) in entries.iter().filter_map(|e| e.as_ref().ok()) {
            if !valid.contains(full) {
                valid.push(full.clone());
            }
            if !tlds.contains(tld) {
                tlds.push(tld.clone());
            }
        }

        let records = self.registry.check_bulk(&valid).await;

        let mut pricing: HashMap<String, Vec<RegistrarPrice>> = HashMap::new();
        if options.include_pricing {
            let fetched = join_all(tlds.iter().map(|tld| self.fetch_pricing(tld))).await;
            pricing.extend(tlds.iter().cloned().zip(fetched));
        }

        let mut resolved: HashMap<String, DomainResolution> = HashMap::with_capacity(valid.len());
        for (full, tld) in entries.iter().filter_map(|e| e.as_ref().ok()) {
            if resolved.contains_key(full) {
                continue;
            }
            let resolution = match records.get(full) {
                Some(record) => merge::from_registry(full, tld, record),
                None => DomainResolution::unknown(full.as_str(), tld.as_str(), "No registry answer"),
            };
            resolved.insert(full.clone(), resolution);
        }

        for resolution in resolved.values_mut() {
            if let Some(prices) = pricing.get(&resolution.tld) {
                merge::apply_pricing(resolution, prices.clone());
            }
        }

        if options.include_aftermarket && self.providers.has_aftermarket() {
            let targets: Vec<&String> = valid
                .iter()
                .filter(|full| {
                    resolved
                        .get(*full)
                        .is_some_and(|r| r.status != DomainStatus::Available)
                })
                .collect();

            for group in targets.chunks(self.config.probe_group_size.max(1)) {
                let fetched = join_all(group.iter().map(|full| self.fetch_listings(full))).await;
                for (full, listings) in group.iter().zip(fetched) {
                    if let Some(resolution) = resolved.get_mut(*full) {
                        merge::apply_aftermarket(resolution, listings);
                    }
                }
            }
        }

        if options.include_parking && !valid.is_empty() {
            let outcomes = self.verifier.verify_bulk(&valid).await;
            for (full, outcome) in &outcomes {
                if let Some(resolution) = resolved.get_mut(full) {
                    merge::apply_verification(resolution, outcome);
                }
            }
        }

        let now = Utc::now();
        let results: Vec<DomainResolution> = entries
            .into_iter()
            .map(|entry| match entry {
                Ok((full, tld)) => {
                    let mut resolution = resolved
                        .get(&full)
                        .cloned()
                        .unwrap_or_else(|| DomainResolution::unknown(full.as_str(), tld.as_str(), "Not resolved"));
                    resolution.verified_at = now;
                    resolution
                }
                Err(invalid) => invalid,
            })
            .collect();

        let batch = BatchResolution::new(results);
        let counts = batch.counts();
        tracing::info!(
            domains = %counts.total,
            available = %counts.available,
            taken = %counts.taken,
            parked = %counts.parked,
            for_sale = %counts.for_sale,
            unknown = %counts.unknown,
            batch_duration_ms = %batch_start.elapsed().as_millis(),
            "Batch resolution completed"
        );
        Ok(batch)
    }

    /// Resolve `keyword` across `tlds`, or the configured default set when empty
    pub async fn search_keyword(
        &self,
        keyword: &str,
        tlds: &[String],
        options: LookupOptions,
    ) -> Result<BatchResolution> {
        let tlds = if tlds.is_empty() {
            &self.config.default_tlds[..]
        } else {
            tlds
        };
        let domains = expand_keyword(&self.validator, keyword, tlds)?;
        tracing::debug!(keyword = %keyword, candidates = domains.len(), "Keyword expanded");
        self.resolve_batch(&domains, options).await
    }

    /// Search every aftermarket provider, merging duplicates and applying filters
    pub async fn search_aftermarket(&self, query: &str, filters: &ListingFilters) -> Result<Vec<AftermarketListing>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainOracleError::validation("Aftermarket query is empty"));
        }

        let providers = self.providers.aftermarket_providers();
        let calls = providers.iter().map(|provider| {
            let name = provider.name().to_string();
            let provider = Arc::clone(provider);
            let filters = filters.clone();
            self.bounded(name, async move { provider.search_listings(query, &filters).await })
        });
        let listings = join_all(calls).await.into_iter().flatten();

        let mut merged: Vec<AftermarketListing> = merge::merge_listings(listings)
            .into_iter()
            .filter(|l| filters.accepts(l))
            .collect();
        if let Some(limit) = filters.limit {
            merged.truncate(limit);
        }
        Ok(merged)
    }

    /// Prices from every pricing provider for one TLD, in registration order
    async fn fetch_pricing(&self, tld: &str) -> Vec<RegistrarPrice> {
        let providers = self.providers.pricing_providers();
        let calls = providers.iter().map(|provider| {
            let name = provider.name().to_string();
            let provider = Arc::clone(provider);
            self.bounded(name, async move { provider.get_tld_pricing(tld).await })
        });
        join_all(calls).await.into_iter().flatten().collect()
    }

    /// Listings for one domain from every aftermarket provider
    async fn fetch_listings(&self, domain: &str) -> Vec<AftermarketListing> {
        let providers = self.providers.aftermarket_providers();
        let calls = providers.iter().map(|provider| {
            let name = provider.name().to_string();
            let provider = Arc::clone(provider);
            self.bounded(name, async move { provider.get_domain_listings(domain).await })
        });
        join_all(calls).await.into_iter().flatten().collect()
    }

    /// Run one provider call under the provider timeout; failures become empty
    async fn bounded<T, F>(&self, provider: String, call: F) -> Vec<T>
    where
        F: Future<Output = Result<Vec<T>>>,
    {
        let limit: Duration = self.config.provider_timeout;
        match timeout(limit, call).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                tracing::warn!(provider = %provider, error = %e, "Provider call failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(provider = %provider, timeout_ms = %limit.as_millis(), "Provider call timed out");
                Vec::new()
            }
        }
    }
}

/// `unknown` entry for a batch member that failed validation
fn invalid_entry(validator: &DomainValidator, input: &str, error: &DomainOracleError) -> DomainResolution {
    let normalized = validator.normalize(input);
    let tld = normalized
        .rsplit_once('.')
        .map(|(_, tld)| tld.to_string())
        .unwrap_or_default();
    DomainResolution::unknown(normalized, tld, error.to_string())
}
