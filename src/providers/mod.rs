//! Pricing and aftermarket providers.
//!
//! Providers are pluggable data sources. Pricing providers report what a
//! registrar charges for a TLD; aftermarket providers report secondary-market
//! listings. Both are optional inputs to resolution and never decide
//! registration state on their own.

#[cfg(feature = "porkbun")]
pub mod porkbun;

#[cfg(feature = "porkbun")]
pub use porkbun::PorkbunProvider;

use crate::error::Result;
use crate::types::{AftermarketListing, ListingFilters, RegistrarPrice, ResolverConfig};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Source of registrar prices per TLD
#[async_trait]
pub trait PricingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether credentials and endpoints are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Prices this provider knows for `tld`; empty when it does not sell it
    async fn get_tld_pricing(&self, tld: &str) -> Result<Vec<RegistrarPrice>>;
}

/// Source of secondary-market listings
#[async_trait]
pub trait AftermarketProvider: Send + Sync {
    fn name(&self) -> &str;

    fn is_configured(&self) -> bool {
        true
    }

    /// Listings for one exact domain
    async fn get_domain_listings(&self, domain: &str) -> Result<Vec<AftermarketListing>>;

    /// Listings matching a free-text query
    async fn search_listings(&self, query: &str, filters: &ListingFilters) -> Result<Vec<AftermarketListing>>;
}

/// Registered providers, kept in registration order.
///
/// Order matters: on equal prices the earlier provider wins.
#[derive(Default)]
pub struct ProviderRegistry {
    pricing: RwLock<Vec<Arc<dyn PricingProvider>>>,
    aftermarket: RwLock<Vec<Arc<dyn AftermarketProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in providers the configuration enables
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let registry = Self::new();

        #[cfg(feature = "porkbun")]
        if config.enable_porkbun {
            registry.register_pricing(Arc::new(PorkbunProvider::new(config)?));
        }

        #[cfg(not(feature = "porkbun"))]
        let _ = config;

        Ok(registry)
    }

    /// Add a pricing provider; one with the same name is replaced in place
    pub fn register_pricing(&self, provider: Arc<dyn PricingProvider>) {
        let mut providers = self.pricing.write();
        match providers.iter().position(|p| p.name() == provider.name()) {
            Some(index) => providers[index] = provider,
            None => providers.push(provider),
        }
    }

    /// Add an aftermarket provider; one with the same name is replaced in place
    pub fn register_aftermarket(&self, provider: Arc<dyn AftermarketProvider>) {
        let mut providers = self.aftermarket.write();
        match providers.iter().position(|p| p.name() == provider.name()) {
            Some(index) => providers[index] = provider,
            None => providers.push(provider),
        }
    }

    /// Configured pricing providers, snapshotted so no lock is held across awaits
    pub fn pricing_providers(&self) -> Vec<Arc<dyn PricingProvider>> {
        self.pricing
            .read()
            .iter()
            .filter(|p| p.is_configured())
            .cloned()
            .collect()
    }

    pub fn aftermarket_providers(&self) -> Vec<Arc<dyn AftermarketProvider>> {
        self.aftermarket
            .read()
            .iter()
            .filter(|p| p.is_configured())
            .cloned()
            .collect()
    }

    pub fn pricing_names(&self) -> Vec<String> {
        self.pricing.read().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn aftermarket_names(&self) -> Vec<String> {
        self.aftermarket.read().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn has_pricing(&self) -> bool {
        self.pricing.read().iter().any(|p| p.is_configured())
    }

    pub fn has_aftermarket(&self) -> bool {
        self.aftermarket.read().iter().any(|p| p.is_configured())
    }
}
