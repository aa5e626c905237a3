//! Domain Oracle - domain availability and ownership status resolution
//!
//! Answers "can I register this domain, and if not, who holds it and is it
//! for sale?" by merging registry data, registrar pricing, aftermarket
//! listings and a safe live HTTP probe into one status per domain.

pub mod config;
pub mod domain;
pub mod error;
pub mod probe;
pub mod providers;
pub mod rdap;
pub mod resolution;
pub mod types;

// Re-export commonly used types
pub use error::{DomainOracleError, Result};
pub use types::{
    AftermarketListing, BatchResolution, Broker, Confidence, DomainResolution, DomainStatus,
    ListingFilters, ListingType, LookupOptions, ParkingEvidence, PricingInfo, RegistrarPrice,
    RegistryRecord, ResolverConfig, StatusCounts, VerificationMethod, VerificationOutcome,
    VerificationStatus,
};

// Re-export main functionality
pub use domain::DomainValidator;
pub use probe::{ContentClassifier, DomainVerifier, HttpVerifier};
pub use providers::{AftermarketProvider, PricingProvider, ProviderRegistry};
pub use rdap::{RdapClient, RegistryLookup};
pub use resolution::StatusResolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

