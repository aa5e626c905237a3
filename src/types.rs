//! Core types and structures for domain-oracle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Canonical status of a domain after all signals are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Available,
    Taken,
    Parked,
    ForSale,
    Premium,
    Unknown,
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Available => write!(f, "available"),
            DomainStatus::Taken => write!(f, "taken"),
            DomainStatus::Parked => write!(f, "parked"),
            DomainStatus::ForSale => write!(f, "for_sale"),
            DomainStatus::Premium => write!(f, "premium"),
            DomainStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Which source decided the final status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Registry,
    HttpProbe,
    RegistrarApi,
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationMethod::Registry => write!(f, "registry"),
            VerificationMethod::HttpProbe => write!(f, "http_probe"),
            VerificationMethod::RegistrarApi => write!(f, "registrar_api"),
        }
    }
}

/// Status observed by probing a domain over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    AvailableSignal,
    Taken,
    Parked,
    ForSale,
    Unknown,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::AvailableSignal => write!(f, "available_signal"),
            VerificationStatus::Taken => write!(f, "taken"),
            VerificationStatus::Parked => write!(f, "parked"),
            VerificationStatus::ForSale => write!(f, "for_sale"),
            VerificationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Known domain aftermarket brokers and parking services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Broker {
    Sedo,
    Afternic,
    Dan,
    GoDaddy,
    HugeDomains,
    Bodis,
    ParkingCrew,
    Above,
    Atom,
    BuyDomains,
}

impl Broker {
    pub const ALL: [Broker; 10] = [
        Broker::Sedo,
        Broker::Afternic,
        Broker::Dan,
        Broker::GoDaddy,
        Broker::HugeDomains,
        Broker::Bodis,
        Broker::ParkingCrew,
        Broker::Above,
        Broker::Atom,
        Broker::BuyDomains,
    ];
}

impl std::fmt::Display for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Broker::Sedo => write!(f, "sedo"),
            Broker::Afternic => write!(f, "afternic"),
            Broker::Dan => write!(f, "dan"),
            Broker::GoDaddy => write!(f, "godaddy"),
            Broker::HugeDomains => write!(f, "hugedomains"),
            Broker::Bodis => write!(f, "bodis"),
            Broker::ParkingCrew => write!(f, "parkingcrew"),
            Broker::Above => write!(f, "above"),
            Broker::Atom => write!(f, "atom"),
            Broker::BuyDomains => write!(f, "buydomains"),
        }
    }
}

/// How much the classifier trusts its parking verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Classifier output for one page or redirect destination.
///
/// `is_parked` and `confidence` are derived from the broker and the
/// indicator list when the value is built and cannot be set on their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingEvidence {
    is_parked: bool,
    broker: Option<Broker>,
    indicators: Vec<String>,
    estimated_price: Option<String>,
    confidence: Confidence,
}

impl ParkingEvidence {
    pub fn new(
        broker: Option<Broker>,
        indicators: Vec<String>,
        estimated_price: Option<String>,
    ) -> Self {
        let count = indicators.len();
        let is_parked = count >= 2 || broker.is_some();
        let confidence = if broker.is_some() && count >= 3 {
            Confidence::High
        } else if count >= 2 {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        Self {
            is_parked,
            broker,
            indicators,
            estimated_price,
            confidence,
        }
    }

    pub fn is_parked(&self) -> bool {
        self.is_parked
    }

    pub fn broker(&self) -> Option<Broker> {
        self.broker
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn estimated_price(&self) -> Option<&str> {
        self.estimated_price.as_deref()
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }
}

/// Result of probing one domain over HTTP.
///
/// Evidence is present exactly when the status is `Parked` or `ForSale`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    parking_evidence: Option<ParkingEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_redirect_url: Option<String>,
}

impl VerificationOutcome {
    /// Nothing trustworthy was observed
    pub fn unknown() -> Self {
        Self {
            status: VerificationStatus::Unknown,
            parking_evidence: None,
            http_status_code: None,
            final_redirect_url: None,
        }
    }

    /// A live, content-bearing site
    pub fn taken(http_status_code: Option<u16>, final_redirect_url: Option<String>) -> Self {
        Self {
            status: VerificationStatus::Taken,
            parking_evidence: None,
            http_status_code,
            final_redirect_url,
        }
    }

    /// Map classifier evidence to an outcome: parked with a broker is for
    /// sale, parked without one is parked, anything else is taken.
    pub fn from_evidence(
        evidence: ParkingEvidence,
        http_status_code: Option<u16>,
        final_redirect_url: Option<String>,
    ) -> Self {
        if !evidence.is_parked() {
            return Self::taken(http_status_code, final_redirect_url);
        }

        let status = if evidence.broker().is_some() {
            VerificationStatus::ForSale
        } else {
            VerificationStatus::Parked
        };

        Self {
            status,
            parking_evidence: Some(evidence),
            http_status_code,
            final_redirect_url,
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn parking_evidence(&self) -> Option<&ParkingEvidence> {
        self.parking_evidence.as_ref()
    }

    pub fn http_status_code(&self) -> Option<u16> {
        self.http_status_code
    }

    pub fn final_redirect_url(&self) -> Option<&str> {
        self.final_redirect_url.as_deref()
    }

    pub fn is_unknown(&self) -> bool {
        self.status == VerificationStatus::Unknown
    }
}

/// Answer from the registration-data lookup for one domain
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub domain: String,
    pub available: bool,
    pub registered: bool,
    pub registrar: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub status: Vec<String>,
    pub nameservers: Vec<String>,
    pub error: Option<String>,
}

impl RegistryRecord {
    pub fn available(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            available: true,
            ..Default::default()
        }
    }

    pub fn registered(domain: impl Into<String>, registrar: Option<String>) -> Self {
        Self {
            domain: domain.into(),
            registered: true,
            registrar,
            ..Default::default()
        }
    }

    /// The registry gave no answer (server not found, error, timeout)
    pub fn no_answer(domain: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn has_answer(&self) -> bool {
        self.available || self.registered
    }
}

/// Price of a TLD at one registrar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarPrice {
    pub registrar: String,
    pub registration: Option<f64>,
    pub renewal: Option<f64>,
    pub transfer: Option<f64>,
    pub currency: String,
}

/// Pricing attached to a resolution: headline cheapest plus every registrar seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInfo {
    pub cheapest: Option<RegistrarPrice>,
    pub registrars: Vec<RegistrarPrice>,
}

/// Kind of aftermarket offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    BuyNow,
    Auction,
    MakeOffer,
}

/// A secondary-market offer for an already-registered domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AftermarketListing {
    pub domain: String,
    pub provider: String,
    pub price: Option<f64>,
    pub currency: String,
    pub listing_type: ListingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Filters for aftermarket listing searches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub tlds: Vec<String>,
    pub limit: Option<usize>,
}

impl ListingFilters {
    /// Whether a listing passes the price and TLD filters
    pub fn accepts(&self, listing: &AftermarketListing) -> bool {
        if let Some(min) = self.min_price {
            if listing.price.map_or(true, |p| p < min) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price.map_or(true, |p| p > max) {
                return false;
            }
        }
        if !self.tlds.is_empty() {
            let tld = listing.domain.rsplit('.').next().unwrap_or_default();
            if !self.tlds.iter().any(|t| t.eq_ignore_ascii_case(tld)) {
                return false;
            }
        }
        true
    }
}

/// Merged canonical result for one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainResolution {
    pub domain: String,
    pub tld: String,
    pub status: DomainStatus,
    pub verification_method: VerificationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aftermarket: Option<Vec<AftermarketListing>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<ParkingEvidence>,
    pub verified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DomainResolution {
    /// A resolution for a domain that could not be looked up at all
    pub fn unknown(domain: impl Into<String>, tld: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            tld: tld.into(),
            status: DomainStatus::Unknown,
            verification_method: VerificationMethod::Registry,
            registrar: None,
            pricing: None,
            aftermarket: None,
            parking: None,
            verified_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Cardinality of each status over a set of resolutions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub available: usize,
    pub taken: usize,
    pub parked: usize,
    pub for_sale: usize,
    pub premium: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn from_results(results: &[DomainResolution]) -> Self {
        let mut counts = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status {
                DomainStatus::Available => counts.available += 1,
                DomainStatus::Taken => counts.taken += 1,
                DomainStatus::Parked => counts.parked += 1,
                DomainStatus::ForSale => counts.for_sale += 1,
                DomainStatus::Premium => counts.premium += 1,
                DomainStatus::Unknown => counts.unknown += 1,
            }
        }
        counts
    }
}

/// Aggregate result of a batch or keyword search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResolution {
    counts: StatusCounts,
    results: Vec<DomainResolution>,
}

impl BatchResolution {
    pub fn new(results: Vec<DomainResolution>) -> Self {
        Self {
            counts: StatusCounts::from_results(&results),
            results,
        }
    }

    pub fn counts(&self) -> &StatusCounts {
        &self.counts
    }

    pub fn results(&self) -> &[DomainResolution] {
        &self.results
    }

    pub fn into_results(self) -> Vec<DomainResolution> {
        self.results
    }
}

/// Feature toggles for one lookup request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOptions {
    pub include_pricing: bool,
    pub include_aftermarket: bool,
    pub include_parking: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            include_pricing: true,
            include_aftermarket: true,
            include_parking: false,
        }
    }
}

impl LookupOptions {
    /// Registry lookup only
    pub fn registry_only() -> Self {
        Self {
            include_pricing: false,
            include_aftermarket: false,
            include_parking: false,
        }
    }

    /// Every source enabled
    pub fn all() -> Self {
        Self {
            include_pricing: true,
            include_aftermarket: true,
            include_parking: true,
        }
    }
}

/// Configuration for status resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Timeout for one HTTP probe hop (not the whole redirect chain)
    pub http_timeout: Duration,
    /// Timeout for one RDAP request
    pub rdap_timeout: Duration,
    /// Timeout for pricing and aftermarket API calls
    pub provider_timeout: Duration,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
    /// Probes run concurrently within a group of this size
    pub probe_group_size: usize,
    pub probe_group_pause: Duration,
    pub registry_bulk_delay: Duration,
    pub max_bulk_domains: usize,
    pub default_tlds: Vec<String>,
    pub user_agent: String,
    /// Bootstrap redirector for TLDs missing from the static RDAP table
    pub rdap_fallback_url: Option<String>,
    pub enable_porkbun: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            rdap_timeout: Duration::from_secs(15),
            provider_timeout: Duration::from_secs(30),
            max_redirects: 5,
            max_body_bytes: 1024 * 1024,
            probe_group_size: 5,
            probe_group_pause: Duration::from_millis(200),
            registry_bulk_delay: Duration::from_millis(100),
            max_bulk_domains: 50,
            default_tlds: crate::domain::DEFAULT_SEARCH_TLDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agent: format!("domain-oracle/{}", env!("CARGO_PKG_VERSION")),
            rdap_fallback_url: Some("https://rdap.org/".to_string()),
            enable_porkbun: true,
        }
    }
}

impl ResolverConfig {
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_rdap_timeout(mut self, timeout: Duration) -> Self {
        self.rdap_timeout = timeout;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Group size is clamped to at least one probe
    pub fn with_probe_group(mut self, size: usize, pause: Duration) -> Self {
        self.probe_group_size = size.max(1);
        self.probe_group_pause = pause;
        self
    }

    pub fn with_registry_bulk_delay(mut self, delay: Duration) -> Self {
        self.registry_bulk_delay = delay;
        self
    }

    pub fn with_default_tlds(mut self, tlds: Vec<String>) -> Self {
        self.default_tlds = tlds;
        self
    }

    pub fn with_rdap_fallback(mut self, url: Option<String>) -> Self {
        self.rdap_fallback_url = url;
        self
    }

    pub fn with_porkbun(mut self, enabled: bool) -> Self {
        self.enable_porkbun = enabled;
        self
    }
}
