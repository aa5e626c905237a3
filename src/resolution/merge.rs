//! Merge-policy steps.
//!
//! Applied in a fixed order: registry, pricing, aftermarket, HTTP probe.
//! Pricing is metadata only. Aftermarket can upgrade `taken` to `for_sale`.
//! The HTTP probe goes last and overrides with parked/for-sale evidence, or
//! with `taken` over `available`/`unknown`. An `unknown` probe changes nothing.

use crate::types::{
    AftermarketListing, DomainResolution, DomainStatus, PricingInfo, RegistrarPrice, RegistryRecord,
    VerificationMethod, VerificationOutcome, VerificationStatus,
};
use chrono::Utc;
use std::collections::HashMap;

/// Status implied by the registry record alone
pub fn base_status(record: &RegistryRecord) -> DomainStatus {
    if record.available {
        DomainStatus::Available
    } else if record.registered {
        DomainStatus::Taken
    } else {
        DomainStatus::Unknown
    }
}

/// First merge step: a resolution seeded from the registry record
pub fn from_registry(domain: &str, tld: &str, record: &RegistryRecord) -> DomainResolution {
    DomainResolution {
        domain: domain.to_string(),
        tld: tld.to_string(),
        status: base_status(record),
        verification_method: VerificationMethod::Registry,
        registrar: record.registrar.clone(),
        pricing: None,
        aftermarket: None,
        parking: None,
        verified_at: Utc::now(),
        error: if record.has_answer() { None } else { record.error.clone() },
    }
}

/// Pricing summary: every registrar seen plus the cheapest registration.
///
/// Ties keep the earlier entry, so provider registration order decides.
pub fn pricing_info(prices: Vec<RegistrarPrice>) -> Option<PricingInfo> {
    if prices.is_empty() {
        return None;
    }

    let mut cheapest: Option<&RegistrarPrice> = None;
    for price in &prices {
        let Some(amount) = price.registration else { continue };
        match cheapest.and_then(|c| c.registration) {
            Some(best) if best <= amount => {}
            _ => cheapest = Some(price),
        }
    }

    Some(PricingInfo {
        cheapest: cheapest.cloned(),
        registrars: prices,
    })
}

/// Attach pricing; never touches the status
pub fn apply_pricing(resolution: &mut DomainResolution, prices: Vec<RegistrarPrice>) {
    resolution.pricing = pricing_info(prices);
}

/// De-duplicate listings by (domain, provider); the lower price wins and a
/// priced listing beats an unpriced one. First-seen order is kept.
pub fn merge_listings(listings: impl IntoIterator<Item = AftermarketListing>) -> Vec<AftermarketListing> {
    let mut merged: Vec<AftermarketListing> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for listing in listings {
        let key = (listing.domain.to_lowercase(), listing.provider.to_lowercase());
        match index.get(&key) {
            Some(&i) => {
                let current = &merged[i];
                let cheaper = match (listing.price, current.price) {
                    (Some(new), Some(old)) => new < old,
                    (Some(_), None) => true,
                    _ => false,
                };
                if cheaper {
                    merged[i] = listing;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(listing);
            }
        }
    }

    merged
}

/// Attach listings; a non-empty set upgrades `taken` to `for_sale`
pub fn apply_aftermarket(resolution: &mut DomainResolution, listings: Vec<AftermarketListing>) {
    let listings = merge_listings(listings);
    if listings.is_empty() {
        return;
    }

    if resolution.status == DomainStatus::Taken {
        resolution.status = DomainStatus::ForSale;
        resolution.verification_method = VerificationMethod::RegistrarApi;
    }
    resolution.aftermarket = Some(listings);
}

/// Last merge step: the live HTTP observation
pub fn apply_verification(resolution: &mut DomainResolution, outcome: &VerificationOutcome) {
    match outcome.status() {
        VerificationStatus::Parked | VerificationStatus::ForSale => {
            resolution.status = if outcome.status() == VerificationStatus::ForSale {
                DomainStatus::ForSale
            } else {
                DomainStatus::Parked
            };
            resolution.verification_method = VerificationMethod::HttpProbe;
            resolution.parking = outcome.parking_evidence().cloned();
        }
        VerificationStatus::Taken => {
            if matches!(resolution.status, DomainStatus::Available | DomainStatus::Unknown) {
                resolution.status = DomainStatus::Taken;
                resolution.verification_method = VerificationMethod::HttpProbe;
            }
        }
        VerificationStatus::AvailableSignal | VerificationStatus::Unknown => {}
    }
}
