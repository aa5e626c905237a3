//! Parking and for-sale page classifier.
//!
//! Best-effort heuristics over page content: broker signatures, generic
//! parking phrases, a visible asking price and page sparsity. The verdict
//! comes with a confidence label, never a guarantee.

use crate::types::{Broker, ParkingEvidence};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Parking pages are sparse; fewer words than this is a signal
pub const MINIMAL_CONTENT_WORDS: usize = 50;

pub const MIN_PLAUSIBLE_PRICE: f64 = 50.0;
pub const MAX_PLAUSIBLE_PRICE: f64 = 1_000_000.0;

/// Lowercase signatures that identify each broker.
///
/// A signature whose part before the first `/` contains a dot is a host
/// (optionally with a path prefix) and matches URL hosts exactly or by
/// `.`-suffix. Every other signature is a text marker.
fn broker_signatures(broker: Broker) -> &'static [&'static str] {
    match broker {
        Broker::Sedo => &["sedo.com", "sedoparking.com", "sedoparking", "sedo domain parking"],
        Broker::Afternic => &["afternic.com", "afternic"],
        Broker::Dan => &["dan.com", "undeveloped.com", "dan.com/buy-domain"],
        Broker::GoDaddy => &[
            "godaddy.com/domainsearch/find",
            "domain is parked free, courtesy of godaddy",
            "auctions.godaddy.com",
        ],
        Broker::HugeDomains => &["hugedomains.com", "hugedomains"],
        Broker::Bodis => &["bodis.com", "bodiscdn"],
        Broker::ParkingCrew => &["parkingcrew.net", "parkingcrew"],
        Broker::Above => &["above.com", "trellian"],
        Broker::Atom => &["atom.com/name/", "squadhelp.com"],
        Broker::BuyDomains => &["buydomains.com", "buydomains"],
    }
}

/// Generic phrases seen on parking and for-sale landers
const PARKING_PHRASES: &[&str] = &[
    "this domain is for sale",
    "this domain may be for sale",
    "buy this domain",
    "purchase this domain",
    "make an offer",
    "inquire about this domain",
    "get this domain",
    "domain name is available for purchase",
    "this domain is parked",
    "parked free",
    "domain parking",
    "sponsored listings",
    "related searches",
];

static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    const AMOUNT: &str = r"((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)";
    [
        format!(r"\$\s?{}", AMOUNT),
        format!(r"(?i)\bUSD\s?{}", AMOUNT),
        format!(r"€\s?{}", AMOUNT),
        format!(r"(?i)\bEUR\s?{}", AMOUNT),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("price regex"))
    .collect()
});

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->").expect("script regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));

/// Stateless page classifier
#[derive(Debug, Clone, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify an HTML body fetched from `final_url`.
    ///
    /// The body may be a truncated prefix; it is decoded lossily.
    pub fn classify(&self, html: &[u8], final_url: &Url) -> ParkingEvidence {
        let raw = String::from_utf8_lossy(html);
        let lower = raw.to_lowercase();
        let mut indicators = Vec::new();

        let broker = match_broker_in_text(&lower, &mut indicators)
            .or_else(|| match_broker_in_url(final_url, "final url", &mut indicators));

        for phrase in PARKING_PHRASES {
            if lower.contains(phrase) {
                indicators.push(format!("phrase \"{}\" in page", phrase));
            }
        }

        let estimated_price = extract_price(&raw);
        if let Some(price) = &estimated_price {
            tracing::trace!(url = %final_url, price = %price, "Asking price found");
        }

        let words = word_count(&raw);
        if words < MINIMAL_CONTENT_WORDS && !indicators.is_empty() {
            indicators.push(format!("minimal content ({} words)", words));
        }

        ParkingEvidence::new(broker, indicators, estimated_price)
    }

    /// Broker-signature check on a redirect destination, before any body is fetched
    pub fn classify_url(&self, url: &Url) -> ParkingEvidence {
        let mut indicators = Vec::new();
        let broker = match_broker_in_url(url, "redirect url", &mut indicators);
        ParkingEvidence::new(broker, indicators, None)
    }
}

/// First broker with a signature in the page text; records one indicator for it
fn match_broker_in_text(lower: &str, indicators: &mut Vec<String>) -> Option<Broker> {
    first_broker(|sig| text_contains(lower, sig), "page", indicators)
}

/// First broker whose host signature matches the URL host
fn match_broker_in_url(url: &Url, location: &str, indicators: &mut Vec<String>) -> Option<Broker> {
    let host = url.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    let path = url.path().to_ascii_lowercase();
    first_broker(
        |sig| {
            host_signature(sig).is_some_and(|(sig_host, sig_path)| {
                host_matches(&host, sig_host) && path.starts_with(sig_path)
            })
        },
        location,
        indicators,
    )
}

fn first_broker(
    matches: impl Fn(&str) -> bool,
    location: &str,
    indicators: &mut Vec<String>,
) -> Option<Broker> {
    for broker in Broker::ALL {
        if let Some(signature) = broker_signatures(broker).iter().find(|sig| matches(**sig)) {
            indicators.push(format!("broker {} (\"{}\" in {})", broker, signature, location));
            return Some(broker);
        }
    }
    None
}

/// Split a domain-shaped signature into host and path prefix
fn host_signature(sig: &str) -> Option<(&str, &str)> {
    if sig.contains(' ') {
        return None;
    }
    let (host, path) = match sig.find('/') {
        Some(i) => sig.split_at(i),
        None => (sig, ""),
    };
    host.contains('.').then_some((host, path))
}

fn host_matches(host: &str, sig_host: &str) -> bool {
    host == sig_host
        || host
            .strip_suffix(sig_host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Occurrence of `sig` not glued to a longer hostname label or word,
/// so `dan.com` is found in `www.dan.com` but not in `jordan.com`
fn text_contains(haystack: &str, sig: &str) -> bool {
    haystack.match_indices(sig).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(is_label_char) && !after.is_some_and(is_label_char)
    })
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// First plausible asking price, scanning price shapes in a fixed order.
///
/// Runs on the raw body so currency symbols survive.
pub fn extract_price(raw: &str) -> Option<String> {
    for pattern in PRICE_PATTERNS.iter() {
        for caps in pattern.captures_iter(raw) {
            let Some(amount) = caps.get(1) else { continue };
            let value: f64 = match amount.as_str().replace(',', "").parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            if (MIN_PLAUSIBLE_PRICE..=MAX_PLAUSIBLE_PRICE).contains(&value) {
                return caps.get(0).map(|m| m.as_str().to_string());
            }
        }
    }
    None
}

/// Words of visible text once scripts, styles and tags are stripped
pub fn word_count(html: &str) -> usize {
    let without_code = SCRIPT_STYLE_RE.replace_all(html, " ");
    let text = TAG_RE.replace_all(&without_code, " ");
    text.split_whitespace().count()
}
