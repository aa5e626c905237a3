//! Static RDAP server table.
//!
//! Small on purpose: high-traffic TLDs go straight to their registry, and
//! everything else goes through the bootstrap redirector when one is set.

/// RDAP base URL for a TLD (lowercase, no leading dot).
///
/// Returned URLs end with `/` and include any version path.
pub fn rdap_base_url(tld: &str) -> Option<&'static str> {
    match tld {
        "com" => Some("https://rdap.verisign.com/com/v1/"),
        "net" => Some("https://rdap.verisign.com/net/v1/"),
        "org" => Some("https://rdap.publicinterestregistry.org/rdap/"),
        "io" => Some("https://rdap.identitydigital.services/rdap/"),
        "ai" => Some("https://rdap.identitydigital.services/rdap/"),
        "co" => Some("https://rdap.registry.co/co/"),
        "me" => Some("https://rdap.identitydigital.services/rdap/"),
        "app" | "dev" | "page" => Some("https://pubapi.registry.google/rdap/"),
        "xyz" | "tech" | "online" | "site" | "store" => Some("https://rdap.centralnic.com/xyz/"),
        _ => None,
    }
}

/// Domain query URL, using `fallback` (a bootstrap redirector base) for TLDs
/// missing from the table
pub fn rdap_domain_url(domain: &str, fallback: Option<&str>) -> Option<String> {
    let tld = domain.rsplit('.').next()?.to_lowercase();
    if tld.is_empty() || tld == domain {
        return None;
    }

    let base = match rdap_base_url(&tld) {
        Some(base) => base.to_string(),
        None => {
            let fallback = fallback?;
            if fallback.ends_with('/') {
                fallback.to_string()
            } else {
                format!("{}/", fallback)
            }
        }
    };
    Some(format!("{}domain/{}", base, domain))
}
