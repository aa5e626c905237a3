//! Domain name input handling: validation, TLD presets and keyword expansion

pub mod validator;

pub use validator::{DomainValidator, ValidatedDomain};

use crate::error::Result;

/// TLDs searched when a keyword lookup names none
pub const DEFAULT_SEARCH_TLDS: &[&str] = &["com", "net", "org", "io", "co", "dev", "app", "ai"];

pub const POPULAR_TLDS: &[&str] = &[
    "com", "org", "net", "io", "ai", "co", "me", "app", "dev", "tech", "xyz",
];

pub const STARTUP_TLDS: &[&str] = &["com", "org", "io", "ai", "tech", "app", "dev", "xyz"];

pub const ENTERPRISE_TLDS: &[&str] = &["com", "org", "net", "biz", "info", "us"];

/// Get TLD list by preset name
pub fn get_tld_list(name: &str) -> Option<Vec<String>> {
    let list = match name.to_lowercase().as_str() {
        "default" => DEFAULT_SEARCH_TLDS,
        "popular" => POPULAR_TLDS,
        "startup" => STARTUP_TLDS,
        "enterprise" => ENTERPRISE_TLDS,
        _ => return None,
    };
    Some(list.iter().map(|s| s.to_string()).collect())
}

/// Build the `keyword × TLD` cross product.
///
/// The keyword must be a single label; TLDs are normalized (lowercase, no
/// leading dot) and de-duplicated keeping first occurrence order.
pub fn expand_keyword(validator: &DomainValidator, keyword: &str, tlds: &[String]) -> Result<Vec<String>> {
    let label = validator.validate_keyword(keyword)?;

    let mut seen = std::collections::HashSet::new();
    let mut domains = Vec::with_capacity(tlds.len());
    for tld in tlds {
        let tld = validator.normalize_tld(tld)?;
        if seen.insert(tld.clone()) {
            domains.push(format!("{}.{}", label, tld));
        }
    }

    if domains.is_empty() {
        return Err(crate::validation_error!("No TLDs given for keyword '{}'", label));
    }

    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_keyword() {
        let validator = DomainValidator::new();
        let tlds = vec![".COM".to_string(), "io".to_string(), "com".to_string()];
        let domains = expand_keyword(&validator, "Rocket", &tlds).unwrap();
        assert_eq!(domains, vec!["rocket.com", "rocket.io"]);

        let tlds = vec!["xn--p1ai".to_string()];
        let domains = expand_keyword(&validator, "rocket", &tlds).unwrap();
        assert_eq!(domains, vec!["rocket.xn--p1ai"]);
    }

    #[test]
    fn test_expand_keyword_rejects_dotted_keyword() {
        let validator = DomainValidator::new();
        let tlds = vec!["com".to_string()];
        assert!(expand_keyword(&validator, "rocket.com", &tlds).is_err());
        assert!(expand_keyword(&validator, "rocket", &[]).is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(get_tld_list("default").unwrap().len(), DEFAULT_SEARCH_TLDS.len());
        assert!(get_tld_list("Startup").is_some());
        assert!(get_tld_list("nope").is_none());
    }
}
