//! Domain name validation utilities

use crate::error::{DomainOracleError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("label regex"));

/// Alphabetic TLDs and IDN TLDs in their ASCII (`xn--`) form
static TLD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z]{2,63}|xn--[a-z0-9](?:[a-z0-9-]{0,57}[a-z0-9])?)$").expect("tld regex")
});

/// Domain name validator.
///
/// Everything the resolver accepts passes through here first, so malformed
/// input is rejected before any network call is made.
#[derive(Debug, Clone, Default)]
pub struct DomainValidator;

impl DomainValidator {
    /// Create a new domain validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a fully-qualified domain name
    pub fn validate(&self, domain: &str) -> Result<ValidatedDomain> {
        let domain = self.normalize(domain);

        if domain.is_empty() {
            return Err(DomainOracleError::validation("Domain name cannot be empty"));
        }

        if domain.len() > 253 {
            return Err(DomainOracleError::validation(
                "Domain name too long (max 253 characters)",
            ));
        }

        if domain.contains("://") || domain.contains('/') {
            return Err(crate::validation_error!(
                "'{}' looks like a URL, expected a bare domain name",
                domain
            ));
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 {
            return Err(crate::validation_error!(
                "'{}' must have at least one dot",
                domain
            ));
        }

        let (tld, names) = labels
            .split_last()
            .ok_or_else(|| DomainOracleError::validation("Domain has no labels"))?;

        for label in names {
            self.check_label(label)?;
        }

        if !TLD_RE.is_match(tld) {
            return Err(crate::validation_error!("Invalid TLD '{}'", tld));
        }

        Ok(ValidatedDomain {
            name: names.join("."),
            tld: tld.to_string(),
            full_domain: domain.clone(),
        })
    }

    /// Validate a search keyword: exactly one DNS label
    pub fn validate_keyword(&self, keyword: &str) -> Result<String> {
        let keyword = self.normalize(keyword);
        if keyword.is_empty() {
            return Err(DomainOracleError::validation("Keyword cannot be empty"));
        }
        if keyword.contains('.') {
            return Err(crate::validation_error!(
                "Keyword '{}' must not contain dots",
                keyword
            ));
        }
        self.check_label(&keyword)?;
        Ok(keyword)
    }

    /// Normalize a TLD (lowercase, no leading dot) and validate it
    pub fn normalize_tld(&self, tld: &str) -> Result<String> {
        let tld = self.normalize(tld);
        let tld = tld.trim_start_matches('.');
        if !TLD_RE.is_match(tld) {
            return Err(crate::validation_error!("Invalid TLD '{}'", tld));
        }
        Ok(tld.to_string())
    }

    /// Normalize domain name
    pub fn normalize(&self, domain: &str) -> String {
        domain.trim().trim_end_matches('.').to_lowercase()
    }

    fn check_label(&self, label: &str) -> Result<()> {
        if label.is_empty() {
            return Err(DomainOracleError::validation("Domain label cannot be empty"));
        }
        if label.len() > 63 {
            return Err(DomainOracleError::validation(
                "Domain label too long (max 63 characters)",
            ));
        }
        if !LABEL_RE.is_match(label) {
            return Err(crate::validation_error!(
                "Invalid label '{}': use letters, digits and inner hyphens only",
                label
            ));
        }
        Ok(())
    }
}

/// Domain that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDomain {
    pub name: String,
    pub tld: String,
    pub full_domain: String,
}
