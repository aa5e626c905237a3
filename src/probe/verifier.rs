//! HTTP verification of live domain state

use crate::error::Result;
use crate::probe::classifier::ContentClassifier;
use crate::probe::fetcher::{BoundedFetcher, FetchResult};
use crate::probe::guard;
use crate::probe::transport::{HttpTransport, ReqwestTransport};
use crate::types::{ParkingEvidence, ResolverConfig, VerificationOutcome};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Probes a domain's live web presence
#[async_trait]
pub trait DomainVerifier: Send + Sync {
    /// Probe one domain. Never fails: anything untrustworthy is `unknown`.
    async fn verify(&self, domain: &str) -> VerificationOutcome;

    /// Probe many domains; the map holds exactly one entry per distinct input
    async fn verify_bulk(&self, domains: &[String]) -> HashMap<String, VerificationOutcome>;
}

/// Verifier built on the bounded fetcher and the content classifier
pub struct HttpVerifier {
    fetcher: BoundedFetcher,
    classifier: ContentClassifier,
    group_size: usize,
    group_pause: Duration,
}

impl HttpVerifier {
    /// Verifier with a real reqwest transport
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> Self {
        let fetcher = BoundedFetcher::new(transport, config.http_timeout)
            .with_limits(config.max_redirects, config.max_body_bytes);

        Self {
            fetcher,
            classifier: ContentClassifier::new(),
            group_size: config.probe_group_size.max(1),
            group_pause: config.probe_group_pause,
        }
    }

    /// One scheme attempt against `url`
    async fn attempt(&self, url: &Url) -> VerificationOutcome {
        let classifier = &self.classifier;
        let result = self
            .fetcher
            .fetch(url, |destination| {
                let evidence: ParkingEvidence = classifier.classify_url(destination);
                evidence.is_parked().then_some(evidence)
            })
            .await;

        match result {
            FetchResult::Intercepted {
                destination,
                status,
                value,
            } => VerificationOutcome::from_evidence(value, Some(status), Some(destination.to_string())),
            FetchResult::Page(page) => {
                if page.truncated {
                    tracing::debug!(url = %page.final_url, "Classifying truncated body");
                }
                let evidence = classifier.classify(&page.body, &page.final_url);
                let final_url = (page.redirects > 0).then(|| page.final_url.to_string());
                VerificationOutcome::from_evidence(evidence, Some(page.status), final_url)
            }
            FetchResult::Content { final_url, status } => {
                let redirected = (final_url != *url).then(|| final_url.to_string());
                VerificationOutcome::taken(Some(status), redirected)
            }
            FetchResult::Failed(e) if e.degrades_to_unknown() => {
                tracing::debug!(url = %url, error = %e, "Probe attempt gave no signal");
                VerificationOutcome::unknown()
            }
            FetchResult::Failed(e) => {
                tracing::warn!(url = %url, error = %e, "Probe attempt failed");
                VerificationOutcome::unknown()
            }
        }
    }
}

/// Normalized host and its https/http start URLs, or `None` if the target is refused
fn start_urls(domain: &str) -> Option<(Url, Url)> {
    let host = domain.trim().trim_end_matches('.').to_lowercase();
    if let Err(reason) = guard::check_host(&host) {
        tracing::debug!(domain = %domain, reason = %reason, "Refusing to probe blocked host");
        return None;
    }

    let https = Url::parse(&format!("https://{}/", host)).ok()?;
    let http = Url::parse(&format!("http://{}/", host)).ok()?;
    // numeric forms only normalize to an IP once parsed
    if guard::is_blocked_url(&https) {
        tracing::debug!(domain = %domain, "Refusing to probe blocked address");
        return None;
    }
    Some((https, http))
}

#[async_trait]
impl DomainVerifier for HttpVerifier {
    async fn verify(&self, domain: &str) -> VerificationOutcome {
        let start = Instant::now();
        let Some((https, http)) = start_urls(domain) else {
            return VerificationOutcome::unknown();
        };

        let mut outcome = self.attempt(&https).await;
        if outcome.is_unknown() {
            tracing::debug!(domain = %domain, "HTTPS gave no signal, trying HTTP");
            outcome = self.attempt(&http).await;
        }

        tracing::debug!(
            domain = %domain,
            status = %outcome.status(),
            duration_ms = %start.elapsed().as_millis(),
            "Domain probe completed"
        );
        outcome
    }

    async fn verify_bulk(&self, domains: &[String]) -> HashMap<String, VerificationOutcome> {
        let batch_start = Instant::now();
        let mut unique: Vec<&String> = Vec::with_capacity(domains.len());
        for domain in domains {
            if !unique.contains(&domain) {
                unique.push(domain);
            }
        }

        let mut results = HashMap::with_capacity(unique.len());
        let groups: Vec<&[&String]> = unique.chunks(self.group_size).collect();
        let group_count = groups.len();

        for (index, group) in groups.into_iter().enumerate() {
            let outcomes = join_all(group.iter().map(|domain| self.verify(domain))).await;
            for (domain, outcome) in group.iter().zip(outcomes) {
                results.insert((*domain).clone(), outcome);
            }

            if index + 1 < group_count && !self.group_pause.is_zero() {
                tokio::time::sleep(self.group_pause).await;
            }
        }

        tracing::info!(
            domains = %results.len(),
            groups = %group_count,
            batch_duration_ms = %batch_start.elapsed().as_millis(),
            "Bulk probe completed"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::mock::{MockRoute, MockTransport};
    use crate::types::{Broker, VerificationStatus};

    fn config() -> ResolverConfig {
        ResolverConfig::default()
            .with_http_timeout(Duration::from_secs(2))
            .with_probe_group(5, Duration::from_millis(10))
    }

    fn verifier(transport: Arc<MockTransport>) -> HttpVerifier {
        HttpVerifier::with_transport(transport, &config())
    }

    const PARKED: &str = "<html><body>This domain is for sale! Make an offer.</body></html>";
    const REAL_SITE: &str = "<html><body><h1>Acme Widgets</h1><p>We make widgets.</p></body></html>";

    #[tokio::test]
    async fn test_live_site_is_taken() {
        let transport = Arc::new(MockTransport::new().route("https://acme.com/", MockRoute::html(200, REAL_SITE)));
        let outcome = verifier(transport.clone()).verify("acme.com").await;

        assert_eq!(outcome.status(), VerificationStatus::Taken);
        assert_eq!(outcome.http_status_code(), Some(200));
        assert!(outcome.parking_evidence().is_none());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_parked_page() {
        let transport = Arc::new(MockTransport::new().route("https://idle.com/", MockRoute::html(200, PARKED)));
        let outcome = verifier(transport).verify("idle.com").await;

        assert_eq!(outcome.status(), VerificationStatus::Parked);
        assert!(outcome.parking_evidence().is_some());
    }

    #[tokio::test]
    async fn test_blocked_hosts_make_no_calls() {
        let transport = Arc::new(MockTransport::new());
        let v = verifier(transport.clone());

        for host in [
            "localhost",
            "127.0.0.1",
            "10.0.0.8",
            "172.20.1.1",
            "192.168.1.1",
            "169.254.169.254",
            "metadata.google.internal",
            "db.corp.internal",
            "2130706433",
        ] {
            let outcome = v.verify(host).await;
            assert!(outcome.is_unknown(), "{} should be unknown", host);
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_http() {
        let transport = Arc::new(MockTransport::new().route("http://legacy.com/", MockRoute::html(200, REAL_SITE)));
        let outcome = verifier(transport.clone()).verify("legacy.com").await;

        assert_eq!(outcome.status(), VerificationStatus::Taken);
        assert_eq!(
            transport.calls(),
            vec!["https://legacy.com/".to_string(), "http://legacy.com/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_both_schemes_failing_is_unknown() {
        let transport = Arc::new(MockTransport::new());
        let outcome = verifier(transport.clone()).verify("down.com").await;
        assert!(outcome.is_unknown());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_broker_redirect_is_for_sale_without_fetching() {
        let transport = Arc::new(
            MockTransport::new()
                .route("https://forsale.com/", MockRoute::redirect(302, "https://sedo.com/search/details/?domain=forsale.com"))
                .route("https://sedo.com/search/details/?domain=forsale.com", MockRoute::html(200, REAL_SITE)),
        );
        let outcome = verifier(transport.clone()).verify("forsale.com").await;

        assert_eq!(outcome.status(), VerificationStatus::ForSale);
        assert_eq!(outcome.parking_evidence().and_then(|e| e.broker()), Some(Broker::Sedo));
        assert_eq!(outcome.http_status_code(), Some(302));
        assert!(outcome.final_redirect_url().unwrap().starts_with("https://sedo.com/"));
        assert_eq!(transport.calls(), vec!["https://forsale.com/".to_string()]);
    }

    #[tokio::test]
    async fn test_redirect_to_internal_target_is_unknown() {
        let transport = Arc::new(
            MockTransport::new()
                .route("https://sneaky.com/", MockRoute::redirect(301, "http://169.254.169.254/latest/meta-data"))
                .route("http://sneaky.com/", MockRoute::redirect(301, "http://localhost/admin")),
        );
        let outcome = verifier(transport.clone()).verify("sneaky.com").await;

        assert!(outcome.is_unknown());
        assert_eq!(
            transport.calls(),
            vec!["https://sneaky.com/".to_string(), "http://sneaky.com/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_non_html_response_is_taken() {
        let transport = Arc::new(MockTransport::new().route("https://api.com/", MockRoute::Other(200, "application/json")));
        let outcome = verifier(transport).verify("api.com").await;
        assert_eq!(outcome.status(), VerificationStatus::Taken);
    }

    #[tokio::test]
    async fn test_bulk_respects_group_size() {
        let domains: Vec<String> = (0..12).map(|i| format!("site{}.com", i)).collect();
        let mut mock = MockTransport::new().with_delay(Duration::from_millis(20));
        for d in &domains {
            mock = mock.route(&format!("https://{}/", d), MockRoute::html(200, REAL_SITE));
        }
        let transport = Arc::new(mock);

        let results = verifier(transport.clone()).verify_bulk(&domains).await;

        assert_eq!(results.len(), 12);
        assert!(domains.iter().all(|d| results.contains_key(d)));
        assert!(transport.max_in_flight() <= 5);
        assert!(transport.max_in_flight() >= 2);
        assert_eq!(transport.call_count(), 12);
    }

    #[tokio::test]
    async fn test_bulk_mixed_outcomes_and_duplicates() {
        let transport = Arc::new(
            MockTransport::new()
                .route("https://a.com/", MockRoute::html(200, PARKED))
                .route("https://b.com/", MockRoute::html(200, REAL_SITE)),
        );
        let domains = vec![
            "a.com".to_string(),
            "b.com".to_string(),
            "localhost".to_string(),
            "a.com".to_string(),
        ];
        let results = verifier(transport.clone()).verify_bulk(&domains).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results["a.com"].status(), VerificationStatus::Parked);
        assert_eq!(results["b.com"].status(), VerificationStatus::Taken);
        assert!(results["localhost"].is_unknown());
        assert_eq!(transport.call_count(), 2);
    }
}
