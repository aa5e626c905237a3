//! Integration tests for domain-oracle
//!
//! Everything runs against in-memory doubles; no test touches the network.

use async_trait::async_trait;
use domain_oracle::probe::transport::{HttpTransport, TransportResponse};
use domain_oracle::{
    AftermarketListing, AftermarketProvider, Broker, DomainOracleError, DomainStatus, DomainVerifier,
    HttpVerifier, ListingFilters, ListingType, LookupOptions, PricingProvider, ProviderRegistry,
    RegistrarPrice, RegistryLookup, RegistryRecord, ResolverConfig, Result, StatusResolver,
    VerificationMethod, VerificationStatus,
};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Serves canned pages keyed by URL and counts every request
#[derive(Default)]
struct CannedWeb {
    pages: HashMap<String, (u16, Option<String>, String)>,
    requests: AtomicUsize,
}

impl CannedWeb {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), (200, None, html.to_string()));
        self
    }

    fn redirect(mut self, url: &str, location: &str) -> Self {
        self.pages
            .insert(url.to_string(), (302, Some(location.to_string()), String::new()));
        self
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for CannedWeb {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (status, location, body) = self
            .pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| DomainOracleError::network("connection refused", None, Some(url.to_string())))?;

        Ok(TransportResponse {
            status,
            location,
            content_type: Some("text/html".to_string()),
            body: stream::iter(vec![Ok(body.into_bytes())]).boxed(),
        })
    }
}

struct TableRegistry(HashMap<String, RegistryRecord>);

impl TableRegistry {
    fn new(records: Vec<RegistryRecord>) -> Self {
        Self(records.into_iter().map(|r| (r.domain.clone(), r)).collect())
    }
}

#[async_trait]
impl RegistryLookup for TableRegistry {
    async fn check_domain(&self, domain: &str) -> RegistryRecord {
        self.0
            .get(domain)
            .cloned()
            .unwrap_or_else(|| RegistryRecord::no_answer(domain, "registry unreachable"))
    }
}

struct FlatPricing(&'static str, f64);

#[async_trait]
impl PricingProvider for FlatPricing {
    fn name(&self) -> &str {
        self.0
    }

    async fn get_tld_pricing(&self, _tld: &str) -> Result<Vec<RegistrarPrice>> {
        Ok(vec![RegistrarPrice {
            registrar: self.0.to_string(),
            registration: Some(self.1),
            renewal: Some(self.1 + 2.0),
            transfer: None,
            currency: "USD".to_string(),
        }])
    }
}

struct Marketplace(Vec<AftermarketListing>);

#[async_trait]
impl AftermarketProvider for Marketplace {
    fn name(&self) -> &str {
        "marketplace"
    }

    async fn get_domain_listings(&self, domain: &str) -> Result<Vec<AftermarketListing>> {
        Ok(self.0.iter().filter(|l| l.domain == domain).cloned().collect())
    }

    async fn search_listings(&self, query: &str, _filters: &ListingFilters) -> Result<Vec<AftermarketListing>> {
        Ok(self.0.iter().filter(|l| l.domain.contains(query)).cloned().collect())
    }
}

fn offer(domain: &str, price: f64) -> AftermarketListing {
    AftermarketListing {
        domain: domain.to_string(),
        provider: "marketplace".to_string(),
        price: Some(price),
        currency: "USD".to_string(),
        listing_type: ListingType::MakeOffer,
        url: Some(format!("https://marketplace.example/{}", domain)),
        ends_at: None,
    }
}

fn test_config() -> ResolverConfig {
    ResolverConfig::default()
        .with_http_timeout(Duration::from_secs(2))
        .with_probe_group(5, Duration::from_millis(5))
}

const PARKED_PAGE: &str = "<html><body><h1>This domain is parked</h1><p>Related searches</p>\
                           <p>Sponsored listings</p></body></html>";
const LIVE_PAGE: &str = "<html><body><h1>Welcome to the Example Bakery</h1></body></html>";

fn resolver(web: Arc<CannedWeb>, registry: TableRegistry, providers: ProviderRegistry) -> StatusResolver {
    let config = test_config();
    let verifier = Arc::new(HttpVerifier::with_transport(web, &config));
    StatusResolver::with_components(config, Arc::new(registry), Arc::new(providers), verifier)
}

#[tokio::test]
async fn test_full_pipeline_parked_domain() {
    let web = Arc::new(CannedWeb::default().page("https://idle-name.com/", PARKED_PAGE));
    let providers = ProviderRegistry::new();
    providers.register_pricing(Arc::new(FlatPricing("cheap", 8.5)));
    providers.register_pricing(Arc::new(FlatPricing("pricey", 14.0)));
    let r = resolver(
        web.clone(),
        TableRegistry::new(vec![RegistryRecord::registered("idle-name.com", Some("Some Registrar".into()))]),
        providers,
    );

    let result = r.resolve_domain("idle-name.com", LookupOptions::all()).await.unwrap();

    assert_eq!(result.status, DomainStatus::Parked);
    assert_eq!(result.verification_method, VerificationMethod::HttpProbe);
    assert_eq!(result.registrar.as_deref(), Some("Some Registrar"));
    assert_eq!(result.pricing.as_ref().unwrap().cheapest.as_ref().unwrap().registrar, "cheap");
    assert!(result.parking.as_ref().unwrap().is_parked());
    assert_eq!(web.requests(), 1);
}

#[tokio::test]
async fn test_registry_available_but_site_live() {
    let web = Arc::new(CannedWeb::default().page("https://racing.dev/", LIVE_PAGE));
    let r = resolver(
        web,
        TableRegistry::new(vec![RegistryRecord::available("racing.dev")]),
        ProviderRegistry::new(),
    );

    let result = r.resolve_domain("racing.dev", LookupOptions::all()).await.unwrap();
    assert_eq!(result.status, DomainStatus::Taken);
}

#[tokio::test]
async fn test_aftermarket_listing_with_unreachable_site() {
    let providers = ProviderRegistry::new();
    providers.register_aftermarket(Arc::new(Marketplace(vec![offer("premium-word.com", 25_000.0)])));
    let r = resolver(
        Arc::new(CannedWeb::default()),
        TableRegistry::new(vec![RegistryRecord::registered("premium-word.com", None)]),
        providers,
    );

    let result = r.resolve_domain("premium-word.com", LookupOptions::all()).await.unwrap();
    assert_eq!(result.status, DomainStatus::ForSale);
    assert_eq!(result.aftermarket.unwrap()[0].price, Some(25_000.0));
}

#[tokio::test]
async fn test_broker_redirect_short_circuits() {
    let web = Arc::new(
        CannedWeb::default()
            .redirect("https://sale-me.com/", "https://www.afternic.com/forsale/sale-me.com")
            .page("https://www.afternic.com/forsale/sale-me.com", LIVE_PAGE),
    );
    let verifier = HttpVerifier::with_transport(web.clone(), &test_config());

    let outcome = verifier.verify("sale-me.com").await;
    assert_eq!(outcome.status(), VerificationStatus::ForSale);
    assert_eq!(outcome.parking_evidence().unwrap().broker(), Some(Broker::Afternic));
    assert_eq!(web.requests(), 1);
}

#[tokio::test]
async fn test_internal_targets_never_requested() {
    let web = Arc::new(
        CannedWeb::default()
            .redirect("https://public.com/", "http://10.0.0.5/admin")
            .redirect("http://public.com/", "http://metadata.google.internal/computeMetadata/v1/"),
    );
    let verifier = HttpVerifier::with_transport(web.clone(), &test_config());

    for host in ["localhost", "127.0.0.1", "192.168.0.1", "169.254.169.254", "api.internal"] {
        assert!(verifier.verify(host).await.is_unknown());
    }
    assert_eq!(web.requests(), 0);

    assert!(verifier.verify("public.com").await.is_unknown());
    // only the two start URLs, never the redirect targets
    assert_eq!(web.requests(), 2);
}

#[tokio::test]
async fn test_batch_counts_partition_results() {
    let web = Arc::new(
        CannedWeb::default()
            .page("https://shop.com/", LIVE_PAGE)
            .page("https://lander.com/", PARKED_PAGE),
    );
    let r = resolver(
        web,
        TableRegistry::new(vec![
            RegistryRecord::available("free-name.com"),
            RegistryRecord::registered("shop.com", None),
            RegistryRecord::registered("lander.com", None),
        ]),
        ProviderRegistry::new(),
    );

    let domains: Vec<String> = ["free-name.com", "shop.com", "lander.com", "ghost.com", "-bad-.com"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let batch = r.resolve_batch(&domains, LookupOptions::all()).await.unwrap();
    let counts = batch.counts();

    assert_eq!(counts.total, 5);
    assert_eq!(counts.available, 1);
    assert_eq!(counts.taken, 1);
    assert_eq!(counts.parked, 1);
    assert_eq!(counts.unknown, 2);
    assert_eq!(
        counts.available + counts.taken + counts.parked + counts.for_sale + counts.premium + counts.unknown,
        counts.total
    );
    let order: Vec<&str> = batch.results().iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(order, vec!["free-name.com", "shop.com", "lander.com", "ghost.com", "-bad-.com"]);
}

#[tokio::test]
async fn test_keyword_search_and_json_shape() {
    let r = resolver(
        Arc::new(CannedWeb::default()),
        TableRegistry::new(vec![
            RegistryRecord::available("orbit.io"),
            RegistryRecord::registered("orbit.com", None),
        ]),
        ProviderRegistry::new(),
    );

    let tlds = vec!["com".to_string(), "io".to_string()];
    let batch = r.search_keyword("Orbit", &tlds, LookupOptions::registry_only()).await.unwrap();
    assert_eq!(batch.counts().available, 1);
    assert_eq!(batch.counts().taken, 1);

    let json = serde_json::to_value(&batch).unwrap();
    assert_eq!(json["counts"]["total"], 2);
    assert_eq!(json["results"][0]["domain"], "orbit.com");
    assert_eq!(json["results"][0]["status"], "taken");
    assert_eq!(json["results"][1]["verification_method"], "registry");
}

#[tokio::test]
async fn test_aftermarket_search_merges_providers() {
    let providers = ProviderRegistry::new();
    providers.register_aftermarket(Arc::new(Marketplace(vec![
        offer("nova.com", 3000.0),
        offer("nova.com", 2500.0),
        offer("novalabs.io", 800.0),
    ])));
    let r = resolver(Arc::new(CannedWeb::default()), TableRegistry::new(Vec::new()), providers);

    let listings = r.search_aftermarket("nova", &ListingFilters::default()).await.unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].price, Some(2500.0));

    let filters = ListingFilters {
        tlds: vec!["io".to_string()],
        limit: Some(5),
        ..Default::default()
    };
    let listings = r.search_aftermarket("nova", &filters).await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].domain, "novalabs.io");
}
