//! Bounded HTTP fetcher.
//!
//! One GET per hop, redirects followed manually with an explicit hop
//! counter. Every target, including each resolved `Location`, is checked
//! against the SSRF guard before a request is issued. The per-hop timeout
//! covers the request and the body read. Bodies are only read for 2xx
//! `text/html` responses and are capped; bytes past the cap are never
//! buffered.

use crate::error::{DomainOracleError, Result};
use crate::probe::guard;
use crate::probe::transport::{BodyStream, HttpTransport};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// An HTML page read from a 2xx response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub status: u16,
    pub body: Vec<u8>,
    pub truncated: bool,
    pub redirects: usize,
}

/// Outcome of one fetch, including the redirect chain
#[derive(Debug)]
pub enum FetchResult<T> {
    /// 2xx `text/html` page, body possibly truncated
    Page(FetchedPage),
    /// Any other non-redirect response: the host serves something
    Content { final_url: Url, status: u16 },
    /// The redirect inspector claimed a destination; it was not fetched
    Intercepted {
        destination: Url,
        status: u16,
        value: T,
    },
    /// No usable answer; a target refused by the SSRF guard is `BlockedTarget`
    Failed(DomainOracleError),
}

/// Body read up to a byte cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedBody {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

enum Hop {
    Redirect { status: u16, location: Option<String> },
    Content { status: u16 },
    Page { status: u16, body: CappedBody },
}

/// Single-target fetcher with SSRF checks, a redirect bound and a body cap
#[derive(Clone)]
pub struct BoundedFetcher {
    transport: Arc<dyn HttpTransport>,
    hop_timeout: Duration,
    max_redirects: usize,
    max_body_bytes: usize,
}

impl BoundedFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, hop_timeout: Duration) -> Self {
        Self {
            transport,
            hop_timeout,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_limits(mut self, max_redirects: usize, max_body_bytes: usize) -> Self {
        self.max_redirects = max_redirects;
        self.max_body_bytes = max_body_bytes.max(1);
        self
    }

    pub fn hop_timeout(&self) -> Duration {
        self.hop_timeout
    }

    /// Fetch `start`, following validated redirects.
    ///
    /// `on_redirect` sees every validated destination before it is
    /// requested; returning `Some` stops the chain there.
    pub async fn fetch<T, F>(&self, start: &Url, mut on_redirect: F) -> FetchResult<T>
    where
        F: FnMut(&Url) -> Option<T>,
    {
        let mut current = start.clone();
        let mut redirects = 0usize;

        if let Err(reason) = guard::check_url(&current) {
            tracing::debug!(url = %current, reason = %reason, "Refusing blocked target");
            return FetchResult::Failed(DomainOracleError::blocked(current.as_str(), reason.to_string()));
        }

        loop {
            let hop = match timeout(self.hop_timeout, self.hop(&current)).await {
                Ok(Ok(hop)) => hop,
                Ok(Err(e)) => {
                    tracing::debug!(url = %current, error = %e, "Probe hop failed");
                    return FetchResult::Failed(e);
                }
                Err(_) => {
                    tracing::debug!(
                        url = %current,
                        timeout_ms = %self.hop_timeout.as_millis(),
                        "Probe hop timed out"
                    );
                    return FetchResult::Failed(DomainOracleError::timeout(
                        format!("GET {}", current),
                        self.hop_timeout.as_secs(),
                    ));
                }
            };

            match hop {
                Hop::Page { status, body } => {
                    return FetchResult::Page(FetchedPage {
                        final_url: current,
                        status,
                        body: body.bytes,
                        truncated: body.truncated,
                        redirects,
                    });
                }
                Hop::Content { status } => {
                    return FetchResult::Content {
                        final_url: current,
                        status,
                    };
                }
                Hop::Redirect { status, location } => {
                    let Some(location) = location else {
                        return FetchResult::Failed(DomainOracleError::redirect_policy(format!(
                            "{} from {} without Location header",
                            status, current
                        )));
                    };

                    let destination = match current.join(location.trim()) {
                        Ok(url) => url,
                        Err(e) => {
                            return FetchResult::Failed(DomainOracleError::redirect_policy(
                                format!("unresolvable Location '{}': {}", location, e),
                            ));
                        }
                    };

                    if let Err(reason) = guard::check_url(&destination) {
                        tracing::debug!(
                            from = %current,
                            reason = %reason,
                            "Refusing blocked redirect target"
                        );
                        return FetchResult::Failed(DomainOracleError::blocked(
                            destination.as_str(),
                            reason.to_string(),
                        ));
                    }

                    if let Some(value) = on_redirect(&destination) {
                        return FetchResult::Intercepted {
                            destination,
                            status,
                            value,
                        };
                    }

                    redirects += 1;
                    if redirects > self.max_redirects {
                        return FetchResult::Failed(DomainOracleError::redirect_policy(format!(
                            "more than {} redirects starting at {}",
                            self.max_redirects, start
                        )));
                    }

                    tracing::debug!(from = %current, to = %destination, hop = redirects, "Following redirect");
                    current = destination;
                }
            }
        }
    }

    async fn hop(&self, url: &Url) -> Result<Hop> {
        let response = self.transport.get(url).await?;

        if response.is_redirect() {
            return Ok(Hop::Redirect {
                status: response.status,
                location: response.location,
            });
        }

        if response.is_success() && response.is_html() {
            let status = response.status;
            let body = read_capped(response.body, self.max_body_bytes).await?;
            return Ok(Hop::Page { status, body });
        }

        Ok(Hop::Content {
            status: response.status,
        })
    }
}

/// Read chunks until the stream ends or `cap` bytes are held.
///
/// The stream is dropped as soon as the cap is reached.
pub async fn read_capped(mut body: BodyStream, cap: usize) -> Result<CappedBody> {
    let mut bytes = Vec::with_capacity(cap.min(64 * 1024));

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let room = cap - bytes.len();
        if chunk.len() > room {
            bytes.extend_from_slice(&chunk[..room]);
            return Ok(CappedBody {
                bytes,
                truncated: true,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(CappedBody {
        bytes,
        truncated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::mock::{MockRoute, MockTransport};
    use futures::stream;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn fetcher(transport: Arc<MockTransport>) -> BoundedFetcher {
        BoundedFetcher::new(transport, Duration::from_millis(200))
    }

    fn never<T>(_: &Url) -> Option<T> {
        None
    }

    #[tokio::test]
    async fn test_reads_html_page() {
        let transport = Arc::new(
            MockTransport::new().route("https://example.com/", MockRoute::html(200, "<p>hi</p>")),
        );
        let result = fetcher(transport.clone())
            .fetch::<(), _>(&url("https://example.com"), never)
            .await;

        match result {
            FetchResult::Page(page) => {
                assert_eq!(page.status, 200);
                assert_eq!(page.body, b"<p>hi</p>");
                assert!(!page.truncated);
                assert_eq!(page.redirects, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_html_is_content() {
        let transport = Arc::new(MockTransport::new().route(
            "https://example.com/",
            MockRoute::Other(200, "application/json"),
        ));
        let result = fetcher(transport)
            .fetch::<(), _>(&url("https://example.com"), never)
            .await;
        assert!(matches!(result, FetchResult::Content { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_follows_relative_redirect() {
        let transport = Arc::new(
            MockTransport::new()
                .route("https://example.com/", MockRoute::redirect(301, "/home"))
                .route("https://example.com/home", MockRoute::html(200, "home")),
        );
        let result = fetcher(transport.clone())
            .fetch::<(), _>(&url("https://example.com/"), never)
            .await;

        match result {
            FetchResult::Page(page) => {
                assert_eq!(page.final_url.as_str(), "https://example.com/home");
                assert_eq!(page.redirects, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_blocked_redirect_target_never_requested() {
        let transport = Arc::new(
            MockTransport::new()
                .route(
                    "https://example.com/",
                    MockRoute::redirect(302, "http://169.254.169.254/latest/meta-data/"),
                )
                .route("http://169.254.169.254/latest/meta-data/", MockRoute::html(200, "secret")),
        );
        let result = fetcher(transport.clone())
            .fetch::<(), _>(&url("https://example.com/"), never)
            .await;

        match result {
            FetchResult::Failed(DomainOracleError::BlockedTarget { url, .. }) => {
                assert_eq!(url, "http://169.254.169.254/latest/meta-data/");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.calls(), vec!["https://example.com/".to_string()]);
    }

    #[tokio::test]
    async fn test_blocked_start_makes_no_call() {
        let transport = Arc::new(MockTransport::new());
        let result = fetcher(transport.clone())
            .fetch::<(), _>(&url("http://10.0.0.5/"), never)
            .await;
        assert!(matches!(
            result,
            FetchResult::Failed(DomainOracleError::BlockedTarget { .. })
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_redirect_bound() {
        let mut transport = MockTransport::new();
        for i in 0..10 {
            transport = transport.route(
                &format!("https://example.com/{}", i),
                MockRoute::redirect(302, &format!("/{}", i + 1)),
            );
        }
        let transport = Arc::new(transport);
        let result = fetcher(transport.clone())
            .fetch::<(), _>(&url("https://example.com/0"), never)
            .await;

        assert!(matches!(
            result,
            FetchResult::Failed(DomainOracleError::RedirectPolicy { .. })
        ));
        // the start plus five followed hops
        assert_eq!(transport.call_count(), 6);
    }

    #[tokio::test]
    async fn test_missing_location_fails() {
        let transport = Arc::new(
            MockTransport::new().route("https://example.com/", MockRoute::Redirect(302, None)),
        );
        let result = fetcher(transport)
            .fetch::<(), _>(&url("https://example.com/"), never)
            .await;
        assert!(matches!(
            result,
            FetchResult::Failed(DomainOracleError::RedirectPolicy { .. })
        ));
    }

    #[tokio::test]
    async fn test_redirect_inspector_stops_chain() {
        let transport = Arc::new(
            MockTransport::new()
                .route("https://example.com/", MockRoute::redirect(302, "https://sedo.com/search?d=example.com"))
                .route("https://sedo.com/search?d=example.com", MockRoute::html(200, "never")),
        );
        let result = fetcher(transport.clone())
            .fetch(&url("https://example.com/"), |dest| {
                dest.host_str().filter(|h| h.ends_with("sedo.com")).map(|_| 7)
            })
            .await;

        match result {
            FetchResult::Intercepted {
                destination,
                status,
                value,
            } => {
                assert_eq!(destination.host_str(), Some("sedo.com"));
                assert_eq!(status, 302);
                assert_eq!(value, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_hop_timeout() {
        let transport = Arc::new(MockTransport::new().route("https://slow.com/", MockRoute::Hang));
        let result = BoundedFetcher::new(transport, Duration::from_millis(20))
            .fetch::<(), _>(&url("https://slow.com/"), never)
            .await;
        assert!(matches!(
            result,
            FetchResult::Failed(DomainOracleError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_body_truncated_at_cap() {
        let chunk = vec![b'a'; 600 * 1024];
        let transport = Arc::new(MockTransport::new().route(
            "https://big.com/",
            MockRoute::Chunks(vec![chunk.clone(), chunk.clone(), chunk]),
        ));
        let result = fetcher(transport)
            .fetch::<(), _>(&url("https://big.com/"), never)
            .await;

        match result {
            FetchResult::Page(page) => {
                assert_eq!(page.body.len(), DEFAULT_MAX_BODY_BYTES);
                assert!(page.truncated);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_capped_stops_polling() {
        let polled = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = polled.clone();
        let body: BodyStream = stream::iter(0..100)
            .map(move |_| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(vec![0u8; 10])
            })
            .boxed();

        let capped = read_capped(body, 25).await.unwrap();
        assert_eq!(capped.bytes.len(), 25);
        assert!(capped.truncated);
        assert_eq!(polled.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_read_capped_exact_fit() {
        let body: BodyStream = stream::iter(vec![Ok(vec![1u8; 5]), Ok(vec![2u8; 5])]).boxed();
        let capped = read_capped(body, 10).await.unwrap();
        assert_eq!(capped.bytes.len(), 10);
        assert!(!capped.truncated);
    }
}
