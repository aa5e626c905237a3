//! Single-request HTTP transport used by the prober.
//!
//! A transport issues exactly one GET and never follows redirects; the
//! fetcher inspects `Location` itself. Bodies are exposed as a chunk stream
//! so the caller decides how much to read.

use crate::error::{DomainOracleError, Result};
use crate::probe::guard::SafeResolver;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

/// Body chunks; dropping the stream releases the connection
pub type BodyStream = BoxStream<'static, Result<Vec<u8>>>;

/// Response head plus an unread body
pub struct TransportResponse {
    pub status: u16,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: BodyStream,
}

impl TransportResponse {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("text/html"))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("location", &self.location)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// One outbound GET, no redirect following
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse>;
}

/// reqwest-backed transport with redirects disabled and a public-only resolver
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .dns_resolver(Arc::new(SafeResolver))
            .user_agent(user_agent)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DomainOracleError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .send()
            .await?;

        let status = response.status().as_u16();
        let location = header_string(response.headers(), LOCATION);
        let content_type = header_string(response.headers(), CONTENT_TYPE);

        let body = stream::unfold(Some(response), |state| async move {
            let mut response = state?;
            match response.chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk.to_vec()), Some(response))),
                Ok(None) => None,
                Err(e) => Some((Err(DomainOracleError::from(e)), None)),
            }
        })
        .boxed();

        Ok(TransportResponse {
            status,
            location,
            content_type,
            body,
        })
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
