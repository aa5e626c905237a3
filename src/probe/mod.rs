//! Live HTTP probing of domains.
//!
//! Leaf-first: [`guard`] decides which targets may be touched, [`transport`]
//! issues single requests, [`fetcher`] walks validated redirect chains with
//! a body cap, [`classifier`] recognises parking pages, and [`verifier`]
//! turns all of it into a [`VerificationOutcome`](crate::types::VerificationOutcome).

pub mod classifier;
pub mod fetcher;
pub mod guard;
pub mod transport;
pub mod verifier;

pub use classifier::ContentClassifier;
pub use fetcher::{BoundedFetcher, FetchResult, FetchedPage};
pub use transport::{HttpTransport, ReqwestTransport, TransportResponse};
pub use verifier::{DomainVerifier, HttpVerifier};
