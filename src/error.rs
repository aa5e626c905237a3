//! Error handling for domain-oracle

use thiserror::Error;

/// Main error type for domain-oracle
#[derive(Error, Debug, Clone)]
pub enum DomainOracleError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Blocked target {url}: {reason}")]
    BlockedTarget { url: String, reason: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        url: Option<String>,
    },

    #[error("Timeout error: {operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("Redirect policy violation: {message}")]
    RedirectPolicy { message: String },

    #[error("Upstream error ({provider}): {message}")]
    Upstream {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        content: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainOracleError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a blocked-target error
    pub fn blocked(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BlockedTarget {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error
    pub fn network(
        message: impl Into<String>,
        status_code: Option<u16>,
        url: Option<String>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            status_code,
            url,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs,
        }
    }

    /// Create a redirect policy error
    pub fn redirect_policy(message: impl Into<String>) -> Self {
        Self::RedirectPolicy {
            message: message.into(),
        }
    }

    /// Create an upstream provider error
    pub fn upstream(
        provider: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, content: Option<String>) -> Self {
        Self::Parse {
            message: message.into(),
            content,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error was caused by caller input rather than the network
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether this error is absorbed into an `unknown` status instead of
    /// being reported to the caller
    pub fn degrades_to_unknown(&self) -> bool {
        matches!(
            self,
            Self::BlockedTarget { .. }
                | Self::Network { .. }
                | Self::Timeout { .. }
                | Self::RedirectPolicy { .. }
                | Self::Parse { .. }
        )
    }
}

/// Convert from common error types
impl From<reqwest::Error> for DomainOracleError {
    fn from(err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let url = err.url().map(|u| u.to_string());

        if err.is_timeout() {
            Self::timeout("HTTP request", 0)
        } else if err.is_connect() {
            Self::network("Connection failed", status_code, url)
        } else if err.is_request() {
            Self::network("Request failed", status_code, url)
        } else {
            Self::network(err.to_string(), status_code, url)
        }
    }
}

impl From<serde_json::Error> for DomainOracleError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string(), None)
    }
}

impl From<url::ParseError> for DomainOracleError {
    fn from(err: url::ParseError) -> Self {
        Self::parse(format!("Invalid URL: {}", err), None)
    }
}

impl From<std::io::Error> for DomainOracleError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for DomainOracleError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::timeout("Operation", 0)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DomainOracleError>;

/// Helper macros for common error patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::DomainOracleError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DomainOracleError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::DomainOracleError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DomainOracleError::validation(format!($fmt, $($arg)*))
    };
}
