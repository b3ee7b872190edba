//! HTTP client for the CougarPost backend.
//!
//! # Endpoints
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | sign in | `POST {api}/login` | identity JSON |
//! | tax rate | `GET {api}/tax/{address_id}` | `{ "data": <number> }` |
//! | package checkout | `POST {api}/packages` | `{ "success": bool, "message"? }` |
//! | store checkout | `POST {api}/store/orders` | `{ "success": bool, "message"? }` |
//!
//! Every call is a single attempt. Nothing is retried or cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use cougarpost_portal::api::{Credentials, PortalClient};
//!
//! let client = PortalClient::new(&config.api)?;
//! let identity = client.sign_in(&credentials).await?;
//! let receipt = client.submit_package(&payload).await?;
//! ```

mod client;
mod types;

pub use client::PortalClient;
pub use types::{CheckoutReceipt, Credentials};

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Body parsed but did not carry what was expected.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Backend refused a checkout (`success: false`).
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Whether the backend refused the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 401,
            message: "Invalid email or password".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401: Invalid email or password");
        assert!(err.is_unauthorized());

        let err = ApiError::Rejected("Out of stock".to_string());
        assert_eq!(err.to_string(), "Rejected: Out of stock");
        assert!(!err.is_unauthorized());
    }
}
