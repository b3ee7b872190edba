//! Backend client implementation.

use std::sync::Arc;

use reqwest::RequestBuilder;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use cougarpost_core::AddressId;

use super::ApiError;
use super::types::{CheckoutReceipt, Credentials, DataEnvelope};
use crate::config::ApiConfig;
use crate::pricing::{CheckoutPayload, StoreOrderPayload, TaxLookupFailure, TaxRateLookup};
use crate::session::Identity;

/// Longest body excerpt written to logs or error messages.
const BODY_EXCERPT_CHARS: usize = 200;

// =============================================================================
// PortalClient
// =============================================================================

/// Client for the CougarPost backend API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct PortalClient {
    inner: Arc<PortalClientInner>,
}

struct PortalClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    /// Create a client for the API rooted at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cougarpost/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(PortalClientInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
            }),
        })
    }

    /// Root URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            if status.is_client_error() {
                warn!(status = %status, message = %message, "Backend rejected request");
            } else {
                tracing::error!(
                    status = %status,
                    body = %excerpt(&body),
                    "Backend returned non-success status"
                );
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Exchange credentials for an identity.
    ///
    /// Does not touch the session; the caller decides whether to
    /// [`login`](crate::session::SessionAuthority::login) with the result.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for refused credentials and other
    /// `ApiError` variants for transport or decoding problems.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, ApiError> {
        let url = self.endpoint("login")?;
        let identity: Identity = self
            .execute(self.inner.client.post(url).json(credentials))
            .await?;
        debug!(account_id = %identity.account_id, role = %identity.role, "Sign-in accepted");
        Ok(identity)
    }

    /// Fetch the tax multiplier for an address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body has no usable
    /// `data` number.
    #[instrument(skip(self))]
    pub async fn fetch_tax_multiplier(&self, address_id: AddressId) -> Result<Decimal, ApiError> {
        let url = self.endpoint(&format!("tax/{address_id}"))?;
        let envelope: DataEnvelope<serde_json::Value> =
            self.execute(self.inner.client.get(url)).await?;
        parse_multiplier(&envelope.data)
    }

    /// Submit a package checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend's message if the
    /// order was not accepted.
    #[instrument(skip_all, fields(account_id = %payload.account_id, total = %payload.total))]
    pub async fn submit_package(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutReceipt, ApiError> {
        let url = self.endpoint("packages")?;
        let receipt = self
            .execute(self.inner.client.post(url).json(payload))
            .await?;
        accepted(receipt)
    }

    /// Submit a store order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend's message if the
    /// order was not accepted.
    #[instrument(skip_all, fields(account_id = %payload.account_id, lines = payload.lines.len()))]
    pub async fn submit_store_order(
        &self,
        payload: &StoreOrderPayload,
    ) -> Result<CheckoutReceipt, ApiError> {
        let url = self.endpoint("store/orders")?;
        let receipt = self
            .execute(self.inner.client.post(url).json(payload))
            .await?;
        accepted(receipt)
    }
}

impl TaxRateLookup for PortalClient {
    async fn tax_multiplier(&self, address_id: AddressId) -> Result<Decimal, TaxLookupFailure> {
        self.fetch_tax_multiplier(address_id)
            .await
            .map_err(|e| TaxLookupFailure::new(e.to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Best human-readable message from an error body.
fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(message)) = fields.get(key) {
                return message.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        excerpt(trimmed)
    }
}

/// Read the tax multiplier from a JSON number or numeric string.
fn parse_multiplier(value: &serde_json::Value) -> Result<Decimal, ApiError> {
    let text = match value {
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::String(text) => text.trim().to_string(),
        other => {
            return Err(ApiError::Malformed(format!(
                "tax multiplier is not a number: {other}"
            )));
        }
    };

    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| ApiError::Malformed(format!("tax multiplier {text:?}: {e}")))
}

/// Turn a `success: false` receipt into an error.
fn accepted(receipt: CheckoutReceipt) -> Result<CheckoutReceipt, ApiError> {
    if receipt.success {
        return Ok(receipt);
    }
    let message = receipt
        .message
        .unwrap_or_else(|| "order was not accepted".to_string());
    warn!(message = %message, "Checkout rejected");
    Err(ApiError::Rejected(message))
}
