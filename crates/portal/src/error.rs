//! Unified error handling with Sentry integration.
//!
//! Provides a unified `PortalError` for front ends. Every variant has a
//! [`user_message`](PortalError::user_message) that is safe to show; the
//! `Display` form carries the internal detail and belongs in logs.

use thiserror::Error;

use cougarpost_core::EmailError;

use crate::access::Screen;
use crate::api::ApiError;
use crate::config::ConfigError;
use crate::pricing::{PricingError, QuoteError, TaxLookupFailure};

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Package selection does not fit the rate table.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Tax rate could not be resolved.
    #[error("Tax lookup failed: {}", .0.reason())]
    TaxLookup(#[from] TaxLookupFailure),

    /// Email address failed validation.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// Operation needs a signed-in identity.
    #[error("Not signed in")]
    NotSignedIn,

    /// Signed-in role may not use this screen.
    #[error("Forbidden: {}", .screen.title())]
    Forbidden { screen: Screen },

    /// Identity has no address, so tax cannot be looked up.
    #[error("Identity has no address id")]
    MissingAddress,

    /// Bad input from the user.
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl PortalError {
    /// Whether this is a fault worth reporting rather than a user mistake.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(ApiError::Status { status, .. }) => *status >= 500,
            Self::Api(ApiError::Rejected(_)) => false,
            Self::Api(_) => true,
            _ => false,
        }
    }

    /// Message for the person at the keyboard.
    ///
    /// Transport and decoding details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.to_string(),
            Self::Api(err) if err.is_unauthorized() => "Invalid email or password".to_string(),
            Self::Api(ApiError::Rejected(message)) => message.clone(),
            Self::Api(ApiError::Status { status, message }) if *status < 500 => message.clone(),
            Self::Api(_) => "CougarPost service is unavailable, please try again".to_string(),
            Self::Pricing(err) => err.to_string(),
            Self::TaxLookup(err) => err.to_string(),
            Self::Email(_) => "Invalid email address".to_string(),
            Self::NotSignedIn => "Please log in first".to_string(),
            Self::Forbidden { screen } => {
                format!("Your account does not have access to {}", screen.title())
            }
            Self::MissingAddress => {
                "Your account has no address on file, so tax cannot be calculated".to_string()
            }
            Self::Invalid(message) => message.clone(),
        }
    }
}

impl From<QuoteError> for PortalError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Pricing(err) => Self::Pricing(err),
            QuoteError::TaxLookup(err) => Self::TaxLookup(err),
        }
    }
}

/// Result type alias for `PortalError`.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Set the Sentry user context from a user ID.
///
/// Called on sign-in to associate errors with the account.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("pricing", "Quoted package", Some(&[("total", "48.60")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    sentry::add_breadcrumb(breadcrumb(category, message, data));
}

fn breadcrumb(
    category: &str,
    message: &str,
    data: Option<&[(&str, &str)]>,
) -> sentry::Breadcrumb {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    breadcrumb
}
