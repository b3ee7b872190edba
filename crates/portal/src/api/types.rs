//! Request and response bodies for the portal backend.

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use cougarpost_core::Email;

/// Sign-in form contents.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub const fn new(email: Email, password: SecretString) -> Self {
        Self { email, password }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// The password is only ever exposed here, on its way into the request body.
impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Credentials", 2)?;
        body.serialize_field("email", &self.email)?;
        body.serialize_field("password", self.password.expose_secret())?;
        body.end()
    }
}

/// Response to a checkout submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Anything else the backend returned (order ids, tracking numbers).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `{ "data": ... }` envelope used by the lookup endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_credentials_body_and_debug() {
        let credentials = Credentials::new(
            Email::parse("pat@cougarpost.example").unwrap(),
            SecretString::from("hunter22"),
        );

        assert_eq!(
            serde_json::to_value(&credentials).unwrap(),
            json!({ "email": "pat@cougarpost.example", "password": "hunter22" })
        );

        let debug = format!("{credentials:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_receipt_keeps_extra_fields() {
        let receipt: CheckoutReceipt = serde_json::from_value(json!({
            "success": true,
            "tracking_number": "CP123456"
        }))
        .unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.message, None);
        assert_eq!(receipt.extra["tracking_number"], json!("CP123456"));
    }
}
