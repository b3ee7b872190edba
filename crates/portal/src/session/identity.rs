//! The signed-in actor.

use serde::{Deserialize, Serialize};

use cougarpost_core::{AccountId, AddressId, Email, Role};

/// Who is acting in the portal right now.
///
/// Built from the authentication endpoint's response and persisted as-is.
/// Only `role` is interpreted locally; the profile fields are carried for
/// checkout payloads, and anything else the backend sent is kept in
/// `profile` so it round-trips through storage untouched.
///
/// `account_id` is the one profile field that must be present, since every
/// checkout payload is keyed by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Role used for every access decision.
    pub role: Role,
    /// Account email, when the backend sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// Backend account id.
    #[serde(alias = "accountId", alias = "customer_id")]
    pub account_id: AccountId,
    /// Address on file, used as the tax-rate key.
    #[serde(
        default,
        alias = "addressId",
        skip_serializing_if = "Option::is_none"
    )]
    pub address_id: Option<AddressId>,
    /// Remaining backend fields, passed through verbatim.
    #[serde(flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// An identity with no extra profile fields.
    #[must_use]
    pub fn new(
        role: Role,
        email: Email,
        account_id: AccountId,
        address_id: Option<AddressId>,
    ) -> Self {
        Self {
            role,
            email: Some(email),
            account_id,
            address_id,
            profile: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_login_response_with_extras() {
        let identity: Identity = serde_json::from_value(json!({
            "role": "Clerk",
            "email": "clerk@cougarpost.example",
            "accountId": 31,
            "addressId": 7,
            "first_name": "Casey",
            "branch": { "id": 2 }
        }))
        .unwrap();

        assert_eq!(identity.role, Role::Clerk);
        assert_eq!(identity.account_id, AccountId::new(31));
        assert_eq!(identity.address_id, Some(AddressId::new(7)));
        assert_eq!(identity.profile["first_name"], json!("Casey"));
        assert_eq!(identity.profile["branch"], json!({ "id": 2 }));
    }

    #[test]
    fn test_storage_round_trip_keeps_extras() {
        let mut identity = Identity::new(
            Role::Driver,
            Email::parse("driver@cougarpost.example").unwrap(),
            AccountId::new(5),
            None,
        );
        identity.profile.insert("vehicle".into(), json!("VAN-12"));

        let stored = serde_json::to_string(&identity).unwrap();
        let restored: Identity = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, identity);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<Identity>(json!({
            "role": "customer",
            "email": "a@b.example",
            "account_id": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_email_is_optional() {
        let identity: Identity = serde_json::from_value(json!({
            "role": "Driver",
            "accountId": 54
        }))
        .unwrap();
        assert_eq!(identity.email, None);
        let stored = serde_json::to_value(&identity).unwrap();
        assert!(stored.get("email").is_none());
    }

    #[test]
    fn test_account_id_is_required() {
        let result = serde_json::from_value::<Identity>(json!({
            "role": "Customer",
            "email": "a@b.example"
        }));
        assert!(result.is_err());
    }
}
