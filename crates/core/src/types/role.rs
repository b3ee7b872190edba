//! Portal actor roles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of actor signed in to the portal.
///
/// The backend spells roles in `PascalCase` (`"Customer"`, `"Admin"`, ...).
/// Matching is exact: `"admin"` is not a role, and a record carrying it fails
/// to deserialize instead of silently granting nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Members of the public shipping packages and shopping the store.
    Customer,
    /// Full access, including staff management.
    Admin,
    /// Store and staff oversight, reports.
    Manager,
    /// Delivers packages and updates their status.
    Driver,
    /// Counter staff creating packages and updating stock.
    Clerk,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Self; 5] = [
        Self::Customer,
        Self::Admin,
        Self::Manager,
        Self::Driver,
        Self::Clerk,
    ];

    /// The backend spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Driver => "Driver",
            Self::Clerk => "Clerk",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not exactly one of the backend role names.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role {0:?} (expected one of Customer, Admin, Manager, Driver, Clerk)")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_exact_match() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert!("admin".parse::<Role>().is_err());
        assert!("CLERK".parse::<Role>().is_err());
        assert!(" Driver".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_backend_spelling() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"Manager\"");
        assert!(serde_json::from_str::<Role>("\"manager\"").is_err());
    }
}
