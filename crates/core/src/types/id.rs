//! Newtype IDs for backend entity references.
//!
//! The backend hands out plain integers for accounts, addresses and store
//! products. Wrapping each in its own type keeps an address id from being
//! passed where an account id is expected.

/// Define a typed wrapper around a backend `i64` identifier.
///
/// The generated type is `Copy`, serializes transparently as a JSON number,
/// displays as the bare integer and parses from a decimal string.
///
/// # Example
///
/// ```rust
/// # use cougarpost_core::define_id;
/// define_id!(ShipmentId);
///
/// let id: ShipmentId = "42".parse().unwrap();
/// assert_eq!(id.get(), 42);
/// assert_eq!(serde_json::to_string(&id).unwrap(), "42");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw backend identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw backend identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(AccountId);
define_id!(AddressId);
define_id!(ProductId);
