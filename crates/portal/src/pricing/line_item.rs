//! Package selections as entered on the create-package screens.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Envelope or box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageKind {
    Envelope,
    Box,
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "envelope" => Ok(Self::Envelope),
            "box" => Ok(Self::Box),
            _ => Err(format!("unknown package kind {s:?} (expected envelope or box)")),
        }
    }
}

/// Delivery speed, each carrying its own surcharge in the rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceLevel {
    #[serde(rename = "Regular Delivery")]
    Regular,
    #[serde(rename = "Express Delivery")]
    Express,
    #[serde(rename = "Same-Day Delivery")]
    SameDay,
}

impl ServiceLevel {
    /// Label shown on the form and sent to the backend.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Regular => "Regular Delivery",
            Self::Express => "Express Delivery",
            Self::SameDay => "Same-Day Delivery",
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceLevel {
    type Err = String;

    /// Accepts the form label or a short name (`regular`, `express`,
    /// `same-day`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Regular Delivery" | "regular" => Ok(Self::Regular),
            "Express Delivery" | "express" => Ok(Self::Express),
            "Same-Day Delivery" | "same-day" | "same_day" => Ok(Self::SameDay),
            _ => Err(format!(
                "unknown service level {s:?} (expected regular, express or same-day)"
            )),
        }
    }
}

/// A weight or size tier key, matched exactly against the rate table.
///
/// Weight tiers arrive from forms as numbers (`5`) and size tiers as text
/// (`"Medium (50x40x30 cm)"`); both are kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TierLabel(String);

impl TierLabel {
    /// Wrap a label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TierLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<u32> for TierLabel {
    fn from(kg: u32) -> Self {
        Self(kg.to_string())
    }
}

impl<'de> Deserialize<'de> for TierLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

/// One package to be priced.
///
/// Boxes need both tiers and envelopes take neither; that shape is checked
/// by [`RateTable::validate`](super::RateTable::validate), not at
/// construction, because forms fill fields in one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: PackageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_tier: Option<TierLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_tier: Option<TierLabel>,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub insured: bool,
    #[serde(default)]
    pub fast_delivery: bool,
    pub service_level: ServiceLevel,
}

impl LineItem {
    /// An envelope with no add-ons.
    #[must_use]
    pub const fn envelope(service_level: ServiceLevel) -> Self {
        Self {
            kind: PackageKind::Envelope,
            weight_tier: None,
            size_tier: None,
            fragile: false,
            insured: false,
            fast_delivery: false,
            service_level,
        }
    }

    /// A box with no add-ons.
    #[must_use]
    pub fn parcel(
        weight_tier: impl Into<TierLabel>,
        size_tier: impl Into<TierLabel>,
        service_level: ServiceLevel,
    ) -> Self {
        Self {
            kind: PackageKind::Box,
            weight_tier: Some(weight_tier.into()),
            size_tier: Some(size_tier.into()),
            fragile: false,
            insured: false,
            fast_delivery: false,
            service_level,
        }
    }

    #[must_use]
    pub const fn fragile(mut self, on: bool) -> Self {
        self.fragile = on;
        self
    }

    #[must_use]
    pub const fn insured(mut self, on: bool) -> Self {
        self.insured = on;
        self
    }

    #[must_use]
    pub const fn fast_delivery(mut self, on: bool) -> Self {
        self.fast_delivery = on;
        self
    }
}
