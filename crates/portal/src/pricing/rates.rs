//! Fixed package rate tables.
//!
//! The customer create-package screen and the clerk counter screen each
//! publish their own table. They agree on structure but not on every fee
//! (the clerk counter charges $5.00 for fragile handling where the
//! self-service screen charges $25.00), and each is authoritative for its own
//! flow.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use cougarpost_core::{Role, round2};

use super::PricingError;
use super::line_item::{LineItem, PackageKind, ServiceLevel, TierLabel};

const fn usd(cents: u32) -> Decimal {
    Decimal::from_parts(cents, 0, 0, false, 2)
}

/// Which tier a lookup is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierDimension {
    Weight,
    Size,
}

impl fmt::Display for TierDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weight => "weight",
            Self::Size => "size",
        })
    }
}

/// A complete set of package fees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    /// Name used in logs and errors.
    pub name: &'static str,
    /// Flat price of an envelope.
    pub envelope_fee: Decimal,
    /// Box surcharge by weight label (kilograms).
    pub weight_fees: &'static [(&'static str, Decimal)],
    /// Box surcharge by size label.
    pub size_fees: &'static [(&'static str, Decimal)],
    pub fragile_fee: Decimal,
    pub insured_fee: Decimal,
    pub fast_delivery_fee: Decimal,
    pub regular_fee: Decimal,
    pub express_fee: Decimal,
    pub same_day_fee: Decimal,
}

impl RateTable {
    /// Rates on the customer self-service screen.
    pub const CUSTOMER: Self = Self {
        name: "customer",
        envelope_fee: usd(20_00),
        weight_fees: &[
            ("1", usd(5_00)),
            ("2", usd(8_00)),
            ("5", usd(12_50)),
            ("10", usd(20_00)),
            ("20", usd(35_00)),
        ],
        size_fees: &[
            ("Small (30x20x10 cm)", usd(10_00)),
            ("Medium (50x40x30 cm)", usd(17_50)),
            ("Large (70x50x40 cm)", usd(25_00)),
        ],
        fragile_fee: usd(25_00),
        insured_fee: usd(15_00),
        fast_delivery_fee: usd(10_00),
        regular_fee: usd(0),
        express_fee: usd(15_00),
        same_day_fee: usd(30_00),
    };

    /// Rates on the clerk counter screen.
    pub const CLERK: Self = Self {
        name: "clerk",
        envelope_fee: usd(15_00),
        weight_fees: &[
            ("1", usd(4_00)),
            ("2", usd(7_00)),
            ("5", usd(11_00)),
            ("10", usd(18_00)),
            ("20", usd(32_00)),
        ],
        size_fees: &[
            ("Small (30x20x10 cm)", usd(8_00)),
            ("Medium (50x40x30 cm)", usd(15_00)),
            ("Large (70x50x40 cm)", usd(22_00)),
        ],
        fragile_fee: usd(5_00),
        insured_fee: usd(10_00),
        fast_delivery_fee: usd(7_50),
        regular_fee: usd(0),
        express_fee: usd(12_00),
        same_day_fee: usd(25_00),
    };

    fn tier_fees(&self, dimension: TierDimension) -> &'static [(&'static str, Decimal)] {
        match dimension {
            TierDimension::Weight => self.weight_fees,
            TierDimension::Size => self.size_fees,
        }
    }

    /// Exact-match lookup of a tier surcharge.
    #[must_use]
    pub fn tier_fee(&self, dimension: TierDimension, label: &str) -> Option<Decimal> {
        self.tier_fees(dimension)
            .iter()
            .find(|(key, _)| *key == label)
            .map(|(_, fee)| *fee)
    }

    /// Surcharge for a delivery speed.
    #[must_use]
    pub const fn service_fee(&self, level: ServiceLevel) -> Decimal {
        match level {
            ServiceLevel::Regular => self.regular_fee,
            ServiceLevel::Express => self.express_fee,
            ServiceLevel::SameDay => self.same_day_fee,
        }
    }

    /// Surcharge for an optional tier, zero when absent or unrecognized.
    fn lenient_tier_fee(&self, dimension: TierDimension, label: Option<&TierLabel>) -> Decimal {
        let Some(label) = label else {
            return Decimal::ZERO;
        };
        self.tier_fee(dimension, label.as_str()).unwrap_or_else(|| {
            warn!(
                table = self.name,
                %dimension,
                label = %label,
                "Unrecognized tier label priced at zero"
            );
            Decimal::ZERO
        })
    }

    /// Price a package before tax.
    ///
    /// Never fails: a missing or unrecognized tier contributes nothing.
    /// Use [`RateTable::validate`] first to reject such input. The sum is
    /// rounded to cents once, at the end.
    #[must_use]
    pub fn subtotal(&self, item: &LineItem) -> Decimal {
        let mut sum = match item.kind {
            PackageKind::Envelope => self.envelope_fee,
            PackageKind::Box => {
                self.lenient_tier_fee(TierDimension::Weight, item.weight_tier.as_ref())
                    + self.lenient_tier_fee(TierDimension::Size, item.size_tier.as_ref())
            }
        };

        if item.fragile {
            sum += self.fragile_fee;
        }
        if item.insured {
            sum += self.insured_fee;
        }
        if item.fast_delivery {
            sum += self.fast_delivery_fee;
        }
        sum += self.service_fee(item.service_level);

        round2(sum)
    }

    /// Check the package shape against this table.
    ///
    /// # Errors
    ///
    /// - [`PricingError::MissingTier`] for a box without a weight or size
    /// - [`PricingError::UnexpectedTier`] for an envelope carrying either
    /// - [`PricingError::UnknownTier`] for a label this table does not price
    pub fn validate(&self, item: &LineItem) -> Result<(), PricingError> {
        let tiers = [
            (TierDimension::Weight, item.weight_tier.as_ref()),
            (TierDimension::Size, item.size_tier.as_ref()),
        ];

        for (dimension, label) in tiers {
            match (item.kind, label) {
                (PackageKind::Envelope, None) => {}
                (PackageKind::Envelope, Some(_)) => {
                    return Err(PricingError::UnexpectedTier { dimension });
                }
                (PackageKind::Box, None) => return Err(PricingError::MissingTier { dimension }),
                (PackageKind::Box, Some(label)) => {
                    if self.tier_fee(dimension, label.as_str()).is_none() {
                        return Err(PricingError::UnknownTier {
                            dimension,
                            label: label.to_string(),
                            table: self.name,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Selects one of the published rate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTableKind {
    #[default]
    Customer,
    Clerk,
}

impl RateTableKind {
    /// The table of the screen `role` prices packages on: the clerk counter
    /// for clerks, the self-service screen for everyone else.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Clerk => Self::Clerk,
            _ => Self::Customer,
        }
    }

    /// The table this kind names.
    #[must_use]
    pub const fn table(self) -> &'static RateTable {
        match self {
            Self::Customer => &RateTable::CUSTOMER,
            Self::Clerk => &RateTable::CLERK,
        }
    }
}

impl FromStr for RateTableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "clerk" => Ok(Self::Clerk),
            _ => Err(format!("expected customer or clerk, got {s:?}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MEDIUM: &str = "Medium (50x40x30 cm)";

    #[test]
    fn test_plain_envelope_is_base_fee() {
        let item = LineItem::envelope(ServiceLevel::Regular);
        assert_eq!(RateTable::CUSTOMER.subtotal(&item), usd(20_00));
        assert_eq!(RateTable::CUSTOMER.subtotal(&item).to_string(), "20.00");
    }

    #[test]
    fn test_usd_is_two_place_decimal() {
        assert_eq!(usd(12_50), Decimal::new(1250, 2));
        assert_eq!(usd(7_50).to_string(), "7.50");
        assert_eq!(RateTable::CLERK.fast_delivery_fee.scale(), 2);
    }

    #[test]
    fn test_box_with_everything() {
        let item = LineItem::parcel(5u32, MEDIUM, ServiceLevel::SameDay)
            .fragile(true)
            .insured(true)
            .fast_delivery(true);

        // 12.50 + 17.50 + 25.00 + 15.00 + 10.00 + 30.00
        assert_eq!(RateTable::CUSTOMER.subtotal(&item), usd(110_00));
        // 11.00 + 15.00 + 5.00 + 10.00 + 7.50 + 25.00
        assert_eq!(RateTable::CLERK.subtotal(&item), usd(73_50));
    }

    #[test]
    fn test_tables_disagree_on_fragile() {
        let item = LineItem::envelope(ServiceLevel::Regular).fragile(true);
        assert_eq!(RateTable::CUSTOMER.subtotal(&item), usd(45_00));
        assert_eq!(RateTable::CLERK.subtotal(&item), usd(20_00));
    }

    #[test]
    fn test_subtotal_is_deterministic() {
        let item =
            LineItem::parcel(2u32, "Small (30x20x10 cm)", ServiceLevel::Express).insured(true);
        let first = RateTable::CUSTOMER.subtotal(&item);
        let second = RateTable::CUSTOMER.subtotal(&item);
        assert_eq!(first, second);
        assert_eq!(first.serialize(), second.serialize());
    }

    #[test]
    fn test_unknown_tier_prices_at_zero() {
        let item = LineItem::parcel(7u32, "medium", ServiceLevel::Regular);
        assert_eq!(RateTable::CUSTOMER.subtotal(&item), usd(0));
    }

    #[test]
    fn test_box_missing_size_omits_surcharge() {
        let mut item = LineItem::parcel(10u32, MEDIUM, ServiceLevel::Regular);
        item.size_tier = None;
        assert_eq!(RateTable::CUSTOMER.subtotal(&item), usd(20_00));
    }

    #[test]
    fn test_envelope_ignores_stray_tiers() {
        let mut item = LineItem::envelope(ServiceLevel::Regular);
        item.weight_tier = Some(TierLabel::from(20u32));
        assert_eq!(RateTable::CUSTOMER.subtotal(&item), usd(20_00));
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(
            RateTable::CUSTOMER
                .validate(&LineItem::parcel(1u32, MEDIUM, ServiceLevel::Regular))
                .is_ok()
        );
        assert!(
            RateTable::CUSTOMER
                .validate(&LineItem::envelope(ServiceLevel::Express))
                .is_ok()
        );
    }

    #[test]
    fn test_validate_rejects_unknown_label() {
        let err = RateTable::CUSTOMER
            .validate(&LineItem::parcel(5u32, "Huge", ServiceLevel::Regular))
            .unwrap_err();
        assert!(matches!(
            err,
            PricingError::UnknownTier {
                dimension: TierDimension::Size,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_tier_shape() {
        let mut parcel = LineItem::parcel(5u32, MEDIUM, ServiceLevel::Regular);
        parcel.weight_tier = None;
        assert!(matches!(
            RateTable::CUSTOMER.validate(&parcel),
            Err(PricingError::MissingTier {
                dimension: TierDimension::Weight
            })
        ));

        let mut envelope = LineItem::envelope(ServiceLevel::Regular);
        envelope.size_tier = Some(TierLabel::from(MEDIUM));
        assert!(matches!(
            RateTable::CUSTOMER.validate(&envelope),
            Err(PricingError::UnexpectedTier {
                dimension: TierDimension::Size
            })
        ));
    }

    #[test]
    fn test_rate_table_kind_parse() {
        assert_eq!("clerk".parse::<RateTableKind>(), Ok(RateTableKind::Clerk));
        assert_eq!(RateTableKind::default().table().name, "customer");
        assert!("Clerk".parse::<RateTableKind>().is_err());
    }

    #[test]
    fn test_rate_table_kind_for_role() {
        assert_eq!(RateTableKind::for_role(Role::Clerk), RateTableKind::Clerk);
        assert_eq!(RateTableKind::for_role(Role::Customer), RateTableKind::Customer);
    }
}
