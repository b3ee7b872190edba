//! Transport-ready checkout payloads.
//!
//! Building a payload is pure assembly from values already computed: the
//! line item or cart, its [`PriceQuote`], and the signed-in [`Identity`].
//! Submission is the API client's job.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cougarpost_core::{AccountId, AddressId};

use super::PriceQuote;
use super::cart::CartLine;
use super::line_item::LineItem;
use crate::session::Identity;

/// The UTC calendar date right now.
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Body of a package checkout submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPayload {
    #[serde(flatten)]
    pub item: LineItem,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    /// Date the order was placed (`YYYY-MM-DD`).
    pub created_on: NaiveDate,
}

impl CheckoutPayload {
    /// Assemble a payload dated today (UTC).
    #[must_use]
    pub fn build(item: &LineItem, quote: &PriceQuote, identity: &Identity) -> Self {
        Self::build_on(item, quote, identity, today())
    }

    /// Assemble a payload with an explicit order date.
    #[must_use]
    pub fn build_on(
        item: &LineItem,
        quote: &PriceQuote,
        identity: &Identity,
        created_on: NaiveDate,
    ) -> Self {
        Self {
            item: item.clone(),
            subtotal: quote.subtotal,
            tax: quote.tax(),
            total: quote.total,
            account_id: identity.account_id,
            address_id: identity.address_id,
            created_on,
        }
    }
}

/// Body of a store order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOrderPayload {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    pub created_on: NaiveDate,
}

impl StoreOrderPayload {
    /// Assemble a payload dated today (UTC).
    #[must_use]
    pub fn build(lines: &[CartLine], quote: &PriceQuote, identity: &Identity) -> Self {
        Self::build_on(lines, quote, identity, today())
    }

    #[must_use]
    pub fn build_on(
        lines: &[CartLine],
        quote: &PriceQuote,
        identity: &Identity,
        created_on: NaiveDate,
    ) -> Self {
        Self {
            lines: lines.to_vec(),
            subtotal: quote.subtotal,
            tax: quote.tax(),
            total: quote.total,
            account_id: identity.account_id,
            address_id: identity.address_id,
            created_on,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use cougarpost_core::{Email, ProductId, Role};

    use super::*;
    use crate::pricing::ServiceLevel;

    fn customer() -> Identity {
        Identity::new(
            Role::Customer,
            Email::parse("pat@cougarpost.example").unwrap(),
            AccountId::new(88),
            Some(AddressId::new(301)),
        )
    }

    fn quote() -> PriceQuote {
        PriceQuote {
            subtotal: Decimal::new(4500, 2),
            tax_multiplier: Decimal::new(108, 2),
            total: Decimal::new(4860, 2),
        }
    }

    #[test]
    fn test_package_payload_shape() {
        let item = LineItem::envelope(ServiceLevel::Regular).fragile(true);
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let payload = CheckoutPayload::build_on(&item, &quote(), &customer(), date);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "kind": "Envelope",
                "fragile": true,
                "insured": false,
                "fast_delivery": false,
                "service_level": "Regular Delivery",
                "subtotal": "45.00",
                "tax": "3.60",
                "total": "48.60",
                "account_id": 88,
                "address_id": 301,
                "created_on": "2026-03-14"
            })
        );
    }

    #[test]
    fn test_build_uses_todays_date() {
        let item = LineItem::envelope(ServiceLevel::Express);
        let before = Utc::now().date_naive();
        let payload = CheckoutPayload::build(&item, &quote(), &customer());
        let after = Utc::now().date_naive();
        assert!(payload.created_on == before || payload.created_on == after);
    }

    #[test]
    fn test_store_payload_echoes_lines() {
        let lines = vec![CartLine {
            product_id: ProductId::new(4),
            name: "Bubble Mailer".to_string(),
            unit_price: Decimal::new(1500, 2),
            quantity: 3,
        }];
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let payload = StoreOrderPayload::build_on(&lines, &quote(), &customer(), date);

        assert_eq!(payload.lines, lines);
        assert_eq!(payload.tax, Decimal::new(360, 2));
        assert_eq!(payload.address_id, Some(AddressId::new(301)));
    }
}
