//! Package and store pricing.
//!
//! # Pipeline
//!
//! 1. [`RateTable::subtotal`] prices a [`LineItem`] from a fixed table (pure)
//! 2. a [`TaxRateLookup`] resolves the tax multiplier for the buyer's address
//!    (the only async step, one attempt, no retry)
//! 3. [`PricingPipeline::quote`] combines both into a [`PriceQuote`]
//! 4. [`CheckoutPayload::build`] turns the quote into a submission body
//!
//! Nothing is cached: every quote asks for the tax rate again, so changing
//! the address can never reuse a stale multiplier.
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, client);
//! let item = LineItem::envelope(ServiceLevel::Regular).fragile(true);
//! let quote = pipeline.quote(&item, address_id).await?;
//! let payload = pipeline.build_checkout_payload(&item, &quote, &identity);
//! ```

mod cart;
mod checkout;
mod line_item;
mod rates;

pub use cart::{CartLine, cart_subtotal};
pub use checkout::{CheckoutPayload, StoreOrderPayload};
pub use line_item::{LineItem, PackageKind, ServiceLevel, TierLabel};
pub use rates::{RateTable, RateTableKind, TierDimension};

use std::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use cougarpost_core::{AddressId, round2};

use crate::session::Identity;

/// Errors raised when a selection cannot be priced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// A box without a weight or size tier.
    #[error("a box needs a {dimension} tier")]
    MissingTier {
        /// The missing tier.
        dimension: TierDimension,
    },

    /// An envelope carrying a weight or size tier.
    #[error("an envelope cannot have a {dimension} tier")]
    UnexpectedTier {
        /// The tier that should be absent.
        dimension: TierDimension,
    },

    /// A tier label the table has no price for.
    #[error("unknown {dimension} tier {label:?} in the {table} rate table")]
    UnknownTier {
        /// Which tier.
        dimension: TierDimension,
        /// The label as entered.
        label: String,
        /// Table consulted.
        table: &'static str,
    },

    /// A price too large to represent.
    #[error("amount is too large to price")]
    AmountOverflow,
}

/// The tax rate could not be determined.
///
/// Deliberately opaque: network errors, error statuses and unreadable bodies
/// all collapse into this one failure. `reason` is for logs only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not calculate tax")]
pub struct TaxLookupFailure {
    reason: String,
}

impl TaxLookupFailure {
    /// Wrap the underlying cause.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// What actually went wrong.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Why a cart could not be quoted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    TaxLookup(#[from] TaxLookupFailure),
}

/// Resolves the tax multiplier for an address.
///
/// Implemented by the backend API client; tests supply fixed rates.
pub trait TaxRateLookup: Send + Sync {
    /// The multiplier for `address_id` (`1.08` means 8% tax).
    fn tax_multiplier(
        &self,
        address_id: AddressId,
    ) -> impl Future<Output = Result<Decimal, TaxLookupFailure>> + Send;
}

/// Subtotal, tax multiplier and total for one priced selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub subtotal: Decimal,
    pub tax_multiplier: Decimal,
    pub total: Decimal,
}

impl PriceQuote {
    /// A multiplier large enough to overflow the total counts as a bad tax
    /// response, not a price.
    fn from_subtotal(
        subtotal: Decimal,
        tax_multiplier: Decimal,
    ) -> Result<Self, TaxLookupFailure> {
        let Some(total) = subtotal.checked_mul(tax_multiplier) else {
            warn!(%subtotal, %tax_multiplier, "Taxed total overflowed");
            return Err(TaxLookupFailure::new(format!(
                "multiplier {tax_multiplier} overflows a subtotal of {subtotal}"
            )));
        };

        Ok(Self {
            subtotal,
            tax_multiplier,
            total: round2(total),
        })
    }

    /// Tax charged: `total - subtotal`.
    #[must_use]
    pub fn tax(&self) -> Decimal {
        self.total - self.subtotal
    }
}

/// Prices packages and carts against one rate table and tax source.
#[derive(Debug, Clone)]
pub struct PricingPipeline<L> {
    rates: &'static RateTable,
    lookup: L,
}

impl<L: TaxRateLookup> PricingPipeline<L> {
    /// Create a pipeline using `rates` and resolving tax through `lookup`.
    #[must_use]
    pub const fn new(rates: &'static RateTable, lookup: L) -> Self {
        Self { rates, lookup }
    }

    /// The rate table in use.
    #[must_use]
    pub const fn rates(&self) -> &'static RateTable {
        self.rates
    }

    /// Pre-tax price of a package. See [`RateTable::subtotal`].
    #[must_use]
    pub fn compute_subtotal(&self, item: &LineItem) -> Decimal {
        self.rates.subtotal(item)
    }

    /// Ask the tax source for the multiplier at `address_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxLookupFailure`] if the lookup fails or yields a
    /// multiplier below 1.
    #[instrument(skip_all, fields(address_id = %address_id))]
    pub async fn fetch_tax_multiplier(
        &self,
        address_id: AddressId,
    ) -> Result<Decimal, TaxLookupFailure> {
        let multiplier = self.lookup.tax_multiplier(address_id).await.map_err(|e| {
            warn!(reason = e.reason(), "Tax lookup failed");
            e
        })?;

        if multiplier < Decimal::ONE {
            warn!(%multiplier, "Tax lookup returned a multiplier below 1");
            return Err(TaxLookupFailure::new(format!(
                "multiplier {multiplier} is below 1"
            )));
        }

        debug!(%multiplier, "Resolved tax multiplier");
        Ok(multiplier)
    }

    /// Price a package including tax.
    ///
    /// # Errors
    ///
    /// Returns [`TaxLookupFailure`] if the tax rate cannot be resolved. No
    /// fallback rate is ever assumed.
    pub async fn quote(
        &self,
        item: &LineItem,
        address_id: AddressId,
    ) -> Result<PriceQuote, TaxLookupFailure> {
        let subtotal = self.compute_subtotal(item);
        let multiplier = self.fetch_tax_multiplier(address_id).await?;
        PriceQuote::from_subtotal(subtotal, multiplier)
    }

    /// Price a store cart including tax.
    ///
    /// The subtotal is checked before any tax call is made.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Pricing`] if the cart total cannot be
    /// represented and [`QuoteError::TaxLookup`] if the tax rate cannot be
    /// resolved.
    pub async fn quote_cart(
        &self,
        lines: &[CartLine],
        address_id: AddressId,
    ) -> Result<PriceQuote, QuoteError> {
        let subtotal = round2(cart_subtotal(lines)?);
        let multiplier = self.fetch_tax_multiplier(address_id).await?;
        Ok(PriceQuote::from_subtotal(subtotal, multiplier)?)
    }

    /// Assemble the package checkout body. Does not submit it.
    #[must_use]
    pub fn build_checkout_payload(
        &self,
        item: &LineItem,
        quote: &PriceQuote,
        identity: &Identity,
    ) -> CheckoutPayload {
        CheckoutPayload::build(item, quote, identity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cougarpost_core::ProductId;

    use super::*;

    /// Fixed-rate tax source that counts how often it is asked.
    struct FixedRate {
        multiplier: Result<Decimal, TaxLookupFailure>,
        calls: AtomicUsize,
    }

    impl FixedRate {
        fn ok(multiplier: &str) -> Self {
            Self {
                multiplier: Ok(multiplier.parse().unwrap()),
                calls: AtomicUsize::new(0),
            }
        }

        fn with(multiplier: Decimal) -> Self {
            Self {
                multiplier: Ok(multiplier),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                multiplier: Err(TaxLookupFailure::new("HTTP 500")),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TaxRateLookup for FixedRate {
        async fn tax_multiplier(
            &self,
            _address_id: AddressId,
        ) -> Result<Decimal, TaxLookupFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.multiplier.clone()
        }
    }

    fn fragile_envelope() -> LineItem {
        LineItem::envelope(ServiceLevel::Regular).fragile(true)
    }

    #[tokio::test]
    async fn test_quote_applies_multiplier() {
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::ok("1.08"));
        let quote = pipeline
            .quote(&fragile_envelope(), AddressId::new(1))
            .await
            .unwrap();

        assert_eq!(quote.subtotal, Decimal::new(4500, 2));
        assert_eq!(quote.total, Decimal::new(4860, 2));
        assert_eq!(quote.tax(), Decimal::new(360, 2));
        assert_eq!(quote.total, round2(quote.subtotal * quote.tax_multiplier));
    }

    #[tokio::test]
    async fn test_quote_rounds_total_half_up() {
        // 20.00 * 1.0725 = 21.45
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::ok("1.0725"));
        let quote = pipeline
            .quote(&LineItem::envelope(ServiceLevel::Regular), AddressId::new(1))
            .await
            .unwrap();
        assert_eq!(quote.total.to_string(), "21.45");

        // 15.00 * 1.0625 = 15.9375
        let pipeline = PricingPipeline::new(&RateTable::CLERK, FixedRate::ok("1.0625"));
        let quote = pipeline
            .quote(&LineItem::envelope(ServiceLevel::Regular), AddressId::new(1))
            .await
            .unwrap();
        assert_eq!(quote.total.to_string(), "15.94");
    }

    #[tokio::test]
    async fn test_quote_propagates_lookup_failure() {
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::failing());
        let err = pipeline
            .quote(&fragile_envelope(), AddressId::new(1))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "could not calculate tax");
        assert_eq!(err.reason(), "HTTP 500");
    }

    #[tokio::test]
    async fn test_multiplier_below_one_is_rejected() {
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::ok("0.92"));
        assert!(
            pipeline
                .fetch_tax_multiplier(AddressId::new(1))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_every_quote_asks_for_tax() {
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::ok("1.00"));
        let item = fragile_envelope();
        pipeline.quote(&item, AddressId::new(1)).await.unwrap();
        pipeline.quote(&item, AddressId::new(2)).await.unwrap();
        pipeline.quote(&item, AddressId::new(1)).await.unwrap();

        assert_eq!(pipeline.lookup.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_quote_cart() {
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::ok("1.08"));
        let lines = [
            CartLine {
                product_id: ProductId::new(1),
                name: "Stamp".into(),
                unit_price: Decimal::new(65, 2),
                quantity: 20,
            },
            CartLine {
                product_id: ProductId::new(2),
                name: "Box, medium".into(),
                unit_price: Decimal::new(3200, 2),
                quantity: 1,
            },
        ];

        let quote = pipeline.quote_cart(&lines, AddressId::new(1)).await.unwrap();
        assert_eq!(quote.subtotal.to_string(), "45.00");
        assert_eq!(quote.total.to_string(), "48.60");
    }

    #[tokio::test]
    async fn test_oversize_multiplier_is_a_lookup_failure() {
        // Parsed from `{"data": 1e28}`: valid and above 1, but 45.00 times it
        // does not fit.
        let huge = Decimal::from_scientific("1e28").unwrap();
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::with(huge));

        let err = pipeline
            .quote(&fragile_envelope(), AddressId::new(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "could not calculate tax");

        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::with(Decimal::MAX));
        assert!(pipeline.quote(&fragile_envelope(), AddressId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_oversize_cart_fails_before_tax() {
        let pipeline = PricingPipeline::new(&RateTable::CUSTOMER, FixedRate::ok("1.08"));
        let lines = [CartLine {
            product_id: ProductId::new(1),
            name: "Pallet".into(),
            unit_price: Decimal::MAX,
            quantity: 2,
        }];

        let err = pipeline.quote_cart(&lines, AddressId::new(1)).await.unwrap_err();
        assert_eq!(err, QuoteError::Pricing(PricingError::AmountOverflow));
        assert_eq!(pipeline.lookup.calls.load(Ordering::SeqCst), 0);
    }
}
