//! Decimal money helpers.
//!
//! All prices are US dollars held as [`Decimal`] in the dollar unit. Sums are
//! carried at full precision and rounded exactly once, by [`round2`], at the
//! point a figure is shown or sent.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, half away from zero.
///
/// For the non-negative amounts the portal deals in this is ordinary half-up
/// rounding: `0.125` becomes `0.13`. The result always carries exactly two
/// decimal places, so `45` comes back as `45.00`.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Display wrapper rendering an amount as `$48.60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usd(pub Decimal);

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = round2(self.0);
        if cents.is_sign_negative() && !cents.is_zero() {
            write!(f, "-${:.2}", cents.abs())
        } else {
            write!(f, "${:.2}", cents.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(Decimal::new(125, 3)), Decimal::new(13, 2));
        assert_eq!(round2(Decimal::new(124, 3)), Decimal::new(12, 2));
    }

    #[test]
    fn test_round2_pads_to_cents() {
        assert_eq!(round2(Decimal::new(45, 0)).to_string(), "45.00");
    }

    #[test]
    fn test_round2_keeps_exact_cents() {
        assert_eq!(round2(Decimal::new(4860, 2)), Decimal::new(4860, 2));
    }

    #[test]
    fn test_usd_display() {
        assert_eq!(Usd(Decimal::new(486, 1)).to_string(), "$48.60");
        assert_eq!(Usd(Decimal::new(20, 0)).to_string(), "$20.00");
        assert_eq!(Usd(Decimal::new(-5, 1)).to_string(), "-$0.50");
    }
}
