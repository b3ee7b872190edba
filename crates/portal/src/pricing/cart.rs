//! Store cart arithmetic.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cougarpost_core::ProductId;

use super::PricingError;

/// One product line in the store cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`, unrounded.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::AmountOverflow`] if the product does not fit
    /// in a `Decimal`.
    pub fn line_total(&self) -> Result<Decimal, PricingError> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(PricingError::AmountOverflow)
    }
}

/// Parses `product_id:quantity:unit_price[:name]`, e.g. `12:3:0.65:Stamp`.
impl FromStr for CartLine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let (Some(id), Some(quantity), Some(price)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!(
                "expected product_id:quantity:unit_price[:name], got {s:?}"
            ));
        };

        let unit_price: Decimal = price
            .trim()
            .parse()
            .map_err(|e| format!("invalid unit price {price:?}: {e}"))?;
        if unit_price.is_sign_negative() {
            return Err(format!("unit price cannot be negative: {price}"));
        }

        Ok(Self {
            product_id: id
                .parse()
                .map_err(|e| format!("invalid product id {id:?}: {e}"))?,
            quantity: quantity
                .trim()
                .parse()
                .map_err(|e| format!("invalid quantity {quantity:?}: {e}"))?,
            unit_price,
            name: parts.next().unwrap_or_default().to_owned(),
        })
    }
}

/// Sum of every line total, unrounded.
///
/// No cross-line discounts apply; rounding is left to whoever displays or
/// sends the figure.
///
/// # Errors
///
/// Returns [`PricingError::AmountOverflow`] if a line or the running sum
/// does not fit in a `Decimal`.
pub fn cart_subtotal(lines: &[CartLine]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |sum, line| {
        sum.checked_add(line.line_total()?)
            .ok_or(PricingError::AmountOverflow)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(price: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            name: String::new(),
            unit_price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_cart_subtotal_sums_lines() {
        let lines = [line("0.65", 10), line("4.99", 2), line("12.00", 1)];
        assert_eq!(cart_subtotal(&lines).unwrap(), "28.48".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_cart_subtotal_rounds_nothing() {
        // Sub-cent prices add up exactly.
        let lines = [line("0.003", 1), line("0.003", 1), line("0.003", 1)];
        assert_eq!(cart_subtotal(&lines).unwrap(), "0.009".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_empty_cart_is_zero() {
        assert_eq!(cart_subtotal(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_cart_line() {
        let parsed: CartLine = "12:3:0.65:Forever Stamp".parse().unwrap();
        assert_eq!(parsed.product_id, ProductId::new(12));
        assert_eq!(parsed.quantity, 3);
        assert_eq!(parsed.name, "Forever Stamp");
        assert_eq!(parsed.line_total().unwrap(), "1.95".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_parse_cart_line_errors() {
        assert!("12:3".parse::<CartLine>().is_err());
        assert!("12:x:1.00".parse::<CartLine>().is_err());
        assert!("12:1:-1.00".parse::<CartLine>().is_err());
    }

    #[test]
    fn test_oversize_line_is_an_error() {
        let huge: CartLine = "1:4294967295:79228162514264337593543950335".parse().unwrap();
        assert_eq!(huge.line_total(), Err(PricingError::AmountOverflow));
        assert_eq!(cart_subtotal(&[huge]), Err(PricingError::AmountOverflow));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let line = CartLine {
            product_id: ProductId::new(1),
            name: String::new(),
            unit_price: Decimal::MAX,
            quantity: 1,
        };
        assert_eq!(line.line_total(), Ok(Decimal::MAX));
        assert_eq!(
            cart_subtotal(&[line.clone(), line]),
            Err(PricingError::AmountOverflow)
        );
    }
}
