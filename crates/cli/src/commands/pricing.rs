//! Quote and checkout commands.
//!
//! # Usage
//!
//! ```bash
//! # Envelope with fragile handling, regular delivery
//! cougarpost quote package --fragile
//!
//! # Box, same-day, print the payload that would be submitted
//! cougarpost quote package --kind box --weight 5 --size "Medium (50x40x30 cm)" \
//!     --service same-day --json
//!
//! # Store order: product_id:quantity:unit_price[:name]
//! cougarpost checkout cart --line 12:20:0.65:Stamp --line 4:1:32.00
//! ```

use clap::Args;

use cougarpost_core::Usd;
use cougarpost_portal::api::CheckoutReceipt;
use cougarpost_portal::pricing::{
    CartLine, CheckoutPayload, LineItem, PackageKind, PriceQuote, ServiceLevel, TierLabel,
};
use cougarpost_portal::{PortalError, PortalState};

/// Package selection, mirroring the create-package form.
#[derive(Debug, Args)]
pub struct PackageArgs {
    /// `envelope` or `box`
    #[arg(long, default_value = "envelope")]
    kind: PackageKind,

    /// Weight tier in kg (boxes only): 1, 2, 5, 10 or 20
    #[arg(long)]
    weight: Option<String>,

    /// Size tier (boxes only), e.g. "Medium (50x40x30 cm)"
    #[arg(long)]
    size: Option<String>,

    #[arg(long)]
    fragile: bool,

    #[arg(long)]
    insured: bool,

    #[arg(long)]
    fast_delivery: bool,

    /// `regular`, `express` or `same-day`
    #[arg(long, default_value = "regular")]
    service: ServiceLevel,

    /// Print the checkout payload as JSON
    #[arg(long)]
    json: bool,
}

impl PackageArgs {
    fn line_item(&self) -> LineItem {
        LineItem {
            kind: self.kind,
            weight_tier: self.weight.as_deref().map(TierLabel::from),
            size_tier: self.size.as_deref().map(TierLabel::from),
            fragile: self.fragile,
            insured: self.insured,
            fast_delivery: self.fast_delivery,
            service_level: self.service,
        }
    }
}

/// Store cart contents.
#[derive(Debug, Args)]
pub struct CartArgs {
    /// Cart line as `product_id:quantity:unit_price[:name]` (repeatable)
    #[arg(long = "line", required = true)]
    lines: Vec<CartLine>,
}

pub async fn quote_package(
    state: &PortalState,
    args: &PackageArgs,
) -> cougarpost_portal::Result<()> {
    let item = args.line_item();

    if args.json {
        let payload = state.preview_package(&item).await?;
        print_json(&payload)?;
        return Ok(());
    }

    let (identity, quote) = state.quote_package(&item).await?;
    print_quote(state.rate_table_for(identity.role).name, &quote);
    Ok(())
}

pub async fn checkout_package(
    state: &PortalState,
    args: &PackageArgs,
) -> cougarpost_portal::Result<()> {
    let rates = state.package_rates()?;
    let (quote, receipt) = state.checkout_package(&args.line_item()).await?;
    print_quote(rates.name, &quote);
    print_receipt(&receipt);
    Ok(())
}

pub async fn quote_cart(state: &PortalState, args: &CartArgs) -> cougarpost_portal::Result<()> {
    let (_, quote) = state.quote_cart(&args.lines).await?;
    print_lines(&args.lines);
    print_quote("store", &quote);
    Ok(())
}

pub async fn checkout_cart(state: &PortalState, args: &CartArgs) -> cougarpost_portal::Result<()> {
    let (quote, receipt) = state.checkout_cart(&args.lines).await?;
    print_lines(&args.lines);
    print_quote("store", &quote);
    print_receipt(&receipt);
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

#[allow(clippy::print_stdout)]
fn print_quote(source: &str, quote: &PriceQuote) {
    println!("Subtotal: {:>10}  ({source} rates)", Usd(quote.subtotal).to_string());
    println!("Tax:      {:>10}  (x{})", Usd(quote.tax()).to_string(), quote.tax_multiplier);
    println!("Total:    {:>10}", Usd(quote.total).to_string());
}

#[allow(clippy::print_stdout)]
fn print_lines(lines: &[CartLine]) {
    for line in lines {
        let name = if line.name.is_empty() {
            format!("product {}", line.product_id)
        } else {
            line.name.clone()
        };
        println!(
            "{:>3} x {name:<24} {:>10}",
            line.quantity,
            line.line_total()
                .map_or_else(|_| "-".to_string(), |total| Usd(total).to_string())
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_receipt(receipt: &CheckoutReceipt) {
    match &receipt.message {
        Some(message) => println!("Order placed: {message}"),
        None => println!("Order placed"),
    }
    for (key, value) in &receipt.extra {
        println!("  {key}: {value}");
    }
}

#[allow(clippy::print_stdout)]
fn print_json(payload: &CheckoutPayload) -> cougarpost_portal::Result<()> {
    let json = serde_json::to_string_pretty(payload)
        .map_err(|e| PortalError::Invalid(format!("could not render JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        package: PackageArgs,
    }

    #[derive(Parser)]
    struct CartHarness {
        #[command(flatten)]
        cart: CartArgs,
    }

    #[test]
    fn test_package_defaults_to_regular_envelope() {
        let args = Harness::try_parse_from(["quote"]).unwrap();
        assert_eq!(
            args.package.line_item(),
            LineItem::envelope(ServiceLevel::Regular)
        );
    }

    #[test]
    fn test_box_args_become_line_item() {
        let args = Harness::try_parse_from([
            "quote",
            "--kind",
            "box",
            "--weight",
            "5",
            "--size",
            "Medium (50x40x30 cm)",
            "--fragile",
            "--service",
            "same-day",
        ])
        .unwrap();

        assert_eq!(
            args.package.line_item(),
            LineItem::parcel(5u32, "Medium (50x40x30 cm)", ServiceLevel::SameDay).fragile(true)
        );
    }

    #[test]
    fn test_cart_needs_a_line() {
        assert!(CartHarness::try_parse_from(["cart"]).is_err());
        let args = CartHarness::try_parse_from([
            "cart",
            "--line",
            "1:2:3.50",
            "--line",
            "2:1:1.00:Tape",
        ])
        .unwrap();
        assert_eq!(args.cart.lines.len(), 2);
        assert_eq!(args.cart.lines[1].name, "Tape");
    }

    #[test]
    fn test_bad_service_level_is_rejected() {
        assert!(Harness::try_parse_from(["quote", "--service", "overnight"]).is_err());
    }
}
