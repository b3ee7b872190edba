//! Portal state shared by every front-end command.

use std::sync::Arc;

use tracing::{info, instrument};

use cougarpost_core::Role;

use crate::access::Screen;
use crate::api::{CheckoutReceipt, Credentials, PortalClient};
use crate::config::PortalConfig;
use crate::error::{PortalError, Result, add_breadcrumb};
use crate::pricing::{
    CartLine, CheckoutPayload, LineItem, PriceQuote, PricingPipeline, RateTable, RateTableKind,
    StoreOrderPayload,
};
use crate::session::{FileStore, Identity, SessionAuthority};

/// Everything a front end needs: configuration, the session and the backend
/// client. Pricing pipelines are built per call for the signed-in role.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct PortalState {
    inner: Arc<PortalStateInner>,
}

struct PortalStateInner {
    config: PortalConfig,
    session: SessionAuthority<FileStore>,
    client: PortalClient,
}

impl PortalState {
    /// Build the state and restore any persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: PortalConfig) -> Result<Self> {
        let client = PortalClient::new(&config.api)?;
        let session = SessionAuthority::new(FileStore::new(&config.state_dir));
        session.restore();

        Ok(Self {
            inner: Arc::new(PortalStateInner {
                config,
                session,
                client,
            }),
        })
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the session authority.
    #[must_use]
    pub fn session(&self) -> &SessionAuthority<FileStore> {
        &self.inner.session
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn client(&self) -> &PortalClient {
        &self.inner.client
    }

    /// Rate table that prices packages for `role`, unless the config
    /// forces one table on everyone.
    #[must_use]
    pub fn rate_table_for(&self, role: Role) -> &'static RateTable {
        self.inner
            .config
            .rate_table
            .unwrap_or_else(|| RateTableKind::for_role(role))
            .table()
    }

    /// Pricing pipeline for `role`, resolving tax through the backend.
    #[must_use]
    pub fn pricing_for(&self, role: Role) -> PricingPipeline<PortalClient> {
        PricingPipeline::new(self.rate_table_for(role), self.inner.client.clone())
    }

    /// Rate table the signed-in identity's package quotes use.
    ///
    /// # Errors
    ///
    /// As [`require`](Self::require) for [`Screen::CreatePackage`].
    pub fn package_rates(&self) -> Result<&'static RateTable> {
        let identity = self.require(Screen::CreatePackage)?;
        Ok(self.rate_table_for(identity.role))
    }

    /// Authenticate against the backend and make the result current.
    ///
    /// A refused sign-in leaves the session as it was.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Api`] if the backend refuses or cannot be
    /// reached.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        let identity = self.inner.client.sign_in(credentials).await?;
        self.inner.session.login(identity.clone());
        Ok(identity)
    }

    /// The current identity, provided it may open `screen`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NotSignedIn`] when anonymous and
    /// [`PortalError::Forbidden`] when the role is not allowed.
    pub fn require(&self, screen: Screen) -> Result<Identity> {
        let identity = self.inner.session.current().ok_or(PortalError::NotSignedIn)?;
        if !screen.allows(identity.role) {
            return Err(PortalError::Forbidden { screen });
        }
        Ok(identity)
    }

    /// Validate and price a package for the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody suitable is signed in, the selection does
    /// not fit the rate table, the account has no address, or tax cannot be
    /// looked up.
    pub async fn quote_package(&self, item: &LineItem) -> Result<(Identity, PriceQuote)> {
        let identity = self.require(Screen::CreatePackage)?;
        let pricing = self.pricing_for(identity.role);
        pricing.rates().validate(item)?;
        let address_id = identity.address_id.ok_or(PortalError::MissingAddress)?;

        let quote = pricing.quote(item, address_id).await?;
        Ok((identity, quote))
    }

    /// Price and submit a package.
    ///
    /// # Errors
    ///
    /// As [`quote_package`](Self::quote_package), plus
    /// [`PortalError::Api`] if the backend does not accept the order.
    pub async fn checkout_package(&self, item: &LineItem) -> Result<(PriceQuote, CheckoutReceipt)> {
        let (identity, quote) = self.quote_package(item).await?;
        let payload = self
            .pricing_for(identity.role)
            .build_checkout_payload(item, &quote, &identity);

        let total = quote.total.to_string();
        add_breadcrumb("checkout", "Submitting package", Some(&[("total", total.as_str())]));
        let receipt = self.inner.client.submit_package(&payload).await?;
        info!(account_id = %identity.account_id, total = %quote.total, "Package order placed");
        Ok((quote, receipt))
    }

    /// Price the store cart for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or its total overflows, nobody
    /// suitable is signed in, the account has no address, or tax cannot be
    /// looked up.
    pub async fn quote_cart(&self, lines: &[CartLine]) -> Result<(Identity, PriceQuote)> {
        let identity = self.require(Screen::Cart)?;
        if lines.is_empty() {
            return Err(PortalError::Invalid("the cart is empty".to_string()));
        }
        let address_id = identity.address_id.ok_or(PortalError::MissingAddress)?;

        let quote = self
            .pricing_for(identity.role)
            .quote_cart(lines, address_id)
            .await?;
        Ok((identity, quote))
    }

    /// Price and submit the store cart.
    ///
    /// # Errors
    ///
    /// As [`quote_cart`](Self::quote_cart), plus [`PortalError::Api`] if
    /// the backend does not accept the order.
    pub async fn checkout_cart(&self, lines: &[CartLine]) -> Result<(PriceQuote, CheckoutReceipt)> {
        let (identity, quote) = self.quote_cart(lines).await?;
        let payload = StoreOrderPayload::build(lines, &quote, &identity);

        let total = quote.total.to_string();
        add_breadcrumb("checkout", "Submitting store order", Some(&[("total", total.as_str())]));
        let receipt = self.inner.client.submit_store_order(&payload).await?;
        info!(account_id = %identity.account_id, total = %quote.total, "Store order placed");
        Ok((quote, receipt))
    }

    /// Payload that [`checkout_package`](Self::checkout_package) would send.
    ///
    /// # Errors
    ///
    /// As [`quote_package`](Self::quote_package).
    pub async fn preview_package(&self, item: &LineItem) -> Result<CheckoutPayload> {
        let (identity, quote) = self.quote_package(item).await?;
        Ok(self
            .pricing_for(identity.role)
            .build_checkout_payload(item, &quote, &identity))
    }
}
