//! Integration tests for the CougarPost portal.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cougarpost-integration-tests
//! ```
//!
//! No external services are needed: [`FakeBackend`] serves the four backend
//! endpoints from an `axum` router bound to `127.0.0.1:0`, and each test gets
//! its own state directory under the system temp dir, removed again when
//! its [`ScratchDir`] goes out of scope.
//!
//! # Accounts
//!
//! | Email | Password | Role | Account | Address |
//! |-------|----------|------|---------|---------|
//! | `pat@cougarpost.example` | `correct-horse` | Customer | 88 | 301 |
//! | `casey@cougarpost.example` | `counter-shift` | Clerk | 31 | 7 |
//! | `dana@cougarpost.example` | `route-nine` | Driver | 54 | 12 |
//! | `noaddr@cougarpost.example` | `no-address` | Customer | 90 | none |
//!
//! Address 301 is taxed at 1.08 and address 7 at 1.0625 until a test says
//! otherwise.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};

use cougarpost_core::Email;
use cougarpost_portal::PortalState;
use cougarpost_portal::api::Credentials;
use cougarpost_portal::config::{ConfigError, PortalConfig};

pub const CUSTOMER_EMAIL: &str = "pat@cougarpost.example";
pub const CUSTOMER_PASSWORD: &str = "correct-horse";
pub const CLERK_EMAIL: &str = "casey@cougarpost.example";
pub const CLERK_PASSWORD: &str = "counter-shift";
pub const DRIVER_EMAIL: &str = "dana@cougarpost.example";
pub const DRIVER_PASSWORD: &str = "route-nine";
pub const NO_ADDRESS_EMAIL: &str = "noaddr@cougarpost.example";
pub const NO_ADDRESS_PASSWORD: &str = "no-address";

/// How the tax endpoint answers for one address.
#[derive(Debug, Clone)]
pub enum TaxReply {
    /// `200 { "data": <value> }`
    Data(Value),
    /// Bare status with a short text body.
    Status(u16),
}

struct Account {
    password: &'static str,
    identity: Value,
}

struct BackendState {
    accounts: HashMap<&'static str, Account>,
    tax: Mutex<HashMap<i64, TaxReply>>,
    checkout_reply: Mutex<Value>,
    received: Mutex<Vec<(String, Value)>>,
    tax_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the CougarPost backend.
#[derive(Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let accounts = HashMap::from([
            (
                CUSTOMER_EMAIL,
                Account {
                    password: CUSTOMER_PASSWORD,
                    identity: json!({
                        "role": "Customer",
                        "email": CUSTOMER_EMAIL,
                        "accountId": 88,
                        "addressId": 301,
                        "first_name": "Pat",
                        "last_name": "Lee"
                    }),
                },
            ),
            (
                CLERK_EMAIL,
                Account {
                    password: CLERK_PASSWORD,
                    identity: json!({
                        "role": "Clerk",
                        "email": CLERK_EMAIL,
                        "accountId": 31,
                        "addressId": 7,
                        "branch": "Downtown"
                    }),
                },
            ),
            (
                DRIVER_EMAIL,
                Account {
                    password: DRIVER_PASSWORD,
                    identity: json!({
                        "role": "Driver",
                        "email": DRIVER_EMAIL,
                        "accountId": 54,
                        "addressId": 12
                    }),
                },
            ),
            (
                NO_ADDRESS_EMAIL,
                Account {
                    password: NO_ADDRESS_PASSWORD,
                    identity: json!({
                        "role": "Customer",
                        "email": NO_ADDRESS_EMAIL,
                        "accountId": 90
                    }),
                },
            ),
        ]);

        let state = Arc::new(BackendState {
            accounts,
            tax: Mutex::new(HashMap::from([
                (301, TaxReply::Data(json!(1.08))),
                (7, TaxReply::Data(json!("1.0625"))),
            ])),
            checkout_reply: Mutex::new(json!({ "success": true, "tracking_number": "CP000123" })),
            received: Mutex::new(Vec::new()),
            tax_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/tax/{address_id}", get(tax))
            .route("/api/packages", post(packages))
            .route("/api/store/orders", post(store_orders))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve fake backend") });

        Self { addr, state }
    }

    /// API root as the portal expects it.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Change how the tax endpoint answers for `address_id`.
    pub fn set_tax(&self, address_id: i64, reply: TaxReply) {
        lock(&self.state.tax).insert(address_id, reply);
    }

    /// Make every following checkout answer `success: false`.
    pub fn reject_checkouts(&self, message: &str) {
        *lock(&self.state.checkout_reply) = json!({ "success": false, "message": message });
    }

    /// Bodies received by the checkout endpoints, as `(endpoint, body)`.
    #[must_use]
    pub fn received(&self) -> Vec<(String, Value)> {
        lock(&self.state.received).clone()
    }

    /// Number of tax lookups served so far.
    #[must_use]
    pub fn tax_calls(&self) -> usize {
        self.state.tax_calls.load(Ordering::SeqCst)
    }

    /// Portal configuration pointing at this backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the generated values are rejected.
    pub fn config(
        &self,
        state_dir: &FsPath,
        rate_table: &str,
    ) -> Result<PortalConfig, ConfigError> {
        let api_url = self.api_url();
        let state_dir = state_dir.display().to_string();
        PortalConfig::from_lookup(|key| match key {
            "COUGARPOST_API_URL" => Some(api_url.clone()),
            "COUGARPOST_STATE_DIR" => Some(state_dir.clone()),
            "COUGARPOST_RATE_TABLE" => Some(rate_table.to_string()),
            "COUGARPOST_HTTP_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
    }

    /// A fresh portal (as if the process just started) on `state_dir`.
    ///
    /// # Panics
    ///
    /// Panics if the portal cannot be built.
    #[must_use]
    pub fn portal(&self, state_dir: &FsPath) -> PortalState {
        self.portal_with_rates(state_dir, "customer")
    }

    /// Like [`portal`](Self::portal) with an explicit rate table.
    ///
    /// # Panics
    ///
    /// Panics if the portal cannot be built.
    #[must_use]
    pub fn portal_with_rates(&self, state_dir: &FsPath, rate_table: &str) -> PortalState {
        let config = self.config(state_dir, rate_table).expect("test config");
        PortalState::new(config).expect("portal state")
    }
}

/// A state directory that is deleted on drop.
///
/// Keep it bound for as long as any portal built on it is in use.
#[derive(Debug)]
pub struct ScratchDir(PathBuf);

impl Deref for ScratchDir {
    type Target = FsPath;

    fn deref(&self) -> &FsPath {
        &self.0
    }
}

impl AsRef<FsPath> for ScratchDir {
    fn as_ref(&self) -> &FsPath {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Unique, not yet created, state directory.
#[must_use]
pub fn scratch_dir() -> ScratchDir {
    ScratchDir(std::env::temp_dir().join(format!("cougarpost-it-{}", uuid::Uuid::new_v4())))
}

/// Credentials for one of the seeded accounts.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn credentials(email: &str, password: &str) -> Credentials {
    Credentials::new(
        Email::parse(email).expect("valid email"),
        SecretString::from(password.to_string()),
    )
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match state.accounts.get(email) {
        Some(account) if account.password == password => {
            Json(account.identity.clone()).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response(),
    }
}

async fn tax(State(state): State<Arc<BackendState>>, Path(address_id): Path<i64>) -> Response {
    state.tax_calls.fetch_add(1, Ordering::SeqCst);
    let reply = lock(&state.tax).get(&address_id).cloned();

    match reply {
        Some(TaxReply::Data(value)) => Json(json!({ "data": value })).into_response(),
        Some(TaxReply::Status(code)) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, "tax service unavailable").into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Address not found" })),
        )
            .into_response(),
    }
}

fn record_checkout(state: &BackendState, endpoint: &str, body: Value) -> Json<Value> {
    lock(&state.received).push((endpoint.to_string(), body));
    Json(lock(&state.checkout_reply).clone())
}

async fn packages(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Json<Value> {
    record_checkout(&state, "packages", body)
}

async fn store_orders(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_checkout(&state, "store/orders", body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_is_removed_on_drop() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cougarpost.identity.json"), "{}").unwrap();
        let path = dir.to_path_buf();

        drop(dir);
        assert!(!path.exists());
    }
}
