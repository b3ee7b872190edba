//! Session authority: who is signed in and what they may see.
//!
//! # State machine
//!
//! ```text
//!               login(i)                     login(j)
//!   Anonymous ───────────▶ Authenticated(i) ─────────▶ Authenticated(j)
//!       ▲                        │
//!       └──────── logout() ──────┘
//! ```
//!
//! `restore()` runs once at process start and can only move Anonymous to
//! Authenticated, using whatever identity was persisted by an earlier
//! process. Once anything has happened in this process (a login, a logout or
//! a previous restore) it does nothing.
//!
//! # Persistence
//!
//! The identity is written to a [`KeyValueStore`] under [`keys::IDENTITY`]
//! on every login and removed on logout. Storage is a convenience cache, not
//! a security boundary: write failures are logged and otherwise ignored, and
//! an unreadable or malformed record restores as anonymous.

mod identity;
mod store;

pub use identity::Identity;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use cougarpost_core::{Email, Role};

use crate::access::Screen;
use crate::error::{clear_sentry_user, set_sentry_user};

/// Storage keys used by the session authority.
pub mod keys {
    /// Key holding the JSON-serialized current identity.
    pub const IDENTITY: &str = "cougarpost.identity";
}

#[derive(Debug, Default)]
struct SessionState {
    current: Option<Identity>,
    /// Set once login, logout or restore has run in this process.
    settled: bool,
}

/// Single source of truth for the signed-in actor.
///
/// Create one per process, call [`SessionAuthority::restore`] at startup and
/// share it (typically behind an `Arc`) with everything that gates on role.
#[derive(Debug)]
pub struct SessionAuthority<S> {
    store: S,
    state: RwLock<SessionState>,
}

impl<S: KeyValueStore> SessionAuthority<S> {
    /// Create an anonymous authority persisting to `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `identity` the current actor, replacing anyone already signed in.
    ///
    /// Callers pass the identity returned by a successful authentication
    /// call; nothing here re-checks it.
    pub fn login(&self, identity: Identity) {
        let mut state = self.write();

        if let Some(previous) = &state.current
            && previous.account_id != identity.account_id
        {
            debug!(
                previous = %previous.account_id,
                next = %identity.account_id,
                "Replacing signed-in identity"
            );
        }

        match serde_json::to_string(&identity) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::IDENTITY, &json) {
                    warn!(
                        error = %e,
                        "Failed to persist identity; session will not survive restart"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize identity for storage"),
        }

        let email = identity.email.as_ref().map(Email::as_str);
        set_sentry_user(&identity.account_id, email);
        info!(account_id = %identity.account_id, role = %identity.role, "Signed in");

        state.current = Some(identity);
        state.settled = true;
    }

    /// Sign out. Safe to call when nobody is signed in.
    pub fn logout(&self) {
        let mut state = self.write();

        if let Err(e) = self.store.remove(keys::IDENTITY) {
            warn!(error = %e, "Failed to remove persisted identity");
        }
        clear_sentry_user();

        if let Some(previous) = state.current.take() {
            info!(account_id = %previous.account_id, "Signed out");
        }
        state.settled = true;
    }

    /// Reload the identity persisted by an earlier process.
    ///
    /// Returns `true` if an identity was restored. Missing, unreadable or
    /// malformed records leave the session anonymous; a malformed record is
    /// also removed so the next start is clean.
    pub fn restore(&self) -> bool {
        let mut state = self.write();
        if state.settled {
            debug!("Session already settled; skipping restore");
            return false;
        }
        state.settled = true;

        let raw = match self.store.get(keys::IDENTITY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Could not read persisted identity; starting anonymous");
                return false;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                let email = identity.email.as_ref().map(Email::as_str);
                set_sentry_user(&identity.account_id, email);
                debug!(
                    account_id = %identity.account_id,
                    role = %identity.role,
                    "Restored session"
                );
                state.current = Some(identity);
                true
            }
            Err(e) => {
                warn!(error = %e, "Discarding malformed persisted identity");
                if let Err(e) = self.store.remove(keys::IDENTITY) {
                    warn!(error = %e, "Failed to remove malformed identity");
                }
                false
            }
        }
    }

    /// A copy of the current identity, `None` when anonymous.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.read().current.clone()
    }

    /// Whether anyone is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().current.is_some()
    }

    /// The current role, `None` when anonymous.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.read().current.as_ref().map(|identity| identity.role)
    }

    /// Whether someone is signed in with exactly `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.has_role(Role::Customer)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.has_role(Role::Manager)
    }

    #[must_use]
    pub fn is_driver(&self) -> bool {
        self.has_role(Role::Driver)
    }

    #[must_use]
    pub fn is_clerk(&self) -> bool {
        self.has_role(Role::Clerk)
    }

    /// Whether the current actor may open `screen`. Always `false` when
    /// anonymous.
    #[must_use]
    pub fn can_access(&self, screen: Screen) -> bool {
        self.role().is_some_and(|role| screen.allows(role))
    }

    /// Screens to show in the navigation menu for the current actor.
    #[must_use]
    pub fn visible_screens(&self) -> Vec<Screen> {
        self.role().map_or_else(Vec::new, |role| {
            Screen::ALL
                .into_iter()
                .filter(|screen| screen.allows(role))
                .collect()
        })
    }
}
