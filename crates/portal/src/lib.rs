//! CougarPost portal library.
//!
//! Client-side core of the CougarPost portal: who is signed in, what they
//! may see, what a package or cart costs, and how orders reach the backend.
//!
//! # Modules
//!
//! - [`session`] - Session authority and its persistent store
//! - [`access`] - Role gate for portal screens
//! - [`pricing`] - Rate tables, tax-inclusive quotes and checkout payloads
//! - [`api`] - HTTP client for the backend
//! - [`state`] - Everything above wired together for a front end

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod pricing;
pub mod session;
pub mod state;

pub use error::{PortalError, Result};
pub use state::PortalState;
