//! CougarPost Core - Shared types library.
//!
//! This crate provides the types shared by every CougarPost component:
//! - `portal` - Session gate, pricing pipeline and backend API client
//! - `cli` - Command-line front end for the portal
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no clocks.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for typed IDs, emails, roles and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
