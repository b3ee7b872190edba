//! Subcommand implementations.

pub mod pricing;
pub mod session;
