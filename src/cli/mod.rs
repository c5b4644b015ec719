//! Operation mode handlers for the `reviewrota` binary.
//!
//! - [`migrations`]: apply database migrations and exit
//! - [`serve`]: run the HTTP server until a shutdown signal arrives

pub mod migrations;
pub mod serve;
