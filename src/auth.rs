//! Caller identity.
//!
//! The identity provider issues a signed session JWT; the `AuthenticatedUser`
//! extractor verifies it and hands the identity to handlers explicitly.

pub mod middleware;
pub mod models;
pub mod session;
