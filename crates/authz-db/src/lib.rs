//! MySQL-backed persistence for entitlements
//!
//! Session state, rate counters, and the decision cache live in `authz-cache`
//! against Redis instead — nothing here is consulted on the hot request
//! path except through the `EntitlementStore` trait.

pub mod connection;
pub mod repositories;

pub use connection::*;
pub use repositories::*;
