//! Core zero-trust authorization pipeline
//!
//! Pure business logic — sessions, risk, rate limiting, policy input,
//! audit contracts — independent of HTTP or storage transport. Concrete
//! backends live in `authz-cache`, `authz-audit`, `authz-policy`, and
//! `authz-db`; this crate only defines the traits they implement.

pub mod audit;
pub mod canonical;
pub mod clock;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod resilience;
pub mod services;

pub use error::AuthzError;

pub mod prelude;
