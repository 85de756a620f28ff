//! Core data model
//!
//! Every type here is a plain value; none of them own persistence. The
//! components in [`crate::services`] and [`crate::pipeline`] are the only
//! things that read or write these through a store trait.

pub mod audit_record;
pub mod decision;
pub mod entitlement;
pub mod policy_input;
pub mod replay;
pub mod risk;
pub mod session;
pub mod signal;
pub mod tenant;

pub use audit_record::*;
pub use decision::*;
pub use entitlement::*;
pub use policy_input::*;
pub use replay::*;
pub use risk::*;
pub use session::*;
pub use signal::*;
pub use tenant::*;
