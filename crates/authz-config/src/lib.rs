//! Layered configuration for the authorization gateway
//!
//! Sources, lowest to highest precedence: `{config_dir}/default`,
//! `{config_dir}/{environment}`, `{config_dir}/local`, then
//! `AUTHZ__`-prefixed environment variables (`__` as the nesting
//! separator, e.g. `AUTHZ__SERVER__PORT`).

pub mod config;
pub mod loader;
pub mod validation;

pub use config::*;
pub use loader::*;
pub use validation::*;
