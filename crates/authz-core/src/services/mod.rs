pub mod background;
pub mod decision_cache;
pub mod entitlement_service;
pub mod policy_client;
pub mod policy_input_builder;
pub mod rate_limiter;
pub mod replay;
pub mod risk_engine;
pub mod risk_history;
pub mod risk_signals;
pub mod session_store;

pub use decision_cache::*;
pub use entitlement_service::*;
pub use policy_client::*;
pub use policy_input_builder::*;
pub use rate_limiter::{RateLimitCaps, RateLimitDecision, RateLimiter, RateCounter};
pub use replay::*;
pub use risk_engine::*;
pub use risk_history::*;
pub use risk_signals::*;
pub use session_store::*;
