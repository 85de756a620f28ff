//! Database repository modules

pub mod entitlement_repository;

pub use entitlement_repository::EntitlementRepository;
