//! MySQL-backed, hash-chained [`authz_core::audit::AuditSink`] (C9)
//!
//! Every record's `id` is its own `content_hash`; every record's
//! `prev_hash` is the previous record's `content_hash` (or
//! [`authz_core::canonical::GENESIS_HASH`] for the first one ever
//! written). Appends are serialized by `SELECT ... FOR UPDATE` against a
//! single-row chain-head marker so concurrent writers can't race each
//! other into forking the chain.

pub mod mysql_sink;

pub use mysql_sink::MySqlAuditSink;
