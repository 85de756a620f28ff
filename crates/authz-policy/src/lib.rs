//! PolicyClient (C6): two backends behind one contract, wrapped by a
//! short-TTL decision cache
//!
//! [`RemotePolicyClient`] speaks to the remote engine over `POST
//! {base}/v1/data/authz/adaptive` with `{"input": <policy input>}`,
//! expecting `{"result": {"allow": bool, ...}}`. [`EmbeddedPolicyClient`]
//! evaluates a sandboxed [`rhai`] script loaded once at startup. Both are
//! fail-closed: a remote timeout/non-2xx or a script error becomes
//! `allow=false` with an explanation, never a propagated error — the
//! pipeline turns that into 403 + audit `DENY reason=policy_unavailable`,
//! it never sees an `Err` from here for a dependency fault.
//! [`CachingPolicyClient`] wraps either one with [`authz_core`]'s
//! fingerprint-keyed decision cache.

pub mod caching;
pub mod embedded;
pub mod remote;

pub use caching::CachingPolicyClient;
pub use embedded::EmbeddedPolicyClient;
pub use remote::RemotePolicyClient;
