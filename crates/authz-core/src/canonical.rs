//! Canonical JSON serialization shared by two call sites: the decision-cache
//! fingerprint (C6) and the audit record's content hash (C9).
//!
//! "Canonical" means: object keys sorted lexicographically, no insignificant
//! whitespace, and numbers normalized by round-tripping through `serde_json`
//! (which already collapses `1.0` and `1` to distinct but stable forms —
//! callers that need numeric-type-insensitive equality should normalize
//! before calling in). The point is reproducibility across hosts and
//! library versions, not numeric type unification.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sort all object keys so serialization order is independent of
/// field declaration order or insertion order in maps.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, Value> = std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k, sort_keys(v));
            }
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Serialize `value` to its canonical string form: sorted keys, no
/// whitespace, UTF-8.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    let sorted = sort_keys(raw);
    serde_json::to_string(&sorted)
}

/// SHA-256 over the canonical serialization, hex-encoded lowercase.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = to_canonical_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex_encode(&hasher.finalize()))
}

/// Hash a canonical string concatenated with a previous hash — the audit
/// chain's hashing primitive: `H(canonical(record) || prev_hash)`.
pub fn chain_hash(canonical_record: &str, prev_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_record.as_bytes());
    hasher.update(prev_hash.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).unwrap();
    }
    s
}

pub const GENESIS_HASH: &str = "GENESIS";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_fingerprint() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn nested_objects_are_sorted_too() {
        let a = json!({"outer": {"z": 1, "a": 2}});
        let b = json!({"outer": {"a": 2, "z": 1}});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn different_values_produce_different_fingerprints() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn chain_hash_is_deterministic() {
        let h1 = chain_hash("record", GENESIS_HASH);
        let h2 = chain_hash("record", GENESIS_HASH);
        assert_eq!(h1, h2);
        let h3 = chain_hash("record", &h1);
        assert_ne!(h1, h3);
    }
}
