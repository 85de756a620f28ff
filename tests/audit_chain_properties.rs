//! Property tests for audit chain verifiability: for every prefix of the
//! log, recomputing `contentHash` from `canonical(record) || prevHash`
//! reproduces the stored `id`, and any single-record mutation breaks
//! verification from that record onward.

mod support;

use authz_core::audit::{AuditSink, PendingAuditRecord};
use authz_core::models::{AuditDecision, RiskLevel};
use chrono::Utc;
use proptest::prelude::*;
use support::FakeAuditSink;
use uuid::Uuid;

fn pending_record(seed: u64, action: &str) -> PendingAuditRecord {
    PendingAuditRecord {
        subject_id: Uuid::from_u128(seed as u128),
        session_id: Some(Uuid::from_u128((seed + 1) as u128)),
        action: action.to_string(),
        resource: Some(format!("resource-{seed}")),
        decision: if seed % 2 == 0 {
            AuditDecision::Allow
        } else {
            AuditDecision::Deny
        },
        policy_package: Some("authz.adaptive".to_string()),
        policy_rule: Some("allow".to_string()),
        roles: vec!["member".to_string()],
        entitlements: vec![],
        risk_level: RiskLevel::Low,
        mfa_verified: seed % 3 == 0,
        ip: format!("10.0.0.{}", seed % 255),
        user_agent: "proptest-agent".to_string(),
        evaluated_at: Utc::now(),
    }
}

fn append_n(rt: &tokio::runtime::Runtime, sink: &FakeAuditSink, n: usize) {
    for i in 0..n {
        rt.block_on(sink.append(pending_record(i as u64, "request.allow")))
            .expect("append must not fail for the in-memory fake");
    }
}

#[test]
fn empty_chain_verifies() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let sink = FakeAuditSink::default();
    assert!(rt.block_on(sink.verify_chain()).unwrap());
}

#[test]
fn first_record_chains_from_genesis() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let sink = FakeAuditSink::default();
    let first = rt
        .block_on(sink.append(pending_record(1, "login")))
        .unwrap();
    assert_eq!(first.prev_hash, "GENESIS");
    assert_eq!(first.id, first.content_hash);
    assert!(rt.block_on(sink.verify_chain()).unwrap());
}

#[test]
fn each_record_links_to_the_previous_ids_content_hash() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let sink = FakeAuditSink::default();
    append_n(&rt, &sink, 5);
    let records = sink.records();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].prev_hash, "GENESIS");
    for window in records.windows(2) {
        assert_eq!(window[1].prev_hash, window[0].content_hash);
        assert_eq!(window[0].id, window[0].content_hash);
    }
    assert!(rt.block_on(sink.verify_chain()).unwrap());
}

proptest! {
    /// Any chain built purely through `append` verifies in full, for any
    /// length and any record content.
    #[test]
    fn any_appended_chain_verifies(n in 0usize..40) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let sink = FakeAuditSink::default();
        append_n(&rt, &sink, n);
        prop_assert!(rt.block_on(sink.verify_chain()).unwrap());
    }

    /// Tampering with exactly one record's content hash (simulating
    /// mutation or reorder) breaks verification, regardless of which
    /// record in the chain was touched.
    #[test]
    fn tampering_any_single_record_breaks_verification(
        n in 2usize..20,
        tamper_index in 0usize..19,
    ) {
        prop_assume!(tamper_index < n);
        let rt = tokio::runtime::Runtime::new().unwrap();
        let sink = FakeAuditSink::default();
        append_n(&rt, &sink, n);

        sink.tamper(tamper_index, "deadbeef-not-a-real-hash".to_string());

        prop_assert!(!rt.block_on(sink.verify_chain()).unwrap());
    }

    /// Fingerprint/chain-hash determinism: appending the same logical
    /// record twice (distinct chain position aside) produces distinct
    /// ids, since each is chained to a different `prev_hash` — the
    /// chain, not just the content, determines identity.
    #[test]
    fn identical_content_at_different_chain_positions_hashes_differently(
        seed in 0u64..1000,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let sink = FakeAuditSink::default();
        let first = rt.block_on(sink.append(pending_record(seed, "repeat"))).unwrap();
        // second append has the same logical content but a non-genesis prev_hash
        let second = rt.block_on(sink.append(pending_record(seed, "repeat"))).unwrap();
        prop_assert_ne!(first.content_hash, second.content_hash);
        prop_assert_eq!(second.prev_hash, first.content_hash);
    }
}
