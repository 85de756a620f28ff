use authz_core::audit::{AuditSink, PendingAuditRecord};
use authz_core::canonical::{self, GENESIS_HASH};
use authz_core::error::AuthzError;
use authz_core::models::{AuditDecision, AuditRecord, RiskLevel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{MySql, Pool, Row};
use uuid::Uuid;

/// The part of an [`AuditRecord`] that is hashed — everything except the
/// three fields the hash itself produces (`id`, `prev_hash`, `content_hash`).
/// Field order here is irrelevant: [`canonical`] sorts keys before hashing.
#[derive(Serialize)]
struct AuditRecordContent<'a> {
    subject_id: Uuid,
    session_id: Option<Uuid>,
    action: &'a str,
    resource: &'a Option<String>,
    decision: AuditDecision,
    policy_package: &'a Option<String>,
    policy_rule: &'a Option<String>,
    roles: &'a [String],
    entitlements: &'a [String],
    risk_level: RiskLevel,
    mfa_verified: bool,
    ip: &'a str,
    user_agent: &'a str,
    evaluated_at: DateTime<Utc>,
}

pub struct MySqlAuditSink {
    pool: Pool<MySql>,
}

impl MySqlAuditSink {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn store_err(e: sqlx::Error) -> AuthzError {
        AuthzError::AuditDegraded(e.to_string())
    }

    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<AuditRecord, AuthzError> {
        let decision_str: String = row.try_get("decision").map_err(Self::store_err)?;
        let risk_str: String = row.try_get("risk_level").map_err(Self::store_err)?;
        let roles_json: String = row.try_get("roles").map_err(Self::store_err)?;
        let entitlements_json: String = row.try_get("entitlements").map_err(Self::store_err)?;
        let subject_id: String = row.try_get("subject_id").map_err(Self::store_err)?;
        let session_id: Option<String> = row.try_get("session_id").map_err(Self::store_err)?;

        Ok(AuditRecord {
            id: row.try_get("id").map_err(Self::store_err)?,
            prev_hash: row.try_get("prev_hash").map_err(Self::store_err)?,
            subject_id: subject_id
                .parse()
                .map_err(|_| AuthzError::Internal("malformed subject_id in audit_records".into()))?,
            session_id: session_id.and_then(|s| s.parse().ok()),
            action: row.try_get("action").map_err(Self::store_err)?,
            resource: row.try_get("resource").map_err(Self::store_err)?,
            decision: decision_from_str(&decision_str)?,
            policy_package: row.try_get("policy_package").map_err(Self::store_err)?,
            policy_rule: row.try_get("policy_rule").map_err(Self::store_err)?,
            roles: serde_json::from_str(&roles_json).unwrap_or_default(),
            entitlements: serde_json::from_str(&entitlements_json).unwrap_or_default(),
            risk_level: risk_level_from_str(&risk_str)?,
            mfa_verified: row.try_get("mfa_verified").map_err(Self::store_err)?,
            ip: row.try_get("ip").map_err(Self::store_err)?,
            user_agent: row.try_get("user_agent").map_err(Self::store_err)?,
            evaluated_at: row.try_get("evaluated_at").map_err(Self::store_err)?,
            content_hash: row.try_get("content_hash").map_err(Self::store_err)?,
        })
    }
}

fn decision_as_str(d: AuditDecision) -> &'static str {
    match d {
        AuditDecision::Allow => "ALLOW",
        AuditDecision::Deny => "DENY",
        AuditDecision::Challenge => "CHALLENGE",
        AuditDecision::Granted => "GRANTED",
        AuditDecision::Revoked => "REVOKED",
    }
}

fn decision_from_str(s: &str) -> Result<AuditDecision, AuthzError> {
    Ok(match s {
        "ALLOW" => AuditDecision::Allow,
        "DENY" => AuditDecision::Deny,
        "CHALLENGE" => AuditDecision::Challenge,
        "GRANTED" => AuditDecision::Granted,
        "REVOKED" => AuditDecision::Revoked,
        other => return Err(AuthzError::Internal(format!("unknown audit decision {other}"))),
    })
}

fn risk_level_as_str(r: RiskLevel) -> &'static str {
    match r {
        RiskLevel::Low => "LOW",
        RiskLevel::Medium => "MEDIUM",
        RiskLevel::High => "HIGH",
        RiskLevel::Critical => "CRITICAL",
    }
}

fn risk_level_from_str(s: &str) -> Result<RiskLevel, AuthzError> {
    Ok(match s {
        "LOW" => RiskLevel::Low,
        "MEDIUM" => RiskLevel::Medium,
        "HIGH" => RiskLevel::High,
        "CRITICAL" => RiskLevel::Critical,
        other => return Err(AuthzError::Internal(format!("unknown risk level {other}"))),
    })
}

#[async_trait]
impl AuditSink for MySqlAuditSink {
    async fn append(&self, record: PendingAuditRecord) -> Result<AuditRecord, AuthzError> {
        let mut tx = self.pool.begin().await.map_err(Self::store_err)?;

        // Lock the chain head so two concurrent appends can't both read the
        // same prev_hash and fork the chain.
        let prev_hash: String = sqlx::query(
            "SELECT content_hash FROM audit_records ORDER BY seq DESC LIMIT 1 FOR UPDATE",
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(Self::store_err)?
        .map(|row| row.try_get::<String, _>("content_hash"))
        .transpose()
        .map_err(Self::store_err)?
        .unwrap_or_else(|| GENESIS_HASH.to_string());

        let content = AuditRecordContent {
            subject_id: record.subject_id,
            session_id: record.session_id,
            action: &record.action,
            resource: &record.resource,
            decision: record.decision,
            policy_package: &record.policy_package,
            policy_rule: &record.policy_rule,
            roles: &record.roles,
            entitlements: &record.entitlements,
            risk_level: record.risk_level,
            mfa_verified: record.mfa_verified,
            ip: &record.ip,
            user_agent: &record.user_agent,
            evaluated_at: record.evaluated_at,
        };
        let canonical_content = canonical::to_canonical_string(&content)
            .map_err(|e| AuthzError::Internal(e.to_string()))?;
        let content_hash = canonical::chain_hash(&canonical_content, &prev_hash);

        let roles_json = serde_json::to_string(&record.roles).map_err(AuthzError::from)?;
        let entitlements_json = serde_json::to_string(&record.entitlements).map_err(AuthzError::from)?;

        sqlx::query(
            r#"
            INSERT INTO audit_records
                (id, prev_hash, subject_id, session_id, action, resource, decision,
                 policy_package, policy_rule, roles, entitlements, risk_level,
                 mfa_verified, ip, user_agent, evaluated_at, content_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&content_hash)
        .bind(&prev_hash)
        .bind(record.subject_id.to_string())
        .bind(record.session_id.map(|id| id.to_string()))
        .bind(&record.action)
        .bind(&record.resource)
        .bind(decision_as_str(record.decision))
        .bind(&record.policy_package)
        .bind(&record.policy_rule)
        .bind(&roles_json)
        .bind(&entitlements_json)
        .bind(risk_level_as_str(record.risk_level))
        .bind(record.mfa_verified)
        .bind(&record.ip)
        .bind(&record.user_agent)
        .bind(record.evaluated_at)
        .bind(&content_hash)
        .execute(&mut *tx)
        .await
        .map_err(Self::store_err)?;

        tx.commit().await.map_err(Self::store_err)?;

        Ok(AuditRecord {
            id: content_hash.clone(),
            prev_hash,
            subject_id: record.subject_id,
            session_id: record.session_id,
            action: record.action,
            resource: record.resource,
            decision: record.decision,
            policy_package: record.policy_package,
            policy_rule: record.policy_rule,
            roles: record.roles,
            entitlements: record.entitlements,
            risk_level: record.risk_level,
            mfa_verified: record.mfa_verified,
            ip: record.ip,
            user_agent: record.user_agent,
            evaluated_at: record.evaluated_at,
            content_hash,
        })
    }

    async fn verify_chain(&self) -> Result<bool, AuthzError> {
        let rows = sqlx::query("SELECT * FROM audit_records ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::store_err)?;

        let mut expected_prev = GENESIS_HASH.to_string();
        for row in &rows {
            let record = Self::row_to_record(row)?;
            if record.prev_hash != expected_prev {
                return Ok(false);
            }
            let content = AuditRecordContent {
                subject_id: record.subject_id,
                session_id: record.session_id,
                action: &record.action,
                resource: &record.resource,
                decision: record.decision,
                policy_package: &record.policy_package,
                policy_rule: &record.policy_rule,
                roles: &record.roles,
                entitlements: &record.entitlements,
                risk_level: record.risk_level,
                mfa_verified: record.mfa_verified,
                ip: &record.ip,
                user_agent: &record.user_agent,
                evaluated_at: record.evaluated_at,
            };
            let canonical_content = canonical::to_canonical_string(&content)
                .map_err(|e| AuthzError::Internal(e.to_string()))?;
            let recomputed = canonical::chain_hash(&canonical_content, &record.prev_hash);
            if recomputed != record.content_hash || record.id != record.content_hash {
                return Ok(false);
            }
            expected_prev = record.content_hash;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_round_trips_through_str() {
        for d in [
            AuditDecision::Allow,
            AuditDecision::Deny,
            AuditDecision::Challenge,
            AuditDecision::Granted,
            AuditDecision::Revoked,
        ] {
            assert_eq!(decision_from_str(decision_as_str(d)).unwrap(), d);
        }
    }

    #[test]
    fn risk_level_round_trips_through_str() {
        for r in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical] {
            assert_eq!(risk_level_from_str(risk_level_as_str(r)).unwrap(), r);
        }
    }
}
