use authz_core::error::AuthzError;
use authz_core::models::{Entitlement, EntitlementStatus};
use authz_core::services::entitlement_service::EntitlementStore;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool, Row};
use uuid::Uuid;

pub struct EntitlementRepository {
    pool: Pool<MySql>,
}

impl EntitlementRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn row_to_entitlement(row: &sqlx::mysql::MySqlRow) -> Result<Entitlement, sqlx::Error> {
        let scopes_json: String = row.try_get("scopes")?;
        let scopes: Vec<String> = serde_json::from_str(&scopes_json).unwrap_or_default();
        let subject_type_str: String = row.try_get("subject_type")?;
        let status_str: String = row.try_get("status")?;

        Ok(Entitlement {
            id: row.try_get::<String, _>("id")?.parse().unwrap_or_default(),
            subject_type: match subject_type_str.as_str() {
                "SERVICE" => authz_core::models::SubjectType::Service,
                "THIRD_PARTY" => authz_core::models::SubjectType::ThirdParty,
                _ => authz_core::models::SubjectType::User,
            },
            subject_id: row
                .try_get::<String, _>("subject_id")?
                .parse()
                .unwrap_or_default(),
            resource_type: row.try_get("resource_type")?,
            resource_id: row.try_get("resource_id")?,
            scopes,
            status: match status_str.as_str() {
                "REVOKED" => EntitlementStatus::Revoked,
                "EXPIRED" => EntitlementStatus::Expired,
                "SUSPENDED" => EntitlementStatus::Suspended,
                _ => EntitlementStatus::Active,
            },
            valid_from: row.try_get("valid_from")?,
            valid_until: row.try_get("valid_until")?,
            granted_by: row
                .try_get::<String, _>("granted_by")?
                .parse()
                .unwrap_or_default(),
            grant_reason: row.try_get("grant_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            revoked_at: row.try_get("revoked_at")?,
        })
    }
}

#[async_trait::async_trait]
impl EntitlementStore for EntitlementRepository {
    async fn create(&self, entitlement: Entitlement) -> Result<Entitlement, AuthzError> {
        let subject_type_str = match entitlement.subject_type {
            authz_core::models::SubjectType::Service => "SERVICE",
            authz_core::models::SubjectType::ThirdParty => "THIRD_PARTY",
            authz_core::models::SubjectType::User => "USER",
        };
        let scopes_json = serde_json::to_string(&entitlement.scopes).map_err(AuthzError::from)?;

        sqlx::query(
            r#"
            INSERT INTO entitlements
                (id, subject_type, subject_id, resource_type, resource_id, scopes,
                 status, valid_from, valid_until, granted_by, grant_reason,
                 created_at, updated_at, revoked_at)
            VALUES (?, ?, ?, ?, ?, ?, 'ACTIVE', ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entitlement.id.to_string())
        .bind(subject_type_str)
        .bind(entitlement.subject_id.to_string())
        .bind(&entitlement.resource_type)
        .bind(&entitlement.resource_id)
        .bind(scopes_json)
        .bind(entitlement.valid_from)
        .bind(entitlement.valid_until)
        .bind(entitlement.granted_by.to_string())
        .bind(&entitlement.grant_reason)
        .bind(entitlement.created_at)
        .bind(entitlement.updated_at)
        .bind(entitlement.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthzError::StoreUnavailable(e.to_string()))?;

        Ok(entitlement)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Entitlement>, AuthzError> {
        let row = sqlx::query("SELECT * FROM entitlements WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthzError::StoreUnavailable(e.to_string()))?;

        row.as_ref()
            .map(Self::row_to_entitlement)
            .transpose()
            .map_err(|e| AuthzError::Internal(e.to_string()))
    }

    async fn list_for_subject(&self, subject_id: Uuid) -> Result<Vec<Entitlement>, AuthzError> {
        let rows = sqlx::query("SELECT * FROM entitlements WHERE subject_id = ?")
            .bind(subject_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthzError::StoreUnavailable(e.to_string()))?;

        rows.iter()
            .map(Self::row_to_entitlement)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuthzError::Internal(e.to_string()))
    }

    async fn put_status(
        &self,
        id: Uuid,
        status: EntitlementStatus,
        revoked_at: Option<DateTime<Utc>>,
    ) -> Result<Entitlement, AuthzError> {
        let status_str = match status {
            EntitlementStatus::Active => "ACTIVE",
            EntitlementStatus::Revoked => "REVOKED",
            EntitlementStatus::Expired => "EXPIRED",
            EntitlementStatus::Suspended => "SUSPENDED",
        };

        sqlx::query(
            "UPDATE entitlements SET status = ?, revoked_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status_str)
        .bind(revoked_at)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AuthzError::StoreUnavailable(e.to_string()))?;

        self.get(id)
            .await?
            .ok_or_else(|| AuthzError::Internal(format!("entitlement {id} vanished after update")))
    }
}
