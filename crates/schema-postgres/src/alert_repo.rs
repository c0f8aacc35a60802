//! `AlertRepository` — audit/injection alerts raised by query execution
//! (§4.7, §9).

use async_trait::async_trait;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::AlertRepository;
use schema_types::alerts::AuditAlert;
use schema_types::enums::{AlertSeverity, AlertStatus};
use schema_types::ids::AlertId;

use crate::support::map_sqlx;
use crate::sqlx_types::PgAlertRow;

pub struct PgAlertRepository {
    pool: PgPool,
}

impl PgAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ALERT_COLUMNS: &str = "id, project_id, alert_type, severity, status, title, details, \
    resolved_by, resolved_at, resolution_notes, created_at, updated_at";

#[async_trait]
impl AlertRepository for PgAlertRepository {
    async fn insert(&self, scope: &TenantScope, alert: AuditAlert) -> Result<AuditAlert> {
        let sql = format!(
            "INSERT INTO audit_alerts ({ALERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {ALERT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgAlertRow>(&sql)
            .bind(alert.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(&alert.alert_type)
            .bind(alert.severity.to_db())
            .bind(alert.status.to_db())
            .bind(&alert.title)
            .bind(&alert.details)
            .bind(&alert.resolved_by)
            .bind(alert.resolved_at)
            .bind(&alert.resolution_notes)
            .bind(alert.created_at)
            .bind(alert.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("insert_alert"))?;
        row.try_into()
    }

    async fn get(&self, scope: &TenantScope, id: AlertId) -> Result<AuditAlert> {
        let sql = format!("SELECT {ALERT_COLUMNS} FROM audit_alerts WHERE project_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, PgAlertRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("get_alert"))?;
        row.try_into()
    }

    async fn update(&self, scope: &TenantScope, alert: AuditAlert) -> Result<AuditAlert> {
        let sql = format!(
            "UPDATE audit_alerts SET \
               status = $3, resolved_by = $4, resolved_at = $5, resolution_notes = $6, updated_at = now() \
             WHERE project_id = $1 AND id = $2 \
             RETURNING {ALERT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgAlertRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(alert.id.as_uuid())
            .bind(alert.status.to_db())
            .bind(&alert.resolved_by)
            .bind(alert.resolved_at)
            .bind(&alert.resolution_notes)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("update_alert"))?;
        row.try_into()
    }

    async fn list(
        &self,
        scope: &TenantScope,
        status: Option<AlertStatus>,
        severity: Option<AlertSeverity>,
    ) -> Result<Vec<AuditAlert>> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM audit_alerts \
             WHERE project_id = $1 \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::text IS NULL OR severity = $3) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, PgAlertRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(status.map(|s| s.to_db()))
            .bind(severity.map(|s| s.to_db()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_alerts"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
