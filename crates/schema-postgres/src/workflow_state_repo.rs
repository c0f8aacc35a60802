//! `WorkflowStateRepository` — per-entity progress rows (§3.1, §4.2, §9,
//! Testable Property 7).

use async_trait::async_trait;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::WorkflowStateRepository;
use schema_types::ids::{OntologyId, WorkflowId};
use schema_types::workflow::WorkflowEntityState;

use crate::support::map_sqlx;
use crate::sqlx_types::PgWorkflowStateRow;

pub struct PgWorkflowStateRepository {
    pool: PgPool,
}

impl PgWorkflowStateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const STATE_COLUMNS: &str = "id, project_id, ontology_id, workflow_id, entity_key, \
    status, error, last_update_at";

#[async_trait]
impl WorkflowStateRepository for PgWorkflowStateRepository {
    async fn seed(&self, scope: &TenantScope, rows: Vec<WorkflowEntityState>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx("seed:begin"))?;
        let sql = format!(
            "INSERT INTO workflow_entity_states ({STATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (workflow_id, entity_key) DO NOTHING"
        );
        for row in rows {
            sqlx::query(&sql)
                .bind(row.id.as_uuid())
                .bind(scope.project_id().as_uuid())
                .bind(row.ontology_id.as_uuid())
                .bind(row.workflow_id.as_uuid())
                .bind(&row.entity_key)
                .bind(row.status.to_db())
                .bind(&row.error)
                .bind(row.last_update_at)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx("seed:insert"))?;
        }
        tx.commit().await.map_err(map_sqlx("seed:commit"))?;
        Ok(())
    }

    async fn upsert(&self, scope: &TenantScope, row: WorkflowEntityState) -> Result<WorkflowEntityState> {
        let sql = format!(
            "INSERT INTO workflow_entity_states ({STATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (workflow_id, entity_key) DO UPDATE SET \
               status = EXCLUDED.status, error = EXCLUDED.error, last_update_at = now() \
             RETURNING {STATE_COLUMNS}"
        );
        let out = sqlx::query_as::<_, PgWorkflowStateRow>(&sql)
            .bind(row.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(row.ontology_id.as_uuid())
            .bind(row.workflow_id.as_uuid())
            .bind(&row.entity_key)
            .bind(row.status.to_db())
            .bind(&row.error)
            .bind(row.last_update_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("upsert_workflow_state"))?;
        out.try_into()
    }

    async fn list_for_workflow(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<Vec<WorkflowEntityState>> {
        let sql = format!(
            "SELECT {STATE_COLUMNS} FROM workflow_entity_states \
             WHERE project_id = $1 AND workflow_id = $2 ORDER BY entity_key"
        );
        let rows = sqlx::query_as::<_, PgWorkflowStateRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(workflow_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_for_workflow"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_for_ontology(&self, scope: &TenantScope, ontology_id: OntologyId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM workflow_entity_states WHERE project_id = $1 AND ontology_id = $2")
            .bind(scope.project_id().as_uuid())
            .bind(ontology_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("delete_for_ontology"))?;
        Ok(result.rows_affected())
    }

    async fn delete_for_project_ontologies(&self, scope: &TenantScope) -> Result<u64> {
        let result = sqlx::query("DELETE FROM workflow_entity_states WHERE project_id = $1")
            .bind(scope.project_id().as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("delete_for_project_ontologies"))?;
        Ok(result.rows_affected())
    }

    async fn delete_for_workflow(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM workflow_entity_states WHERE project_id = $1 AND workflow_id = $2")
            .bind(scope.project_id().as_uuid())
            .bind(workflow_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("delete_for_workflow"))?;
        Ok(result.rows_affected())
    }

    async fn count_pending_questions(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workflow_entity_states \
             WHERE project_id = $1 AND workflow_id = $2 AND status = 'pending'",
        )
        .bind(scope.project_id().as_uuid())
        .bind(workflow_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("count_pending_questions"))?;
        Ok(count.max(0) as u32)
    }
}
