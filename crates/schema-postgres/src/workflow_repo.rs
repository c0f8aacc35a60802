//! `WorkflowRepository` — the extraction-workflow row lifecycle (§4.2, §5, §9).

use async_trait::async_trait;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::WorkflowRepository;
use schema_types::enums::WorkflowPhase;
use schema_types::ids::{DatasourceId, WorkflowId};
use schema_types::workflow::OntologyWorkflow;

use crate::support::map_sqlx;
use crate::sqlx_types::PgWorkflowRow;

pub struct PgWorkflowRepository {
    pool: PgPool,
}

impl PgWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const WORKFLOW_COLUMNS: &str = "id, project_id, ontology_id, phase, state, \
    progress_current, progress_total, progress_message, task_queue, datasource_id, \
    failing_task, created_at, updated_at";

#[async_trait]
impl WorkflowRepository for PgWorkflowRepository {
    async fn create(&self, scope: &TenantScope, workflow: OntologyWorkflow) -> Result<OntologyWorkflow> {
        let sql = format!(
            "INSERT INTO ontology_workflows ({WORKFLOW_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {WORKFLOW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgWorkflowRow>(&sql)
            .bind(workflow.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(workflow.ontology_id.as_uuid())
            .bind(workflow.phase.to_db())
            .bind(workflow.state.to_db())
            .bind(workflow.progress.current as i32)
            .bind(workflow.progress.total as i32)
            .bind(&workflow.progress.message)
            .bind(&workflow.task_queue)
            .bind(workflow.datasource_id.as_uuid())
            .bind(&workflow.failing_task)
            .bind(workflow.created_at)
            .bind(workflow.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("create_workflow"))?;
        row.try_into()
    }

    async fn get(&self, scope: &TenantScope, id: WorkflowId) -> Result<OntologyWorkflow> {
        let sql = format!("SELECT {WORKFLOW_COLUMNS} FROM ontology_workflows WHERE project_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, PgWorkflowRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("get_workflow"))?;
        row.try_into()
    }

    async fn update(&self, scope: &TenantScope, workflow: OntologyWorkflow) -> Result<OntologyWorkflow> {
        let sql = format!(
            "UPDATE ontology_workflows SET \
               state = $3, progress_current = $4, progress_total = $5, progress_message = $6, \
               task_queue = $7, failing_task = $8, updated_at = now() \
             WHERE project_id = $1 AND id = $2 \
             RETURNING {WORKFLOW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgWorkflowRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(workflow.id.as_uuid())
            .bind(workflow.state.to_db())
            .bind(workflow.progress.current as i32)
            .bind(workflow.progress.total as i32)
            .bind(&workflow.progress.message)
            .bind(&workflow.task_queue)
            .bind(&workflow.failing_task)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("update_workflow"))?;
        row.try_into()
    }

    async fn find_latest_for_phase(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
        phase: WorkflowPhase,
    ) -> Result<Option<OntologyWorkflow>> {
        let sql = format!(
            "SELECT {WORKFLOW_COLUMNS} FROM ontology_workflows \
             WHERE project_id = $1 AND datasource_id = $2 AND phase = $3 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, PgWorkflowRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(datasource_id.as_uuid())
            .bind(phase.to_db())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx("find_latest_for_phase"))?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_running_for_phase(
        &self,
        scope: &TenantScope,
        phase: WorkflowPhase,
    ) -> Result<Option<OntologyWorkflow>> {
        let sql = format!(
            "SELECT {WORKFLOW_COLUMNS} FROM ontology_workflows \
             WHERE project_id = $1 AND phase = $2 AND state IN ('pending', 'running', 'paused_for_review') \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, PgWorkflowRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(phase.to_db())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx("find_running_for_phase"))?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_running(&self, scope: &TenantScope) -> Result<Vec<OntologyWorkflow>> {
        let sql = format!(
            "SELECT {WORKFLOW_COLUMNS} FROM ontology_workflows \
             WHERE project_id = $1 AND state IN ('pending', 'running', 'paused_for_review') \
             ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, PgWorkflowRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_running_workflows"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
