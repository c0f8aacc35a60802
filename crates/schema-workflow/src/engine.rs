//! Per-project workflow orchestration (§4.2): `start_extraction`, `cancel`,
//! `status`, and resumption of `running` workflows after a restart.
//!
//! Composed from `Arc<dyn ...>` repository ports, never tied to Postgres
//! directly — mirrors the teacher's `WorkflowEngine` holding its
//! `WorkflowRepository`/`GuardEvaluator` collaborators by value/`Arc`
//! rather than depending on a concrete pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;

use schema_core::context::TenantScope;
use schema_core::error::{Result, ResultExt, SchemaIntelError};
use schema_core::ports::{OntologyRepository, SchemaRepository, WorkflowRepository, WorkflowStateRepository};
use schema_types::enums::{EntityStateStatus, WorkflowPhase, WorkflowState};
use schema_types::ids::{DatasourceId, WorkflowId};
use schema_types::workflow::{OntologyWorkflow, WorkflowEntityState, WorkflowProgress};

use crate::cancellation::CancellationToken;

#[derive(Debug, Clone)]
pub struct WorkflowStatusView {
    pub state: WorkflowState,
    pub phase: WorkflowPhase,
    pub progress: WorkflowProgress,
    pub pending_questions_count: u32,
}

pub struct WorkflowEngine {
    workflows: Arc<dyn WorkflowRepository>,
    workflow_state: Arc<dyn WorkflowStateRepository>,
    ontology: Arc<dyn OntologyRepository>,
    schema: Arc<dyn SchemaRepository>,
    tokens: Mutex<HashMap<WorkflowId, CancellationToken>>,
}

impl WorkflowEngine {
    pub fn new(
        workflows: Arc<dyn WorkflowRepository>,
        workflow_state: Arc<dyn WorkflowStateRepository>,
        ontology: Arc<dyn OntologyRepository>,
        schema: Arc<dyn SchemaRepository>,
    ) -> Self {
        Self {
            workflows,
            workflow_state,
            ontology,
            schema,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// §4.2/§5: a `relationships` workflow in state `completed` must already
    /// exist for this datasource, and no `ontology` workflow may already be
    /// `running` for the project, or the call fails outright.
    pub async fn start_extraction(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
    ) -> Result<OntologyWorkflow> {
        if self
            .workflows
            .find_running_for_phase(scope, WorkflowPhase::Ontology)
            .await
            .ctx("start_extraction")?
            .is_some()
        {
            return Err(SchemaIntelError::Conflict(
                "an ontology workflow is already running for this project".into(),
            ));
        }

        let prerequisite = self
            .workflows
            .find_latest_for_phase(scope, datasource_id, WorkflowPhase::Relationships)
            .await
            .ctx("start_extraction")?;
        match prerequisite {
            Some(wf) if wf.state == WorkflowState::Completed => {}
            _ => {
                return Err(SchemaIntelError::PreconditionFailed(
                    "a completed relationships workflow is required before ontology extraction".into(),
                ))
            }
        }

        self.ontology.deactivate_all(scope).await.ctx("start_extraction")?;
        let ontology = self.ontology.create_new_version(scope).await.ctx("start_extraction")?;
        self.workflow_state
            .delete_for_project_ontologies(scope)
            .await
            .ctx("start_extraction")?;

        let tables = self.schema.selected_tables(scope, datasource_id).await?;
        let workflow = OntologyWorkflow {
            id: WorkflowId::new(),
            project_id: scope.project_id(),
            ontology_id: ontology.id,
            phase: WorkflowPhase::Ontology,
            state: WorkflowState::Pending,
            progress: WorkflowProgress::zero(),
            task_queue: serde_json::json!([]),
            datasource_id,
            failing_task: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut seed_rows = vec![WorkflowEntityState::global(scope.project_id(), ontology.id, workflow.id)];
        for table in &tables {
            seed_rows.push(WorkflowEntityState::for_table(
                scope.project_id(),
                ontology.id,
                workflow.id,
                &table.table_name,
            ));
            let columns = self.schema.selected_columns(scope, table.id).await?;
            for column in columns {
                seed_rows.push(WorkflowEntityState::for_column(
                    scope.project_id(),
                    ontology.id,
                    workflow.id,
                    &table.table_name,
                    &column.column_name,
                ));
            }
        }

        let created = self.workflows.create(scope, workflow).await.ctx("start_extraction")?;
        self.workflow_state.seed(scope, seed_rows).await.ctx("start_extraction")?;

        let mut running = created.clone();
        running.state = WorkflowState::Running;
        running.updated_at = Utc::now();
        let running = self.workflows.update(scope, running).await.ctx("start_extraction")?;

        self.tokens.lock().unwrap().insert(running.id, CancellationToken::new());
        info!(workflow_id = %running.id, "ontology extraction started");
        Ok(running)
    }

    pub async fn cancel(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<()> {
        let mut workflow = self.workflows.get(scope, workflow_id).await.ctx("cancel")?;
        workflow.state = WorkflowState::Cancelled;
        workflow.updated_at = Utc::now();
        self.workflows.update(scope, workflow).await.ctx("cancel")?;

        if let Some(token) = self.tokens.lock().unwrap().get(&workflow_id) {
            token.cancel();
        }
        self.workflow_state
            .delete_for_workflow(scope, workflow_id)
            .await
            .ctx("cancel")?;
        Ok(())
    }

    pub async fn status(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<WorkflowStatusView> {
        let workflow = self.workflows.get(scope, workflow_id).await.ctx("status")?;
        let pending_questions_count = self
            .workflow_state
            .count_pending_questions(scope, workflow_id)
            .await
            .ctx("status")?;
        Ok(WorkflowStatusView {
            state: workflow.state,
            phase: workflow.phase,
            progress: workflow.progress,
            pending_questions_count,
        })
    }

    /// §4.2 resumption: every `running` workflow's `in_progress` entity
    /// states are reset to `pending` so the runner re-queues their tasks.
    /// Task-level idempotency is the task's own obligation, not this call's.
    pub async fn resume_running_workflows(&self, scope: &TenantScope) -> Result<Vec<WorkflowId>> {
        let running = self.workflows.list_running(scope).await.ctx("resume")?;
        let mut resumed = Vec::new();
        for workflow in running {
            let states = self
                .workflow_state
                .list_for_workflow(scope, workflow.id)
                .await
                .ctx("resume")?;
            for mut state in states {
                if state.status == EntityStateStatus::InProgress {
                    state.status = EntityStateStatus::Pending;
                    state.last_update_at = Utc::now();
                    self.workflow_state.upsert(scope, state).await.ctx("resume")?;
                }
            }
            self.tokens
                .lock()
                .unwrap()
                .entry(workflow.id)
                .or_insert_with(CancellationToken::new);
            resumed.push(workflow.id);
        }
        Ok(resumed)
    }

    pub fn cancellation_token(&self, workflow_id: WorkflowId) -> Option<CancellationToken> {
        self.tokens.lock().unwrap().get(&workflow_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    use schema_types::ids::{OntologyId, ProjectId, SchemaColumnId, SchemaTableId};
    use schema_types::ontology::Ontology;
    use schema_types::provenance::Provenance;
    use schema_types::schema::{SchemaColumn, SchemaTable};

    fn scope() -> TenantScope {
        TenantScope::new(ProjectId::new(), Provenance::manual("tester"))
    }

    fn ontology(project_id: schema_types::ids::ProjectId) -> Ontology {
        Ontology {
            id: OntologyId::new(),
            project_id,
            version: 1,
            is_active: true,
            domain_summary: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct FakeWorkflowRepo {
        workflows: StdMutex<Vec<OntologyWorkflow>>,
        latest_for_phase: Option<OntologyWorkflow>,
        running_for_phase: Option<OntologyWorkflow>,
    }

    #[async_trait]
    impl WorkflowRepository for FakeWorkflowRepo {
        async fn create(&self, _scope: &TenantScope, workflow: OntologyWorkflow) -> Result<OntologyWorkflow> {
            self.workflows.lock().unwrap().push(workflow.clone());
            Ok(workflow)
        }
        async fn get(&self, _scope: &TenantScope, id: WorkflowId) -> Result<OntologyWorkflow> {
            self.workflows
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.id == id)
                .cloned()
                .ok_or_else(|| SchemaIntelError::not_found("workflow"))
        }
        async fn update(&self, _scope: &TenantScope, workflow: OntologyWorkflow) -> Result<OntologyWorkflow> {
            let mut guard = self.workflows.lock().unwrap();
            if let Some(existing) = guard.iter_mut().find(|w| w.id == workflow.id) {
                *existing = workflow.clone();
            }
            Ok(workflow)
        }
        async fn find_latest_for_phase(
            &self,
            _scope: &TenantScope,
            _datasource_id: DatasourceId,
            _phase: WorkflowPhase,
        ) -> Result<Option<OntologyWorkflow>> {
            Ok(self.latest_for_phase.clone())
        }
        async fn find_running_for_phase(
            &self,
            _scope: &TenantScope,
            phase: WorkflowPhase,
        ) -> Result<Option<OntologyWorkflow>> {
            Ok(self
                .running_for_phase
                .clone()
                .filter(|w| w.phase == phase))
        }
        async fn list_running(&self, _scope: &TenantScope) -> Result<Vec<OntologyWorkflow>> {
            Ok(self
                .workflows
                .lock()
                .unwrap()
                .iter()
                .filter(|w| w.state == WorkflowState::Running)
                .cloned()
                .collect())
        }
    }

    struct FakeWorkflowStateRepo {
        rows: StdMutex<Vec<WorkflowEntityState>>,
    }

    #[async_trait]
    impl WorkflowStateRepository for FakeWorkflowStateRepo {
        async fn seed(&self, _scope: &TenantScope, rows: Vec<WorkflowEntityState>) -> Result<()> {
            self.rows.lock().unwrap().extend(rows);
            Ok(())
        }
        async fn upsert(&self, _scope: &TenantScope, row: WorkflowEntityState) -> Result<WorkflowEntityState> {
            let mut guard = self.rows.lock().unwrap();
            if let Some(existing) = guard.iter_mut().find(|r| r.id == row.id) {
                *existing = row.clone();
            } else {
                guard.push(row.clone());
            }
            Ok(row)
        }
        async fn list_for_workflow(&self, _scope: &TenantScope, workflow_id: WorkflowId) -> Result<Vec<WorkflowEntityState>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.workflow_id == workflow_id)
                .cloned()
                .collect())
        }
        async fn delete_for_ontology(&self, _scope: &TenantScope, _ontology_id: schema_types::ids::OntologyId) -> Result<u64> {
            Ok(0)
        }
        async fn delete_for_project_ontologies(&self, _scope: &TenantScope) -> Result<u64> {
            Ok(0)
        }
        async fn delete_for_workflow(&self, _scope: &TenantScope, workflow_id: WorkflowId) -> Result<u64> {
            let mut guard = self.rows.lock().unwrap();
            let before = guard.len();
            guard.retain(|r| r.workflow_id != workflow_id);
            Ok((before - guard.len()) as u64)
        }
        async fn count_pending_questions(&self, _scope: &TenantScope, _workflow_id: WorkflowId) -> Result<u32> {
            Ok(0)
        }
    }

    struct FakeOntologyRepo {
        created: StdMutex<u32>,
    }

    #[async_trait]
    impl OntologyRepository for FakeOntologyRepo {
        async fn get_active(&self, _scope: &TenantScope) -> Result<Option<Ontology>> {
            Ok(None)
        }
        async fn create_new_version(&self, scope: &TenantScope) -> Result<Ontology> {
            *self.created.lock().unwrap() += 1;
            Ok(ontology(scope.project_id()))
        }
        async fn deactivate_all(&self, _scope: &TenantScope) -> Result<()> {
            Ok(())
        }
    }

    struct FakeSchemaRepo {
        tables: Vec<SchemaTable>,
        columns: std::collections::HashMap<SchemaTableId, Vec<SchemaColumn>>,
    }

    #[async_trait]
    impl SchemaRepository for FakeSchemaRepo {
        async fn list_tables(&self, _scope: &TenantScope, _datasource_id: DatasourceId) -> Result<Vec<SchemaTable>> {
            Ok(self.tables.clone())
        }
        async fn get_table(&self, _scope: &TenantScope, table_id: SchemaTableId) -> Result<SchemaTable> {
            self.tables
                .iter()
                .find(|t| t.id == table_id)
                .cloned()
                .ok_or_else(|| SchemaIntelError::not_found("table"))
        }
        async fn upsert_table(&self, _scope: &TenantScope, table: SchemaTable) -> Result<SchemaTable> {
            Ok(table)
        }
        async fn list_columns(&self, _scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>> {
            Ok(self.columns.get(&table_id).cloned().unwrap_or_default())
        }
        async fn get_column(&self, _scope: &TenantScope, column_id: SchemaColumnId) -> Result<SchemaColumn> {
            self.columns
                .values()
                .flatten()
                .find(|c| c.id == column_id)
                .cloned()
                .ok_or_else(|| SchemaIntelError::not_found("column"))
        }
        async fn upsert_column(&self, _scope: &TenantScope, column: SchemaColumn) -> Result<SchemaColumn> {
            Ok(column)
        }
        async fn selected_tables(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<SchemaTable>> {
            self.list_tables(scope, datasource_id).await
        }
        async fn selected_columns(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>> {
            self.list_columns(scope, table_id).await
        }
    }

    fn empty_schema() -> Arc<FakeSchemaRepo> {
        Arc::new(FakeSchemaRepo {
            tables: vec![],
            columns: std::collections::HashMap::new(),
        })
    }

    fn completed_relationships_workflow(datasource_id: DatasourceId, project_id: schema_types::ids::ProjectId) -> OntologyWorkflow {
        OntologyWorkflow {
            id: WorkflowId::new(),
            project_id,
            ontology_id: OntologyId::new(),
            phase: WorkflowPhase::Relationships,
            state: WorkflowState::Completed,
            progress: WorkflowProgress::zero(),
            task_queue: serde_json::json!([]),
            datasource_id,
            failing_task: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn start_extraction_fails_without_completed_relationships_workflow() {
        let engine = WorkflowEngine::new(
            Arc::new(FakeWorkflowRepo {
                workflows: StdMutex::new(vec![]),
                latest_for_phase: None,
                running_for_phase: None,
            }),
            Arc::new(FakeWorkflowStateRepo { rows: StdMutex::new(vec![]) }),
            Arc::new(FakeOntologyRepo { created: StdMutex::new(0) }),
            empty_schema(),
        );

        let err = engine
            .start_extraction(&scope(), DatasourceId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaIntelError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn start_extraction_fails_when_an_ontology_workflow_is_already_running() {
        let s = scope();
        let datasource_id = DatasourceId::new();
        let prerequisite = completed_relationships_workflow(datasource_id, s.project_id());
        let mut already_running = completed_relationships_workflow(DatasourceId::new(), s.project_id());
        already_running.phase = WorkflowPhase::Ontology;
        already_running.state = WorkflowState::Running;

        let engine = WorkflowEngine::new(
            Arc::new(FakeWorkflowRepo {
                workflows: StdMutex::new(vec![]),
                latest_for_phase: Some(prerequisite),
                running_for_phase: Some(already_running),
            }),
            Arc::new(FakeWorkflowStateRepo { rows: StdMutex::new(vec![]) }),
            Arc::new(FakeOntologyRepo { created: StdMutex::new(0) }),
            empty_schema(),
        );

        let err = engine.start_extraction(&s, datasource_id).await.unwrap_err();
        assert!(matches!(err, SchemaIntelError::Conflict(_)));
    }

    #[tokio::test]
    async fn start_extraction_seeds_global_and_table_states_then_runs() {
        let s = scope();
        let datasource_id = DatasourceId::new();
        let prerequisite = completed_relationships_workflow(datasource_id, s.project_id());

        let table = SchemaTable {
            id: SchemaTableId::new(),
            project_id: s.project_id(),
            datasource_id,
            schema_name: "public".into(),
            table_name: "orders".into(),
            row_count: Some(3),
            is_selected: true,
            business_name: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let column = SchemaColumn {
            id: SchemaColumnId::new(),
            project_id: s.project_id(),
            table_id: table.id,
            column_name: "id".into(),
            data_type: "uuid".into(),
            is_nullable: false,
            is_primary_key: true,
            ordinal_position: 1,
            is_selected: true,
            distinct_count: None,
            non_null_count: None,
            row_count_snapshot: None,
            is_joinable: Some(true),
            joinability_reason: Some(schema_types::schema::JoinabilityReason::Pk),
            business_name: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut columns = std::collections::HashMap::new();
        columns.insert(table.id, vec![column]);

        let workflow_repo = Arc::new(FakeWorkflowRepo {
            workflows: StdMutex::new(vec![]),
            latest_for_phase: Some(prerequisite),
            running_for_phase: None,
        });
        let state_repo = Arc::new(FakeWorkflowStateRepo { rows: StdMutex::new(vec![]) });
        let engine = WorkflowEngine::new(
            workflow_repo.clone(),
            state_repo.clone(),
            Arc::new(FakeOntologyRepo { created: StdMutex::new(0) }),
            Arc::new(FakeSchemaRepo {
                tables: vec![table],
                columns,
            }),
        );

        let created = engine.start_extraction(&s, datasource_id).await.unwrap();
        assert_eq!(created.state, WorkflowState::Running);

        let rows = state_repo.rows.lock().unwrap();
        assert!(rows.iter().any(|r| r.entity_key == "global"));
        assert!(rows.iter().any(|r| r.entity_key == "table:orders"));
        assert!(rows.iter().any(|r| r.entity_key == "column:orders.id"));
    }

    #[tokio::test]
    async fn cancel_marks_cancelled_and_clears_state() {
        let s = scope();
        let datasource_id = DatasourceId::new();
        let workflow = completed_relationships_workflow(datasource_id, s.project_id());
        let workflow_id = workflow.id;
        let mut running = workflow.clone();
        running.state = WorkflowState::Running;

        let state_row = WorkflowEntityState::global(s.project_id(), running.ontology_id, workflow_id);
        let workflow_repo = Arc::new(FakeWorkflowRepo {
            workflows: StdMutex::new(vec![running]),
            latest_for_phase: None,
            running_for_phase: None,
        });
        let state_repo = Arc::new(FakeWorkflowStateRepo {
            rows: StdMutex::new(vec![state_row]),
        });
        let engine = WorkflowEngine::new(
            workflow_repo.clone(),
            state_repo.clone(),
            Arc::new(FakeOntologyRepo { created: StdMutex::new(0) }),
            empty_schema(),
        );

        engine.cancel(&s, workflow_id).await.unwrap();
        let stored = workflow_repo.workflows.lock().unwrap();
        assert_eq!(stored[0].state, WorkflowState::Cancelled);
        assert!(state_repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resume_resets_in_progress_states_to_pending() {
        let s = scope();
        let datasource_id = DatasourceId::new();
        let mut workflow = completed_relationships_workflow(datasource_id, s.project_id());
        workflow.state = WorkflowState::Running;
        let workflow_id = workflow.id;

        let mut state_row = WorkflowEntityState::global(s.project_id(), workflow.ontology_id, workflow_id);
        state_row.status = EntityStateStatus::InProgress;

        let workflow_repo = Arc::new(FakeWorkflowRepo {
            workflows: StdMutex::new(vec![workflow]),
            latest_for_phase: None,
            running_for_phase: None,
        });
        let state_repo = Arc::new(FakeWorkflowStateRepo {
            rows: StdMutex::new(vec![state_row]),
        });
        let engine = WorkflowEngine::new(
            workflow_repo,
            state_repo.clone(),
            Arc::new(FakeOntologyRepo { created: StdMutex::new(0) }),
            empty_schema(),
        );

        let resumed = engine.resume_running_workflows(&s).await.unwrap();
        assert_eq!(resumed, vec![workflow_id]);
        let rows = state_repo.rows.lock().unwrap();
        assert_eq!(rows[0].status, EntityStateStatus::Pending);
    }
}
