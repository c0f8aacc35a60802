//! Workflow engine row types (§3.1, §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::enums::{EntityStateStatus, WorkflowPhase, WorkflowState};
use crate::ids::{DatasourceId, OntologyId, ProjectId, WorkflowId, WorkflowStateId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub current: u32,
    pub total: u32,
    pub message: String,
}

impl WorkflowProgress {
    pub fn zero() -> Self {
        Self {
            current: 0,
            total: 0,
            message: String::new(),
        }
    }

    /// Percentage complete over non-skipped entities (§4.2).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyWorkflow {
    pub id: WorkflowId,
    pub project_id: ProjectId,
    pub ontology_id: OntologyId,
    pub phase: WorkflowPhase,
    pub state: WorkflowState,
    pub progress: WorkflowProgress,
    /// Serialized task DAG — a persistent table, not a transient in-memory
    /// channel, per §5.
    pub task_queue: Json,
    pub datasource_id: DatasourceId,
    pub failing_task: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per domain entity touched by a workflow: `global`, `table:<t>`,
/// or `column:<t>.<c>` (§3.1, Testable Property 7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEntityState {
    pub id: WorkflowStateId,
    pub project_id: ProjectId,
    pub ontology_id: OntologyId,
    pub workflow_id: WorkflowId,
    pub entity_key: String,
    pub status: EntityStateStatus,
    pub error: Option<String>,
    pub last_update_at: DateTime<Utc>,
}

impl WorkflowEntityState {
    pub fn global(project_id: ProjectId, ontology_id: OntologyId, workflow_id: WorkflowId) -> Self {
        Self::new(project_id, ontology_id, workflow_id, "global".to_string())
    }

    pub fn for_table(
        project_id: ProjectId,
        ontology_id: OntologyId,
        workflow_id: WorkflowId,
        table_name: &str,
    ) -> Self {
        Self::new(
            project_id,
            ontology_id,
            workflow_id,
            format!("table:{table_name}"),
        )
    }

    pub fn for_column(
        project_id: ProjectId,
        ontology_id: OntologyId,
        workflow_id: WorkflowId,
        table_name: &str,
        column_name: &str,
    ) -> Self {
        Self::new(
            project_id,
            ontology_id,
            workflow_id,
            format!("column:{table_name}.{column_name}"),
        )
    }

    fn new(project_id: ProjectId, ontology_id: OntologyId, workflow_id: WorkflowId, entity_key: String) -> Self {
        Self {
            id: WorkflowStateId::new(),
            project_id,
            ontology_id,
            workflow_id,
            entity_key,
            status: EntityStateStatus::Pending,
            error: None,
            last_update_at: Utc::now(),
        }
    }
}
