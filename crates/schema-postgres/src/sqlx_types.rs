//! `sqlx::FromRow` row shapes plus `TryFrom` conversions into the
//! `schema-types` domain structs. Enum columns are stored as `text` and
//! converted through `crate::support::db_enum` rather than Postgres native
//! enum types, so the row structs below only ever carry strings for them.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use sqlx::FromRow;
use uuid::Uuid;

use schema_core::error::SchemaIntelError;
use schema_types::alerts::AuditAlert;
use schema_types::enums::{AlertSeverity, AlertStatus, FactType};
use schema_types::ids::{AlertId, ProjectId, WorkflowStateId};
use schema_types::knowledge::KnowledgeFact;
use schema_types::query::{OutputColumn, Query, QueryParameter};
use schema_types::schema::{JoinabilityReason, RelationshipMetrics, SchemaColumn, SchemaRelationship, SchemaTable};
use schema_types::workflow::{OntologyWorkflow, WorkflowEntityState, WorkflowProgress};

#[derive(Debug, FromRow)]
pub struct PgSchemaTableRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub datasource_id: Uuid,
    pub schema_name: String,
    pub table_name: String,
    pub row_count: Option<i64>,
    pub is_selected: bool,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PgSchemaTableRow> for SchemaTable {
    fn from(r: PgSchemaTableRow) -> Self {
        SchemaTable {
            id: r.id.into(),
            project_id: r.project_id.into(),
            datasource_id: r.datasource_id.into(),
            schema_name: r.schema_name,
            table_name: r.table_name,
            row_count: r.row_count,
            is_selected: r.is_selected,
            business_name: r.business_name,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgSchemaColumnRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub table_id: Uuid,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub ordinal_position: i32,
    pub is_selected: bool,
    pub distinct_count: Option<i64>,
    pub non_null_count: Option<i64>,
    pub row_count_snapshot: Option<i64>,
    pub is_joinable: Option<bool>,
    pub joinability_reason: Option<String>,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgSchemaColumnRow> for SchemaColumn {
    type Error = SchemaIntelError;

    fn try_from(r: PgSchemaColumnRow) -> Result<Self, Self::Error> {
        let joinability_reason = r
            .joinability_reason
            .map(|s| match s.as_str() {
                "pk" => Ok(JoinabilityReason::Pk),
                "statistical" => Ok(JoinabilityReason::Statistical),
                "excluded" => Ok(JoinabilityReason::Excluded),
                other => Err(SchemaIntelError::Internal(anyhow::anyhow!(
                    "unrecognized joinability_reason {other:?}"
                ))),
            })
            .transpose()?;
        Ok(SchemaColumn {
            id: r.id.into(),
            project_id: r.project_id.into(),
            table_id: r.table_id.into(),
            column_name: r.column_name,
            data_type: r.data_type,
            is_nullable: r.is_nullable,
            is_primary_key: r.is_primary_key,
            ordinal_position: r.ordinal_position,
            is_selected: r.is_selected,
            distinct_count: r.distinct_count,
            non_null_count: r.non_null_count,
            row_count_snapshot: r.row_count_snapshot,
            is_joinable: r.is_joinable,
            joinability_reason,
            business_name: r.business_name,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PgSchemaRelationshipRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub source_column_id: Uuid,
    pub target_column_id: Uuid,
    pub relationship_type: String,
    pub cardinality: String,
    pub confidence: f64,
    pub inference_method: String,
    pub metrics: Json,
    pub is_approved: Option<bool>,
    pub is_validated: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgSchemaRelationshipRow> for SchemaRelationship {
    type Error = SchemaIntelError;

    fn try_from(r: PgSchemaRelationshipRow) -> Result<Self, Self::Error> {
        use schema_types::enums::{Cardinality, InferenceMethod, RelationshipType};
        let relationship_type = RelationshipType::from_db(&r.relationship_type)?;
        let cardinality = Cardinality::from_db(&r.cardinality)?;
        let inference_method = InferenceMethod::from_db(&r.inference_method)?;
        let metrics: RelationshipMetrics = serde_json::from_value(r.metrics)
            .map_err(|e| SchemaIntelError::Internal(anyhow::anyhow!(e)))?;
        Ok(SchemaRelationship {
            id: r.id.into(),
            project_id: r.project_id.into(),
            source_column_id: r.source_column_id.into(),
            target_column_id: r.target_column_id.into(),
            relationship_type,
            cardinality,
            confidence: r.confidence,
            inference_method,
            metrics,
            is_approved: r.is_approved,
            is_validated: r.is_validated,
            is_deleted: r.is_deleted,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PgWorkflowRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub ontology_id: Uuid,
    pub phase: String,
    pub state: String,
    pub progress_current: i32,
    pub progress_total: i32,
    pub progress_message: String,
    pub task_queue: Json,
    pub datasource_id: Uuid,
    pub failing_task: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgWorkflowRow> for OntologyWorkflow {
    type Error = SchemaIntelError;

    fn try_from(r: PgWorkflowRow) -> Result<Self, Self::Error> {
        use schema_types::enums::{WorkflowPhase, WorkflowState};
        Ok(OntologyWorkflow {
            id: r.id.into(),
            project_id: r.project_id.into(),
            ontology_id: r.ontology_id.into(),
            phase: WorkflowPhase::from_db(&r.phase)?,
            state: WorkflowState::from_db(&r.state)?,
            progress: WorkflowProgress {
                current: r.progress_current.max(0) as u32,
                total: r.progress_total.max(0) as u32,
                message: r.progress_message,
            },
            task_queue: r.task_queue,
            datasource_id: r.datasource_id.into(),
            failing_task: r.failing_task,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PgWorkflowStateRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub ontology_id: Uuid,
    pub workflow_id: Uuid,
    pub entity_key: String,
    pub status: String,
    pub error: Option<String>,
    pub last_update_at: DateTime<Utc>,
}

impl TryFrom<PgWorkflowStateRow> for WorkflowEntityState {
    type Error = SchemaIntelError;

    fn try_from(r: PgWorkflowStateRow) -> Result<Self, Self::Error> {
        use schema_types::enums::EntityStateStatus;
        Ok(WorkflowEntityState {
            id: WorkflowStateId::from_uuid(r.id),
            project_id: r.project_id.into(),
            ontology_id: r.ontology_id.into(),
            workflow_id: r.workflow_id.into(),
            entity_key: r.entity_key,
            status: EntityStateStatus::from_db(&r.status)?,
            error: r.error,
            last_update_at: r.last_update_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PgQueryRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub datasource_id: Uuid,
    pub natural_language_prompt: Option<String>,
    pub additional_context: Option<String>,
    pub sql_query: String,
    pub dialect: String,
    pub is_enabled: bool,
    pub parameters: Json,
    pub output_columns: Json,
    pub tags: Vec<String>,
    pub status: String,
    pub suggested_by: Option<String>,
    pub suggestion_context: Option<String>,
    pub parent_query_id: Option<Uuid>,
    pub allows_modification: bool,
    pub usage_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgQueryRow> for Query {
    type Error = SchemaIntelError;

    fn try_from(r: PgQueryRow) -> Result<Self, Self::Error> {
        use schema_types::enums::QueryStatus;
        let parameters: Vec<QueryParameter> = serde_json::from_value(r.parameters)
            .map_err(|e| SchemaIntelError::Internal(anyhow::anyhow!(e)))?;
        let output_columns: Vec<OutputColumn> = serde_json::from_value(r.output_columns)
            .map_err(|e| SchemaIntelError::Internal(anyhow::anyhow!(e)))?;
        Ok(Query {
            id: r.id.into(),
            project_id: r.project_id.into(),
            datasource_id: r.datasource_id.into(),
            natural_language_prompt: r.natural_language_prompt,
            additional_context: r.additional_context,
            sql_query: r.sql_query,
            dialect: r.dialect,
            is_enabled: r.is_enabled,
            parameters,
            output_columns,
            tags: r.tags,
            status: QueryStatus::from_db(&r.status)?,
            suggested_by: r.suggested_by,
            suggestion_context: r.suggestion_context,
            parent_query_id: r.parent_query_id.map(Into::into),
            allows_modification: r.allows_modification,
            usage_count: r.usage_count,
            is_deleted: r.is_deleted,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PgAlertRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub status: String,
    pub title: String,
    pub details: Json,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgAlertRow> for AuditAlert {
    type Error = SchemaIntelError;

    fn try_from(r: PgAlertRow) -> Result<Self, Self::Error> {
        Ok(AuditAlert {
            id: AlertId::from_uuid(r.id),
            project_id: ProjectId::from_uuid(r.project_id),
            alert_type: r.alert_type,
            severity: AlertSeverity::parse(&r.severity).ok_or_else(|| {
                SchemaIntelError::Internal(anyhow::anyhow!("bad alert severity {}", r.severity))
            })?,
            status: AlertStatus::parse(&r.status).ok_or_else(|| {
                SchemaIntelError::Internal(anyhow::anyhow!("bad alert status {}", r.status))
            })?,
            title: r.title,
            details: r.details,
            resolved_by: r.resolved_by,
            resolved_at: r.resolved_at,
            resolution_notes: r.resolution_notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PgKnowledgeFactRow {
    pub project_id: Uuid,
    pub fact_type: String,
    pub key: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgKnowledgeFactRow> for KnowledgeFact {
    type Error = SchemaIntelError;

    fn try_from(r: PgKnowledgeFactRow) -> Result<Self, Self::Error> {
        let fact_type = match r.fact_type.as_str() {
            "terminology" => FactType::Terminology,
            "business_rule" => FactType::BusinessRule,
            "convention" => FactType::Convention,
            other => {
                return Err(SchemaIntelError::Internal(anyhow::anyhow!(
                    "bad fact_type {other}"
                )))
            }
        };
        Ok(KnowledgeFact {
            project_id: ProjectId::from_uuid(r.project_id),
            fact_type,
            key: r.key,
            context: r.context,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
