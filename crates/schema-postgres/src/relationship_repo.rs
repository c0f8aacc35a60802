//! `RelationshipRepository` — physical relationships, discovery candidates,
//! and entity-level relationships (§9).

use async_trait::async_trait;
use sqlx::{types::Json as SqlxJson, PgPool};

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::RelationshipRepository;
use schema_types::ids::{
    DatasourceId, OntologyId, RelationshipCandidateId, SchemaRelationshipId, WorkflowId,
};
use schema_types::ontology::{EntityRelationship, RelationshipCandidate};
use schema_types::schema::SchemaRelationship;

use crate::support::map_sqlx;
use crate::sqlx_types::PgSchemaRelationshipRow;

pub struct PgRelationshipRepository {
    pool: PgPool,
}

impl PgRelationshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REL_COLUMNS: &str = "id, project_id, source_column_id, target_column_id, \
    relationship_type, cardinality, confidence, inference_method, metrics, \
    is_approved, is_validated, is_deleted, created_at, updated_at";

const REL_COLUMNS_QUALIFIED: &str = "r.id, r.project_id, r.source_column_id, r.target_column_id, \
    r.relationship_type, r.cardinality, r.confidence, r.inference_method, r.metrics, \
    r.is_approved, r.is_validated, r.is_deleted, r.created_at, r.updated_at";

#[async_trait]
impl RelationshipRepository for PgRelationshipRepository {
    async fn list_relationships(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
    ) -> Result<Vec<SchemaRelationship>> {
        let sql = format!(
            "SELECT {REL_COLUMNS_QUALIFIED} FROM schema_relationships r \
             JOIN schema_columns sc ON sc.id = r.source_column_id \
             JOIN schema_tables st ON st.id = sc.table_id \
             WHERE r.project_id = $1 AND st.datasource_id = $2 AND NOT r.is_deleted \
             ORDER BY r.created_at"
        );
        let rows = sqlx::query_as::<_, PgSchemaRelationshipRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(datasource_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_relationships"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_relationship(
        &self,
        scope: &TenantScope,
        relationship: SchemaRelationship,
    ) -> Result<SchemaRelationship> {
        let sql = format!(
            "INSERT INTO schema_relationships ({REL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (id) DO UPDATE SET \
               cardinality = EXCLUDED.cardinality, confidence = EXCLUDED.confidence, \
               metrics = EXCLUDED.metrics, is_approved = EXCLUDED.is_approved, \
               is_validated = EXCLUDED.is_validated, is_deleted = EXCLUDED.is_deleted, \
               updated_at = now() \
             RETURNING {REL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgSchemaRelationshipRow>(&sql)
            .bind(relationship.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(relationship.source_column_id.as_uuid())
            .bind(relationship.target_column_id.as_uuid())
            .bind(relationship.relationship_type.to_db())
            .bind(relationship.cardinality.to_db())
            .bind(relationship.confidence)
            .bind(relationship.inference_method.to_db())
            .bind(SqlxJson(relationship.metrics.clone()))
            .bind(relationship.is_approved)
            .bind(relationship.is_validated)
            .bind(relationship.is_deleted)
            .bind(relationship.created_at)
            .bind(relationship.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("upsert_relationship"))?;
        row.try_into()
    }

    async fn soft_delete_relationship(&self, scope: &TenantScope, id: SchemaRelationshipId) -> Result<()> {
        sqlx::query("UPDATE schema_relationships SET is_deleted = true, updated_at = now() WHERE project_id = $1 AND id = $2")
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("soft_delete_relationship"))?;
        Ok(())
    }

    async fn list_candidates(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<Vec<RelationshipCandidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT id, workflow_id, datasource_id, source_column_id, target_column_id, \
                    detection_method, confidence, metrics, cardinality, llm_reasoning, \
                    status, is_required, created_at, updated_at \
             FROM relationship_candidates \
             WHERE project_id = $1 AND workflow_id = $2 ORDER BY created_at",
        )
        .bind(scope.project_id().as_uuid())
        .bind(workflow_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx("list_candidates"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_candidate(
        &self,
        scope: &TenantScope,
        candidate: RelationshipCandidate,
    ) -> Result<RelationshipCandidate> {
        let row = sqlx::query_as::<_, CandidateRow>(
            "INSERT INTO relationship_candidates \
               (id, project_id, workflow_id, datasource_id, source_column_id, target_column_id, \
                detection_method, confidence, metrics, cardinality, llm_reasoning, status, \
                is_required, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO UPDATE SET \
               confidence = EXCLUDED.confidence, metrics = EXCLUDED.metrics, \
               cardinality = EXCLUDED.cardinality, llm_reasoning = EXCLUDED.llm_reasoning, \
               status = EXCLUDED.status, updated_at = now() \
             RETURNING id, workflow_id, datasource_id, source_column_id, target_column_id, \
                       detection_method, confidence, metrics, cardinality, llm_reasoning, \
                       status, is_required, created_at, updated_at",
        )
        .bind(candidate.id.as_uuid())
        .bind(scope.project_id().as_uuid())
        .bind(candidate.workflow_id.as_uuid())
        .bind(candidate.datasource_id.as_uuid())
        .bind(candidate.source_column_id.as_uuid())
        .bind(candidate.target_column_id.as_uuid())
        .bind(candidate.detection_method.to_db())
        .bind(candidate.confidence)
        .bind(SqlxJson(candidate.metrics.clone()))
        .bind(candidate.cardinality.to_db())
        .bind(&candidate.llm_reasoning)
        .bind(candidate.status.to_db())
        .bind(candidate.is_required)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("upsert_candidate"))?;
        row.try_into()
    }

    async fn get_candidate(&self, scope: &TenantScope, id: RelationshipCandidateId) -> Result<RelationshipCandidate> {
        let row = sqlx::query_as::<_, CandidateRow>(
            "SELECT id, workflow_id, datasource_id, source_column_id, target_column_id, \
                    detection_method, confidence, metrics, cardinality, llm_reasoning, \
                    status, is_required, created_at, updated_at \
             FROM relationship_candidates WHERE project_id = $1 AND id = $2",
        )
        .bind(scope.project_id().as_uuid())
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("get_candidate"))?;
        row.try_into()
    }

    async fn list_entity_relationships(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
    ) -> Result<Vec<EntityRelationship>> {
        let rows = sqlx::query_as::<_, EntityRelRow>(
            "SELECT id, project_id, ontology_id, source_entity_id, target_entity_id, \
                    source_column_table, source_column_name, target_column_table, target_column_name, \
                    detection_method, confidence, cardinality, created_at, updated_at \
             FROM entity_relationships WHERE project_id = $1 AND ontology_id = $2",
        )
        .bind(scope.project_id().as_uuid())
        .bind(ontology_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx("list_entity_relationships"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_entity_relationship(
        &self,
        scope: &TenantScope,
        relationship: EntityRelationship,
    ) -> Result<EntityRelationship> {
        let row = sqlx::query_as::<_, EntityRelRow>(
            "INSERT INTO entity_relationships \
               (id, project_id, ontology_id, source_entity_id, target_entity_id, \
                source_column_table, source_column_name, target_column_table, target_column_name, \
                detection_method, confidence, cardinality, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (id) DO UPDATE SET \
               source_entity_id = EXCLUDED.source_entity_id, target_entity_id = EXCLUDED.target_entity_id, \
               confidence = EXCLUDED.confidence, cardinality = EXCLUDED.cardinality, updated_at = now() \
             RETURNING id, project_id, ontology_id, source_entity_id, target_entity_id, \
                       source_column_table, source_column_name, target_column_table, target_column_name, \
                       detection_method, confidence, cardinality, created_at, updated_at",
        )
        .bind(relationship.id.as_uuid())
        .bind(scope.project_id().as_uuid())
        .bind(relationship.ontology_id.as_uuid())
        .bind(relationship.source_entity_id.as_uuid())
        .bind(relationship.target_entity_id.as_uuid())
        .bind(&relationship.source_column_table)
        .bind(&relationship.source_column_name)
        .bind(&relationship.target_column_table)
        .bind(&relationship.target_column_name)
        .bind(relationship.detection_method.to_db())
        .bind(relationship.confidence)
        .bind(relationship.cardinality.to_db())
        .bind(relationship.created_at)
        .bind(relationship.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("upsert_entity_relationship"))?;
        row.try_into()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    id: uuid::Uuid,
    workflow_id: uuid::Uuid,
    datasource_id: uuid::Uuid,
    source_column_id: uuid::Uuid,
    target_column_id: uuid::Uuid,
    detection_method: String,
    confidence: f64,
    metrics: serde_json::Value,
    cardinality: String,
    llm_reasoning: Option<String>,
    status: String,
    is_required: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<CandidateRow> for RelationshipCandidate {
    type Error = schema_core::error::SchemaIntelError;

    fn try_from(r: CandidateRow) -> Result<Self> {
        use schema_types::enums::{Cardinality, CandidateStatus, InferenceMethod};
        Ok(RelationshipCandidate {
            id: r.id.into(),
            workflow_id: r.workflow_id.into(),
            datasource_id: r.datasource_id.into(),
            source_column_id: r.source_column_id.into(),
            target_column_id: r.target_column_id.into(),
            detection_method: InferenceMethod::from_db(&r.detection_method)?,
            confidence: r.confidence,
            metrics: serde_json::from_value(r.metrics)
                .map_err(|e| schema_core::error::SchemaIntelError::Internal(anyhow::anyhow!(e)))?,
            cardinality: Cardinality::from_db(&r.cardinality)?,
            llm_reasoning: r.llm_reasoning,
            status: CandidateStatus::from_db(&r.status)?,
            is_required: r.is_required,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntityRelRow {
    id: uuid::Uuid,
    project_id: uuid::Uuid,
    ontology_id: uuid::Uuid,
    source_entity_id: uuid::Uuid,
    target_entity_id: uuid::Uuid,
    source_column_table: String,
    source_column_name: String,
    target_column_table: String,
    target_column_name: String,
    detection_method: String,
    confidence: f64,
    cardinality: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<EntityRelRow> for EntityRelationship {
    type Error = schema_core::error::SchemaIntelError;

    fn try_from(r: EntityRelRow) -> Result<Self> {
        use schema_types::enums::{Cardinality, InferenceMethod};
        Ok(EntityRelationship {
            id: r.id.into(),
            project_id: r.project_id.into(),
            ontology_id: r.ontology_id.into(),
            source_entity_id: r.source_entity_id.into(),
            target_entity_id: r.target_entity_id.into(),
            source_column_table: r.source_column_table,
            source_column_name: r.source_column_name,
            target_column_table: r.target_column_table,
            target_column_name: r.target_column_name,
            detection_method: InferenceMethod::from_db(&r.detection_method)?,
            confidence: r.confidence,
            cardinality: Cardinality::from_db(&r.cardinality)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
