//! Repository contracts (§9). Every method takes the ambient `TenantScope`
//! so implementations can enforce row-visibility without core logic ever
//! constructing a raw SQL predicate itself (Testable Property 1).

use async_trait::async_trait;

use schema_types::alerts::AuditAlert;
use schema_types::enums::{AlertSeverity, AlertStatus};
use schema_types::ids::{
    AlertId, DatasourceId, EntityAliasId, EntityId, EntityOccurrenceId, EntityRelationshipId,
    OntologyId, QueryId, RelationshipCandidateId, SchemaColumnId, SchemaRelationshipId,
    SchemaTableId, WorkflowId, WorkflowStateId,
};
use schema_types::knowledge::{KnowledgeFact, KnowledgeFactInput};
use schema_types::ontology::{
    EntityRelationship, Ontology, OntologyEntity, OntologyEntityAlias, OntologyEntityOccurrence,
    RelationshipCandidate,
};
use schema_types::query::Query;
use schema_types::schema::{SchemaColumn, SchemaRelationship, SchemaTable};
use schema_types::workflow::{OntologyWorkflow, WorkflowEntityState};

use crate::context::TenantScope;
use crate::error::Result;

#[async_trait]
pub trait SchemaRepository: Send + Sync {
    async fn list_tables(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<SchemaTable>>;
    async fn get_table(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<SchemaTable>;
    async fn upsert_table(&self, scope: &TenantScope, table: SchemaTable) -> Result<SchemaTable>;
    async fn list_columns(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>>;
    async fn get_column(&self, scope: &TenantScope, column_id: SchemaColumnId) -> Result<SchemaColumn>;
    async fn upsert_column(&self, scope: &TenantScope, column: SchemaColumn) -> Result<SchemaColumn>;
    async fn selected_tables(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<SchemaTable>>;
    async fn selected_columns(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>>;
}

#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    async fn list_relationships(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
    ) -> Result<Vec<SchemaRelationship>>;
    async fn upsert_relationship(
        &self,
        scope: &TenantScope,
        relationship: SchemaRelationship,
    ) -> Result<SchemaRelationship>;
    async fn soft_delete_relationship(&self, scope: &TenantScope, id: SchemaRelationshipId) -> Result<()>;

    async fn list_candidates(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<Vec<RelationshipCandidate>>;
    async fn upsert_candidate(
        &self,
        scope: &TenantScope,
        candidate: RelationshipCandidate,
    ) -> Result<RelationshipCandidate>;
    async fn get_candidate(
        &self,
        scope: &TenantScope,
        id: RelationshipCandidateId,
    ) -> Result<RelationshipCandidate>;

    async fn list_entity_relationships(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
    ) -> Result<Vec<EntityRelationship>>;
    async fn upsert_entity_relationship(
        &self,
        scope: &TenantScope,
        relationship: EntityRelationship,
    ) -> Result<EntityRelationship>;
}

#[async_trait]
pub trait OntologyRepository: Send + Sync {
    async fn get_active(&self, scope: &TenantScope) -> Result<Option<Ontology>>;
    async fn create_new_version(&self, scope: &TenantScope) -> Result<Ontology>;
    async fn deactivate_all(&self, scope: &TenantScope) -> Result<()>;
}

#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn list_entities(&self, scope: &TenantScope, ontology_id: OntologyId) -> Result<Vec<OntologyEntity>>;
    async fn get_entity(&self, scope: &TenantScope, id: EntityId) -> Result<OntologyEntity>;
    async fn find_by_primary_table(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
        schema_name: &str,
        table_name: &str,
    ) -> Result<Option<OntologyEntity>>;
    async fn find_by_name(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
        name: &str,
    ) -> Result<Option<OntologyEntity>>;
    async fn upsert_entity(&self, scope: &TenantScope, entity: OntologyEntity) -> Result<OntologyEntity>;
    async fn soft_delete_entity(&self, scope: &TenantScope, id: EntityId, reason: &str) -> Result<()>;

    async fn list_aliases(&self, scope: &TenantScope, entity_id: EntityId) -> Result<Vec<OntologyEntityAlias>>;
    async fn add_alias(&self, scope: &TenantScope, alias: OntologyEntityAlias) -> Result<EntityAliasId>;
    async fn transfer_aliases(&self, scope: &TenantScope, from: EntityId, to: EntityId) -> Result<u64>;

    async fn list_occurrences(&self, scope: &TenantScope, entity_id: EntityId) -> Result<Vec<OntologyEntityOccurrence>>;
    async fn add_occurrence(
        &self,
        scope: &TenantScope,
        occurrence: OntologyEntityOccurrence,
    ) -> Result<EntityOccurrenceId>;
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn create(&self, scope: &TenantScope, workflow: OntologyWorkflow) -> Result<OntologyWorkflow>;
    async fn get(&self, scope: &TenantScope, id: WorkflowId) -> Result<OntologyWorkflow>;
    async fn update(&self, scope: &TenantScope, workflow: OntologyWorkflow) -> Result<OntologyWorkflow>;
    async fn find_latest_for_phase(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
        phase: schema_types::enums::WorkflowPhase,
    ) -> Result<Option<OntologyWorkflow>>;
    async fn find_running_for_phase(
        &self,
        scope: &TenantScope,
        phase: schema_types::enums::WorkflowPhase,
    ) -> Result<Option<OntologyWorkflow>>;
    async fn list_running(&self, scope: &TenantScope) -> Result<Vec<OntologyWorkflow>>;
}

#[async_trait]
pub trait WorkflowStateRepository: Send + Sync {
    async fn seed(&self, scope: &TenantScope, rows: Vec<WorkflowEntityState>) -> Result<()>;
    async fn upsert(&self, scope: &TenantScope, row: WorkflowEntityState) -> Result<WorkflowEntityState>;
    async fn list_for_workflow(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<Vec<WorkflowEntityState>>;
    async fn delete_for_ontology(&self, scope: &TenantScope, ontology_id: OntologyId) -> Result<u64>;
    async fn delete_for_project_ontologies(&self, scope: &TenantScope) -> Result<u64>;
    async fn delete_for_workflow(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<u64>;
    async fn count_pending_questions(&self, scope: &TenantScope, workflow_id: WorkflowId) -> Result<u32>;
}

#[async_trait]
pub trait QueryRepository: Send + Sync {
    async fn get(&self, scope: &TenantScope, id: QueryId) -> Result<Query>;
    async fn list(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<Query>>;
    async fn insert(&self, scope: &TenantScope, query: Query) -> Result<Query>;
    async fn update(&self, scope: &TenantScope, query: Query) -> Result<Query>;
    async fn soft_delete(&self, scope: &TenantScope, id: QueryId) -> Result<()>;
    async fn list_pending_children(&self, scope: &TenantScope, parent_id: QueryId) -> Result<Vec<Query>>;
    async fn increment_usage(&self, scope: &TenantScope, id: QueryId) -> Result<()>;
}

#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    async fn upsert_fact(&self, scope: &TenantScope, fact: KnowledgeFactInput) -> Result<KnowledgeFact>;
    async fn list_facts(&self, scope: &TenantScope) -> Result<Vec<KnowledgeFact>>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, scope: &TenantScope, alert: AuditAlert) -> Result<AuditAlert>;
    async fn get(&self, scope: &TenantScope, id: AlertId) -> Result<AuditAlert>;
    async fn update(&self, scope: &TenantScope, alert: AuditAlert) -> Result<AuditAlert>;
    async fn list(
        &self,
        scope: &TenantScope,
        status: Option<AlertStatus>,
        severity: Option<AlertSeverity>,
    ) -> Result<Vec<AuditAlert>>;
}

/// Bag of free-form MCP server configuration per project (names, endpoints,
/// scopes). Concrete shape is an external collaborator concern (§1); core
/// logic only needs to read/write the opaque bag.
#[async_trait]
pub trait MCPConfigRepository: Send + Sync {
    async fn get_config(&self, scope: &TenantScope) -> Result<serde_json::Value>;
    async fn set_config(&self, scope: &TenantScope, config: serde_json::Value) -> Result<()>;
}
