//! Ontology model: entities, aliases, occurrences, entity-level relationships,
//! and the intermediate relationship candidates produced during discovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AliasSource, Cardinality, CandidateStatus, InferenceMethod};
use crate::ids::{
    DatasourceId, EntityAliasId, EntityId, EntityOccurrenceId, EntityRelationshipId, OntologyId,
    ProjectId, RelationshipCandidateId, SchemaColumnId, WorkflowId,
};
use crate::enums::ProvenanceSource;
use crate::schema::RelationshipMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ontology {
    pub id: OntologyId,
    pub project_id: ProjectId,
    pub version: i32,
    pub is_active: bool,
    pub domain_summary: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyEntity {
    pub id: EntityId,
    pub project_id: ProjectId,
    pub ontology_id: OntologyId,
    pub name: String,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub primary_schema: Option<String>,
    pub primary_table: Option<String>,
    pub primary_column: Option<String>,
    pub confidence: f64,
    pub is_stale: bool,
    pub is_promoted: bool,
    pub is_deleted: bool,
    pub deletion_reason: Option<String>,
    pub created_by: ProvenanceSource,
    pub updated_by: Option<ProvenanceSource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OntologyEntity {
    /// Effective source per §4.1: `updated_by` if set, else `created_by`.
    pub fn effective_source(&self) -> ProvenanceSource {
        self.updated_by.unwrap_or(self.created_by)
    }

    pub fn has_primary_table(&self) -> bool {
        self.primary_schema.is_some() && self.primary_table.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyEntityAlias {
    pub id: EntityAliasId,
    pub entity_id: EntityId,
    pub alias_text: String,
    pub source: AliasSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyEntityOccurrence {
    pub id: EntityOccurrenceId,
    pub entity_id: EntityId,
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub id: EntityRelationshipId,
    pub project_id: ProjectId,
    pub ontology_id: OntologyId,
    pub source_entity_id: EntityId,
    pub target_entity_id: EntityId,
    pub source_column_table: String,
    pub source_column_name: String,
    pub target_column_table: String,
    pub target_column_name: String,
    pub detection_method: InferenceMethod,
    pub confidence: f64,
    pub cardinality: Cardinality,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityRelationship {
    /// True if this edge touches the given entity on either side — used by
    /// merge redirection (§4.5 step 5), which must walk edges via the store
    /// rather than pointer-chasing a possibly-cyclic entity graph.
    pub fn touches(&self, entity_id: EntityId) -> bool {
        self.source_entity_id == entity_id || self.target_entity_id == entity_id
    }

    pub fn redirect(&mut self, from: EntityId, to: EntityId) {
        if self.source_entity_id == from {
            self.source_entity_id = to;
        }
        if self.target_entity_id == from {
            self.target_entity_id = to;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipCandidate {
    pub id: RelationshipCandidateId,
    pub workflow_id: WorkflowId,
    pub datasource_id: DatasourceId,
    pub source_column_id: SchemaColumnId,
    pub target_column_id: SchemaColumnId,
    pub detection_method: InferenceMethod,
    pub confidence: f64,
    pub metrics: RelationshipMetrics,
    pub cardinality: Cardinality,
    pub llm_reasoning: Option<String>,
    pub status: CandidateStatus,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_source_prefers_updated_by() {
        let mut entity = sample_entity();
        entity.created_by = ProvenanceSource::Inferred;
        entity.updated_by = Some(ProvenanceSource::Manual);
        assert_eq!(entity.effective_source(), ProvenanceSource::Manual);

        entity.updated_by = None;
        assert_eq!(entity.effective_source(), ProvenanceSource::Inferred);
    }

    #[test]
    fn redirect_only_touches_matching_side() {
        let mut rel = sample_relationship();
        let from = rel.source_entity_id;
        let to = EntityId::new();
        let untouched_target = rel.target_entity_id;
        rel.redirect(from, to);
        assert_eq!(rel.source_entity_id, to);
        assert_eq!(rel.target_entity_id, untouched_target);
    }

    fn sample_entity() -> OntologyEntity {
        OntologyEntity {
            id: EntityId::new(),
            project_id: ProjectId::new(),
            ontology_id: OntologyId::new(),
            name: "User".into(),
            description: None,
            domain: None,
            primary_schema: None,
            primary_table: None,
            primary_column: None,
            confidence: 0.9,
            is_stale: false,
            is_promoted: true,
            is_deleted: false,
            deletion_reason: None,
            created_by: ProvenanceSource::Inferred,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_relationship() -> EntityRelationship {
        EntityRelationship {
            id: EntityRelationshipId::new(),
            project_id: ProjectId::new(),
            ontology_id: OntologyId::new(),
            source_entity_id: EntityId::new(),
            target_entity_id: EntityId::new(),
            source_column_table: "orders".into(),
            source_column_name: "user_id".into(),
            target_column_table: "users".into(),
            target_column_name: "id".into(),
            detection_method: InferenceMethod::ForeignKey,
            confidence: 1.0,
            cardinality: Cardinality::ManyToOne,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
