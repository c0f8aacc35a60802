//! `DiscoveryService` — the three-stage relationship discovery pipeline
//! (§4.3): FK import, PK-match inference, review-candidate materialization.

use std::sync::Arc;

use tracing::{info, warn};

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::SchemaDiscoverer;
use schema_core::ports::{RelationshipRepository, SchemaRepository};
use schema_types::enums::{Cardinality, CandidateStatus, InferenceMethod, RelationshipType};
use schema_types::ids::{DatasourceId, WorkflowId};
use schema_types::ontology::RelationshipCandidate;
use schema_types::schema::{RelationshipMetrics, SchemaColumn, SchemaRelationship};

use crate::exclusion::is_pk_match_excluded;
use crate::metrics::{
    accepts_as_inferred, match_rate, meets_pk_match_thresholds, resolve_cardinality,
    should_discard_as_false_positive,
};

pub struct DiscoveryService {
    schema: Arc<dyn SchemaRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    discoverer: Arc<dyn SchemaDiscoverer>,
}

/// Outcome of a full discovery run over one datasource, returned for logging
/// and for the workflow engine's progress bookkeeping.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub fk_imported: u32,
    pub inferred_accepted: u32,
    pub review_candidates: u32,
    pub discarded_false_positives: u32,
}

impl DiscoveryService {
    pub fn new(
        schema: Arc<dyn SchemaRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        discoverer: Arc<dyn SchemaDiscoverer>,
    ) -> Self {
        Self {
            schema,
            relationships,
            discoverer,
        }
    }

    /// Stage A (§4.3): import every DB-declared foreign key verbatim. A
    /// no-op when the adapter doesn't support FK introspection.
    pub async fn import_foreign_keys(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
    ) -> Result<u32> {
        if !self.discoverer.supports_foreign_keys() {
            return Ok(0);
        }
        let foreign_keys = self.discoverer.discover_foreign_keys().await?;
        let tables = self.schema.list_tables(scope, datasource_id).await?;
        let mut imported = 0u32;

        for fk in foreign_keys {
            let Some(source_table) = tables
                .iter()
                .find(|t| t.schema_name == fk.source_schema && t.table_name == fk.source_table)
            else {
                continue;
            };
            let Some(target_table) = tables
                .iter()
                .find(|t| t.schema_name == fk.target_schema && t.table_name == fk.target_table)
            else {
                continue;
            };
            let source_columns = self.schema.list_columns(scope, source_table.id).await?;
            let target_columns = self.schema.list_columns(scope, target_table.id).await?;
            let Some(source_column) = source_columns.iter().find(|c| c.column_name == fk.source_column) else {
                continue;
            };
            let Some(target_column) = target_columns.iter().find(|c| c.column_name == fk.target_column) else {
                continue;
            };

            let relationship = SchemaRelationship {
                id: schema_types::ids::SchemaRelationshipId::new(),
                project_id: scope.project_id(),
                source_column_id: source_column.id,
                target_column_id: target_column.id,
                relationship_type: RelationshipType::ForeignKey,
                cardinality: Cardinality::ManyToOne,
                confidence: 1.0,
                inference_method: InferenceMethod::ForeignKey,
                metrics: RelationshipMetrics::default(),
                is_approved: Some(true),
                is_validated: true,
                is_deleted: false,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            self.relationships.upsert_relationship(scope, relationship).await?;
            imported += 1;
        }

        info!(datasource_id = %datasource_id, imported, "stage A: foreign keys imported");
        Ok(imported)
    }

    /// Stage B + C (§4.3): PK-match inference over statistically joinable
    /// columns, emitting accepted inferences, review candidates, or nothing
    /// (false positives discarded before they ever reach a candidate row).
    pub async fn infer_relationships(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
        workflow_id: WorkflowId,
    ) -> Result<DiscoveryOutcome> {
        let tables = self.schema.selected_tables(scope, datasource_id).await?;
        let mut candidates: Vec<(schema_types::ids::SchemaTableId, SchemaColumn)> = Vec::new();

        for table in &tables {
            let columns = self.schema.selected_columns(scope, table.id).await?;
            for column in columns {
                if is_pk_match_excluded(&column.column_name) {
                    continue;
                }
                if !meets_pk_match_thresholds(column.is_joinable, column.distinct_count, table.row_count) {
                    continue;
                }
                candidates.push((table.id, column));
            }
        }

        let mut outcome = DiscoveryOutcome::default();

        for i in 0..candidates.len() {
            for j in 0..candidates.len() {
                if i == j {
                    continue;
                }
                let (source_table_id, source_column) = &candidates[i];
                let (target_table_id, target_column) = &candidates[j];
                if source_column.data_type != target_column.data_type {
                    continue;
                }
                if !target_column.is_primary_key && !meets_pk_match_thresholds(
                    target_column.is_joinable,
                    target_column.distinct_count,
                    tables.iter().find(|t| &t.id == target_table_id).and_then(|t| t.row_count),
                ) {
                    continue;
                }

                let source_table = tables.iter().find(|t| &t.id == source_table_id).expect("source table loaded");
                let target_table = tables.iter().find(|t| &t.id == target_table_id).expect("target table loaded");

                let analysis = self
                    .discoverer
                    .analyze_join(
                        (&source_table.schema_name, &source_table.table_name, &source_column.column_name),
                        (&target_table.schema_name, &target_table.table_name, &target_column.column_name),
                    )
                    .await?;

                if should_discard_as_false_positive(&analysis) {
                    outcome.discarded_false_positives += 1;
                    continue;
                }

                let status = if accepts_as_inferred(&analysis) {
                    CandidateStatus::Accepted
                } else {
                    CandidateStatus::Pending
                };
                let cardinality = resolve_cardinality(&analysis, status == CandidateStatus::Accepted);
                let metrics = RelationshipMetrics {
                    match_rate: Some(match_rate(&analysis)),
                    source_distinct: Some(analysis.source_distinct),
                    target_distinct: Some(analysis.target_distinct),
                    matched_count: Some(analysis.source_matched),
                    orphan_count: Some(analysis.orphan_count),
                    reverse_orphan_count: Some(analysis.reverse_orphan_count),
                };
                let candidate = RelationshipCandidate {
                    id: schema_types::ids::RelationshipCandidateId::new(),
                    workflow_id,
                    datasource_id,
                    source_column_id: source_column.id,
                    target_column_id: target_column.id,
                    detection_method: InferenceMethod::PkMatch,
                    confidence: match_rate(&analysis),
                    metrics,
                    cardinality,
                    llm_reasoning: None,
                    status,
                    is_required: status == CandidateStatus::Pending,
                    created_at: chrono::Utc::now(),
                    updated_at: chrono::Utc::now(),
                };
                self.relationships.upsert_candidate(scope, candidate).await?;

                match status {
                    CandidateStatus::Accepted => outcome.inferred_accepted += 1,
                    _ => outcome.review_candidates += 1,
                }
            }
        }

        if outcome.review_candidates > 0 {
            warn!(
                datasource_id = %datasource_id,
                count = outcome.review_candidates,
                "stage C: review candidates require manual or LLM triage"
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use schema_core::error::SchemaIntelError;
    use schema_core::ports::{
        ColumnMetadata, ColumnStats, ForeignKeyMetadata, JoinAnalysis, TableMetadata,
        ValueOverlapResult,
    };
    use schema_types::ids::{ProjectId, SchemaColumnId, SchemaTableId};
    use schema_types::provenance::Provenance;
    use std::sync::Mutex;

    struct FakeDiscoverer {
        foreign_keys: Vec<ForeignKeyMetadata>,
        join: JoinAnalysis,
    }

    #[async_trait]
    impl SchemaDiscoverer for FakeDiscoverer {
        async fn discover_tables(&self) -> Result<Vec<TableMetadata>> {
            Ok(vec![])
        }
        async fn discover_columns(&self, _schema: &str, _table: &str) -> Result<Vec<ColumnMetadata>> {
            Ok(vec![])
        }
        async fn discover_foreign_keys(&self) -> Result<Vec<ForeignKeyMetadata>> {
            Ok(self.foreign_keys.clone())
        }
        fn supports_foreign_keys(&self) -> bool {
            !self.foreign_keys.is_empty()
        }
        async fn analyze_column_stats(&self, _schema: &str, _table: &str, _columns: &[String]) -> Result<Vec<ColumnStats>> {
            Ok(vec![])
        }
        async fn check_value_overlap(
            &self,
            _source: (&str, &str, &str),
            _target: (&str, &str, &str),
            _sample_limit: i64,
        ) -> Result<ValueOverlapResult> {
            Ok(ValueOverlapResult::default())
        }
        async fn analyze_join(&self, _source: (&str, &str, &str), _target: (&str, &str, &str)) -> Result<JoinAnalysis> {
            Ok(self.join)
        }
        async fn close(&self) {}
    }

    #[derive(Default)]
    struct FakeSchemaRepo {
        tables: Vec<schema_types::schema::SchemaTable>,
        columns: std::collections::HashMap<SchemaTableId, Vec<SchemaColumn>>,
    }

    #[async_trait]
    impl SchemaRepository for FakeSchemaRepo {
        async fn list_tables(&self, _scope: &TenantScope, _datasource_id: DatasourceId) -> Result<Vec<schema_types::schema::SchemaTable>> {
            Ok(self.tables.clone())
        }
        async fn get_table(&self, _scope: &TenantScope, table_id: SchemaTableId) -> Result<schema_types::schema::SchemaTable> {
            self.tables
                .iter()
                .find(|t| t.id == table_id)
                .cloned()
                .ok_or_else(|| SchemaIntelError::not_found("table"))
        }
        async fn upsert_table(&self, _scope: &TenantScope, table: schema_types::schema::SchemaTable) -> Result<schema_types::schema::SchemaTable> {
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
        async fn selected_tables(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<schema_types::schema::SchemaTable>> {
            self.list_tables(scope, datasource_id).await
        }
        async fn selected_columns(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>> {
            self.list_columns(scope, table_id).await
        }
    }

    #[derive(Default)]
    struct FakeRelationshipRepo {
        relationships: Mutex<Vec<SchemaRelationship>>,
        candidates: Mutex<Vec<RelationshipCandidate>>,
    }

    #[async_trait]
    impl RelationshipRepository for FakeRelationshipRepo {
        async fn list_relationships(&self, _scope: &TenantScope, _datasource_id: DatasourceId) -> Result<Vec<SchemaRelationship>> {
            Ok(self.relationships.lock().unwrap().clone())
        }
        async fn upsert_relationship(&self, _scope: &TenantScope, relationship: SchemaRelationship) -> Result<SchemaRelationship> {
            self.relationships.lock().unwrap().push(relationship.clone());
            Ok(relationship)
        }
        async fn soft_delete_relationship(&self, _scope: &TenantScope, _id: schema_types::ids::SchemaRelationshipId) -> Result<()> {
            Ok(())
        }
        async fn list_candidates(&self, _scope: &TenantScope, _workflow_id: WorkflowId) -> Result<Vec<RelationshipCandidate>> {
            Ok(self.candidates.lock().unwrap().clone())
        }
        async fn upsert_candidate(&self, _scope: &TenantScope, candidate: RelationshipCandidate) -> Result<RelationshipCandidate> {
            self.candidates.lock().unwrap().push(candidate.clone());
            Ok(candidate)
        }
        async fn get_candidate(&self, _scope: &TenantScope, id: schema_types::ids::RelationshipCandidateId) -> Result<RelationshipCandidate> {
            self.candidates
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| SchemaIntelError::not_found("candidate"))
        }
        async fn list_entity_relationships(&self, _scope: &TenantScope, _ontology_id: schema_types::ids::OntologyId) -> Result<Vec<schema_types::ontology::EntityRelationship>> {
            Ok(vec![])
        }
        async fn upsert_entity_relationship(&self, _scope: &TenantScope, relationship: schema_types::ontology::EntityRelationship) -> Result<schema_types::ontology::EntityRelationship> {
            Ok(relationship)
        }
    }

    fn column(table_id: SchemaTableId, name: &str, data_type: &str, distinct: i64, pk: bool) -> SchemaColumn {
        SchemaColumn {
            id: SchemaColumnId::new(),
            project_id: ProjectId::new(),
            table_id,
            column_name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: false,
            is_primary_key: pk,
            ordinal_position: 1,
            is_selected: true,
            distinct_count: Some(distinct),
            non_null_count: Some(distinct),
            row_count_snapshot: Some(distinct),
            is_joinable: Some(true),
            joinability_reason: None,
            business_name: None,
            description: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn scope() -> TenantScope {
        TenantScope::new(ProjectId::new(), Provenance::inferred("discovery-worker"))
    }

    #[tokio::test]
    async fn stage_a_imports_declared_foreign_keys_verbatim() {
        let project = ProjectId::new();
        let datasource = DatasourceId::new();
        let orders_id = SchemaTableId::new();
        let users_id = SchemaTableId::new();
        let orders = schema_types::schema::SchemaTable {
            id: orders_id,
            project_id: project,
            datasource_id: datasource,
            schema_name: "public".into(),
            table_name: "orders".into(),
            row_count: Some(1000),
            is_selected: true,
            business_name: None,
            description: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let users = schema_types::schema::SchemaTable {
            id: users_id,
            table_name: "users".into(),
            ..orders.clone()
        };
        let user_id_col = column(orders_id, "user_id", "uuid", 900, false);
        let pk_col = column(users_id, "id", "uuid", 1000, true);

        let mut columns = std::collections::HashMap::new();
        columns.insert(orders_id, vec![user_id_col.clone()]);
        columns.insert(users_id, vec![pk_col.clone()]);

        let repo = FakeSchemaRepo {
            tables: vec![orders, users],
            columns,
        };
        let relationships = FakeRelationshipRepo::default();
        let discoverer = FakeDiscoverer {
            foreign_keys: vec![ForeignKeyMetadata {
                source_schema: "public".into(),
                source_table: "orders".into(),
                source_column: "user_id".into(),
                target_schema: "public".into(),
                target_table: "users".into(),
                target_column: "id".into(),
            }],
            join: JoinAnalysis::default(),
        };

        let service = DiscoveryService::new(Arc::new(repo), Arc::new(relationships), Arc::new(discoverer));
        let imported = service.import_foreign_keys(&scope(), datasource).await.unwrap();
        assert_eq!(imported, 1);
    }

    #[tokio::test]
    async fn stage_b_accepts_high_confidence_match() {
        let project = ProjectId::new();
        let datasource = DatasourceId::new();
        let orders_id = SchemaTableId::new();
        let users_id = SchemaTableId::new();
        let orders = schema_types::schema::SchemaTable {
            id: orders_id,
            project_id: project,
            datasource_id: datasource,
            schema_name: "public".into(),
            table_name: "orders".into(),
            row_count: Some(1000),
            is_selected: true,
            business_name: None,
            description: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let users = schema_types::schema::SchemaTable {
            id: users_id,
            table_name: "users".into(),
            ..orders.clone()
        };
        let source_col = column(orders_id, "user_id", "uuid", 900, false);
        let target_col = column(users_id, "id", "uuid", 1000, true);

        let mut columns = std::collections::HashMap::new();
        columns.insert(orders_id, vec![source_col]);
        columns.insert(users_id, vec![target_col]);

        let repo = FakeSchemaRepo {
            tables: vec![orders, users],
            columns,
        };
        let relationships = FakeRelationshipRepo::default();
        let discoverer = FakeDiscoverer {
            foreign_keys: vec![],
            join: JoinAnalysis {
                join_count: 900,
                source_matched: 900,
                source_distinct: 1000,
                target_matched: 900,
                target_distinct: 1000,
                orphan_count: 100,
                reverse_orphan_count: 10,
            },
        };

        let service = DiscoveryService::new(Arc::new(repo), Arc::new(relationships), Arc::new(discoverer));
        let outcome = service
            .infer_relationships(&scope(), datasource, WorkflowId::new())
            .await
            .unwrap();
        assert!(outcome.inferred_accepted >= 1);
    }
}
