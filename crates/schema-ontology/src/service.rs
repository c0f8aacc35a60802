//! `OntologyService`: promotes surviving tables into entities and runs the
//! merge pipeline end to end against the repository ports. Table→entity
//! lookup always goes through `EntityRepository::find_by_primary_table`
//! (§4.5: "first occurrence wins" is explicitly rejected).

use std::sync::Arc;

use tracing::info;

use schema_core::context::TenantScope;
use schema_core::error::{Result, ResultExt};
use schema_core::ports::{EntityRepository, RelationshipRepository, SchemaRepository};
use schema_types::ids::{DatasourceId, EntityId, OntologyId};

use crate::merge::{merge_entities, redirect_relationships, source_name_alias};
use crate::promotion::promote_table;

pub struct OntologyService {
    entities: Arc<dyn EntityRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    schema: Arc<dyn SchemaRepository>,
}

#[derive(Debug, Default)]
pub struct PromotionSummary {
    pub promoted: usize,
    pub merged: usize,
    pub skipped_no_surviving_columns: usize,
}

impl OntologyService {
    pub fn new(
        entities: Arc<dyn EntityRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        schema: Arc<dyn SchemaRepository>,
    ) -> Self {
        Self {
            entities,
            relationships,
            schema,
        }
    }

    /// Promotes every selected table on `datasource_id` into an entity,
    /// merging into an existing entity when one already claims the same
    /// `(schema, table)`.
    pub async fn promote_tables(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
        datasource_id: DatasourceId,
    ) -> Result<PromotionSummary> {
        let tables = self.schema.selected_tables(scope, datasource_id).await?;
        let mut summary = PromotionSummary::default();

        for table in &tables {
            let columns = self.schema.selected_columns(scope, table.id).await?;
            let Some(candidate) = promote_table(table, &columns, ontology_id) else {
                summary.skipped_no_surviving_columns += 1;
                continue;
            };

            let existing = self
                .entities
                .find_by_primary_table(scope, ontology_id, &table.schema_name, &table.table_name)
                .await
                .ctx("promote_tables")?;

            match existing {
                None => {
                    self.entities.upsert_entity(scope, candidate).await.ctx("promote_tables")?;
                    summary.promoted += 1;
                }
                Some(target) => {
                    self.merge(scope, ontology_id, candidate.id, target.id, candidate).await?;
                    summary.merged += 1;
                }
            }
        }

        info!(
            promoted = summary.promoted,
            merged = summary.merged,
            "table promotion pass complete"
        );
        Ok(summary)
    }

    /// Runs the full six-step merge (§4.5) of `source` into `target`.
    /// `source_entity` is the in-memory candidate produced by promotion;
    /// for a merge triggered some other way (e.g. an MCP write colliding
    /// with an inferred entity) callers load both sides via
    /// `EntityRepository::get_entity` instead.
    pub async fn merge(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
        source_id: EntityId,
        target_id: EntityId,
        mut source_entity: schema_types::ontology::OntologyEntity,
    ) -> Result<()> {
        let mut target_entity = self.entities.get_entity(scope, target_id).await.ctx("merge")?;

        merge_entities(&mut source_entity, &mut target_entity);

        self.entities
            .transfer_aliases(scope, source_id, target_id)
            .await
            .ctx("merge")?;
        let existing_aliases = self.entities.list_aliases(scope, target_id).await.ctx("merge")?;
        if !existing_aliases.iter().any(|a| a.alias_text == source_entity.name) {
            self.entities
                .add_alias(scope, source_name_alias(&source_entity, target_id))
                .await
                .ctx("merge")?;
        }

        let occurrences = self.entities.list_occurrences(scope, source_id).await.ctx("merge")?;
        for occurrence in occurrences {
            self.entities
                .add_occurrence(
                    scope,
                    schema_types::ontology::OntologyEntityOccurrence {
                        id: schema_types::ids::EntityOccurrenceId::new(),
                        entity_id: target_id,
                        ..occurrence
                    },
                )
                .await
                .ctx("merge")?;
        }

        let mut edges = self
            .relationships
            .list_entity_relationships(scope, ontology_id)
            .await
            .ctx("merge")?;
        let redirected_ids: std::collections::HashSet<_> =
            redirect_relationships(&mut edges, source_id, target_id).into_iter().collect();
        for edge in edges.into_iter().filter(|e| redirected_ids.contains(&e.id)) {
            self.relationships
                .upsert_entity_relationship(scope, edge)
                .await
                .ctx("merge")?;
        }

        self.entities.upsert_entity(scope, target_entity).await.ctx("merge")?;
        self.entities.upsert_entity(scope, source_entity).await.ctx("merge")?;
        Ok(())
    }
}
