//! Entity merge service (§4.5): six individually idempotent steps, run in
//! sequence, that fold a colliding inferred entity (`source`) into an
//! existing preferred entity (`target`).

use schema_types::enums::AliasSource;
use schema_types::ontology::{EntityRelationship, OntologyEntity, OntologyEntityAlias};

/// Step 1: target inherits source's `primary_schema/table/column` only if
/// it has none of its own; `domain`/`description` copy only when target
/// lacks them, preserving manual/MCP intent.
pub fn copy_missing_identity(source: &OntologyEntity, target: &mut OntologyEntity) {
    if !target.has_primary_table() {
        target.primary_schema = source.primary_schema.clone();
        target.primary_table = source.primary_table.clone();
        target.primary_column = source.primary_column.clone();
    }
    if target.domain.is_none() {
        target.domain = source.domain.clone();
    }
    if target.description.is_none() {
        target.description = source.description.clone();
    }
}

/// Step 2: confidence only ever rises, and a merge always clears staleness.
pub fn raise_confidence_and_clear_stale(source: &OntologyEntity, target: &mut OntologyEntity) {
    target.confidence = target.confidence.max(source.confidence);
    target.is_stale = false;
}

/// Step 3: every alias source already has is re-pointed at target (callers
/// persist the transfer through the repository's `transfer_aliases`, which
/// is itself idempotent by `WHERE entity_id = source`); this function only
/// produces the additional alias recording `source.name` under target,
/// which callers must `add_alias` exactly once — re-running is a no-op
/// because the caller checks for an existing alias with the same text first.
pub fn source_name_alias(source: &OntologyEntity, target_id: schema_types::ids::EntityId) -> OntologyEntityAlias {
    OntologyEntityAlias {
        id: schema_types::ids::EntityAliasId::new(),
        entity_id: target_id,
        alias_text: source.name.clone(),
        source: AliasSource::Merge,
        created_at: chrono::Utc::now(),
    }
}

/// Step 5: redirects every edge touching `source` onto `target`, returning
/// the ids of the edges actually redirected so the caller can re-upsert
/// exactly those rows rather than guessing from a count. Idempotent because
/// `redirect` is a no-op once an edge's endpoints no longer name `source`.
pub fn redirect_relationships(
    relationships: &mut [EntityRelationship],
    source: schema_types::ids::EntityId,
    target: schema_types::ids::EntityId,
) -> Vec<schema_types::ids::EntityRelationshipId> {
    let mut redirected = Vec::new();
    for rel in relationships.iter_mut() {
        if rel.touches(source) {
            rel.redirect(source, target);
            redirected.push(rel.id);
        }
    }
    redirected
}

/// Step 6: soft-deletes `source` with a deletion reason naming `target`.
/// Idempotent: re-running on an already-deleted source is a harmless
/// overwrite of the same fields.
pub fn soft_delete_source(source: &mut OntologyEntity, target: &OntologyEntity) {
    source.is_deleted = true;
    source.deletion_reason = Some(format!("merged into entity {}", target.id));
}

/// Runs steps 1, 2, and 6 against the in-memory pair (the parts expressible
/// without a repository round trip); steps 3 (alias transfer), 4 (key
/// column transfer), and 5 (relationship redirection) are driven by the
/// caller against the loaded alias/column/relationship lists, using
/// `source_name_alias` and `redirect_relationships` above. Each step is
/// independently safe to re-run, so a caller that crashes mid-merge can
/// simply call this again.
pub fn merge_entities(source: &mut OntologyEntity, target: &mut OntologyEntity) {
    copy_missing_identity(source, target);
    raise_confidence_and_clear_stale(source, target);
    soft_delete_source(source, target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_types::ids::{EntityId, EntityRelationshipId, OntologyId, ProjectId};

    fn entity(name: &str) -> OntologyEntity {
        OntologyEntity {
            id: EntityId::new(),
            project_id: ProjectId::new(),
            ontology_id: OntologyId::new(),
            name: name.into(),
            description: None,
            domain: None,
            primary_schema: None,
            primary_table: None,
            primary_column: None,
            confidence: 0.5,
            is_stale: true,
            is_promoted: true,
            is_deleted: false,
            deletion_reason: None,
            created_by: schema_types::enums::ProvenanceSource::Inferred,
            updated_by: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn copy_missing_identity_only_fills_gaps() {
        let mut source = entity("orders_src");
        source.primary_schema = Some("public".into());
        source.primary_table = Some("orders".into());
        source.primary_column = Some("id".into());
        source.domain = Some("commerce".into());

        let mut target = entity("orders");
        target.description = Some("existing description".into());

        copy_missing_identity(&source, &mut target);
        assert_eq!(target.primary_table.as_deref(), Some("orders"));
        assert_eq!(target.domain.as_deref(), Some("commerce"));
        assert_eq!(target.description.as_deref(), Some("existing description"));
    }

    #[test]
    fn copy_missing_identity_never_overwrites_existing_primary_table() {
        let mut source = entity("orders_src");
        source.primary_table = Some("orders_v2".into());

        let mut target = entity("orders");
        target.primary_schema = Some("public".into());
        target.primary_table = Some("orders".into());

        copy_missing_identity(&source, &mut target);
        assert_eq!(target.primary_table.as_deref(), Some("orders"));
    }

    #[test]
    fn confidence_only_rises() {
        let mut source = entity("a");
        source.confidence = 0.9;
        let mut target = entity("b");
        target.confidence = 0.4;
        target.is_stale = true;

        raise_confidence_and_clear_stale(&source, &mut target);
        assert_eq!(target.confidence, 0.9);
        assert!(!target.is_stale);

        // Re-running with a lower source confidence must not lower target's.
        source.confidence = 0.1;
        raise_confidence_and_clear_stale(&source, &mut target);
        assert_eq!(target.confidence, 0.9);
    }

    #[test]
    fn redirect_relationships_only_touches_matching_edges() {
        let source_id = EntityId::new();
        let target_id = EntityId::new();
        let unrelated_a = EntityId::new();
        let unrelated_b = EntityId::new();

        let mut rels = vec![
            EntityRelationship {
                id: EntityRelationshipId::new(),
                project_id: ProjectId::new(),
                ontology_id: OntologyId::new(),
                source_entity_id: source_id,
                target_entity_id: unrelated_a,
                source_column_table: "orders".into(),
                source_column_name: "user_id".into(),
                target_column_table: "users".into(),
                target_column_name: "id".into(),
                detection_method: schema_types::enums::InferenceMethod::ForeignKey,
                confidence: 1.0,
                cardinality: schema_types::enums::Cardinality::ManyToOne,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            EntityRelationship {
                id: EntityRelationshipId::new(),
                project_id: ProjectId::new(),
                ontology_id: OntologyId::new(),
                source_entity_id: unrelated_b,
                target_entity_id: unrelated_a,
                source_column_table: "x".into(),
                source_column_name: "y".into(),
                target_column_table: "z".into(),
                target_column_name: "w".into(),
                detection_method: schema_types::enums::InferenceMethod::ForeignKey,
                confidence: 1.0,
                cardinality: schema_types::enums::Cardinality::ManyToOne,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        ];

        let redirected = redirect_relationships(&mut rels, source_id, target_id);
        assert_eq!(redirected, vec![rels[0].id]);
        assert_eq!(rels[0].source_entity_id, target_id);
        assert_eq!(rels[1].source_entity_id, unrelated_b);

        // Re-running is a no-op: source no longer appears anywhere.
        let redirected_again = redirect_relationships(&mut rels, source_id, target_id);
        assert!(redirected_again.is_empty());
    }

    #[test]
    fn source_name_alias_points_at_target_with_merge_source() {
        let source = entity("orders_src");
        let target_id = EntityId::new();
        let alias = source_name_alias(&source, target_id);
        assert_eq!(alias.entity_id, target_id);
        assert_eq!(alias.alias_text, "orders_src");
        assert_eq!(alias.source, AliasSource::Merge);
    }

    #[test]
    fn soft_delete_source_is_idempotent() {
        let mut source = entity("dup");
        let target = entity("canonical");
        soft_delete_source(&mut source, &target);
        assert!(source.is_deleted);
        let reason_first = source.deletion_reason.clone();
        soft_delete_source(&mut source, &target);
        assert_eq!(source.deletion_reason, reason_first);
    }

    #[test]
    fn merge_entities_runs_the_in_memory_steps_together() {
        let mut source = entity("orders_src");
        source.confidence = 0.95;
        source.primary_schema = Some("public".into());
        source.primary_table = Some("orders".into());
        source.primary_column = Some("id".into());

        let mut target = entity("orders");
        target.confidence = 0.5;

        merge_entities(&mut source, &mut target);
        assert!(source.is_deleted);
        assert_eq!(target.confidence, 0.95);
        assert_eq!(target.primary_table.as_deref(), Some("orders"));
    }
}
