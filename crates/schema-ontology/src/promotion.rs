//! Promotes surviving tables into `OntologyEntity` rows (§4.5).

use chrono::Utc;

use schema_discovery::metrics::meets_pk_match_thresholds;
use schema_types::enums::ProvenanceSource;
use schema_types::ids::OntologyId;
use schema_types::ontology::OntologyEntity;
use schema_types::schema::{SchemaColumn, SchemaTable};

use crate::pluralize::pluralize;

/// Data types a column is never promoted into an entity's key column set
/// for, regardless of statistics — §4.5 is explicit that this mode uses
/// type + statistics, not name-based exclusion.
const EXCLUDED_DATA_TYPES: &[&str] = &["boolean", "date", "timestamp", "timestamptz"];

/// Whether `column` survives the entity-candidate column filter (§4.5):
/// included if it's a PK, or if it passes the same joinability/cardinality
/// thresholds §4.3 uses for PK-match inference. Always excluded by data
/// type regardless of either test.
pub fn passes_column_filter(column: &SchemaColumn) -> bool {
    if EXCLUDED_DATA_TYPES.contains(&column.data_type.to_ascii_lowercase().as_str()) {
        return false;
    }
    if column.is_primary_key {
        return true;
    }
    meets_pk_match_thresholds(column.is_joinable, column.distinct_count, column.row_count_snapshot)
}

/// Picks the column used as `primary_column` for a newly promoted entity:
/// prefer the table's primary key, else the first column surviving the
/// filter in ordinal order.
pub fn choose_primary_column<'a>(columns: &'a [SchemaColumn]) -> Option<&'a SchemaColumn> {
    columns
        .iter()
        .find(|c| c.is_primary_key)
        .or_else(|| columns.iter().filter(|c| passes_column_filter(c)).min_by_key(|c| c.ordinal_position))
}

/// Builds the entity a table promotes into, with a freshly pluralized name.
/// Caller is responsible for checking for name/primary-table collisions and
/// routing into `merge` when one exists (§4.5).
pub fn promote_table(table: &SchemaTable, columns: &[SchemaColumn], ontology_id: OntologyId) -> Option<OntologyEntity> {
    let primary_column = choose_primary_column(columns)?;
    let now = Utc::now();
    Some(OntologyEntity {
        id: schema_types::ids::EntityId::new(),
        project_id: table.project_id,
        ontology_id,
        name: pluralize(&table.table_name),
        description: table.description.clone(),
        domain: None,
        primary_schema: Some(table.schema_name.clone()),
        primary_table: Some(table.table_name.clone()),
        primary_column: Some(primary_column.column_name.clone()),
        confidence: 1.0,
        is_stale: false,
        is_promoted: true,
        is_deleted: false,
        deletion_reason: None,
        created_by: ProvenanceSource::Inferred,
        updated_by: None,
        created_at: now,
        updated_at: now,
    })
}
