//! Physical schema model: projects, datasources, tables, columns, relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

use crate::enums::{Cardinality, InferenceMethod, RelationshipType};
use crate::ids::{DatasourceId, ProjectId, SchemaColumnId, SchemaRelationshipId, SchemaTableId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub status: String,
    /// Recognized keys: `knowledge_seed_path`, `use_legacy_pattern_matching`,
    /// `auto_approve_*`, `auth_server_url`.
    pub parameters: HashMap<String, Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.parameters.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    pub fn use_legacy_pattern_matching(&self) -> bool {
        self.get_bool("use_legacy_pattern_matching").unwrap_or(false)
    }

    pub fn knowledge_seed_path(&self) -> Option<&str> {
        self.get_str("knowledge_seed_path")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datasource {
    pub id: DatasourceId,
    pub project_id: ProjectId,
    pub name: String,
    pub datasource_type: String,
    pub config: HashMap<String, Json>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaTable {
    pub id: SchemaTableId,
    pub project_id: ProjectId,
    pub datasource_id: DatasourceId,
    pub schema_name: String,
    pub table_name: String,
    pub row_count: Option<i64>,
    pub is_selected: bool,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a column is judged safe to use in statistical join analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinabilityReason {
    /// Column is the table's primary key.
    Pk,
    /// Column statistics indicate it behaves like a foreign key candidate.
    Statistical,
    /// Excluded by the PK-match exclusion list or a data-type rule.
    Excluded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub id: SchemaColumnId,
    pub project_id: ProjectId,
    pub table_id: SchemaTableId,
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
    pub joinability_reason: Option<JoinabilityReason>,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchemaColumn {
    /// §3.1 invariant: `is_primary_key ⇒ is_joinable = true` and
    /// `joinability_reason = PK`. Callers that set `is_primary_key` must
    /// route through this constructor or `enforce_pk_invariant` to keep it
    /// true without re-deriving it at every call site.
    pub fn enforce_pk_invariant(&mut self) {
        if self.is_primary_key {
            self.is_joinable = Some(true);
            self.joinability_reason = Some(JoinabilityReason::Pk);
        }
    }

    pub fn qualified_name(&self, table_name: &str) -> String {
        format!("{table_name}.{}", self.column_name)
    }
}

/// Optional statistical metrics captured during PK-match analysis (§4.3, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipMetrics {
    pub match_rate: Option<f64>,
    pub source_distinct: Option<i64>,
    pub target_distinct: Option<i64>,
    pub matched_count: Option<i64>,
    pub orphan_count: Option<i64>,
    pub reverse_orphan_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRelationship {
    pub id: SchemaRelationshipId,
    pub project_id: ProjectId,
    pub source_column_id: SchemaColumnId,
    pub target_column_id: SchemaColumnId,
    pub relationship_type: RelationshipType,
    pub cardinality: Cardinality,
    pub confidence: f64,
    pub inference_method: InferenceMethod,
    pub metrics: RelationshipMetrics,
    /// `None` = pending.
    pub is_approved: Option<bool>,
    pub is_validated: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
