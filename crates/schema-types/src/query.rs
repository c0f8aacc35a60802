//! Saved query model (§3.1, §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::enums::{ParameterType, QueryStatus};
use crate::ids::{DatasourceId, ProjectId, QueryId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub param_type: ParameterType,
    pub required: bool,
    pub default_value: Option<Json>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub project_id: ProjectId,
    pub datasource_id: DatasourceId,
    pub natural_language_prompt: Option<String>,
    pub additional_context: Option<String>,
    pub sql_query: String,
    /// Always derived from the datasource type; never caller-updatable.
    pub dialect: String,
    pub is_enabled: bool,
    pub parameters: Vec<QueryParameter>,
    pub output_columns: Vec<OutputColumn>,
    pub tags: Vec<String>,
    pub status: QueryStatus,
    pub suggested_by: Option<String>,
    pub suggestion_context: Option<String>,
    pub parent_query_id: Option<QueryId>,
    pub allows_modification: bool,
    pub usage_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Query {
    /// §4.6: `allows_modification` is auto-corrected to `false` when the SQL
    /// is a `SELECT`.
    pub fn normalize_allows_modification(sql: &str, requested: bool) -> bool {
        if is_select_statement(sql) {
            false
        } else {
            requested
        }
    }

    pub fn requires_output_columns(&self) -> bool {
        !self.allows_modification
    }
}

/// Very small statement-shape sniff: trims leading whitespace/comments and
/// checks the first keyword. Good enough to gate `allows_modification`
/// auto-correction without pulling in a full SQL parser for this one check.
pub fn is_select_statement(sql: &str) -> bool {
    let trimmed = sql.trim_start();
    let trimmed = trimmed.trim_start_matches(|c: char| c == '(');
    trimmed.to_ascii_uppercase().starts_with("SELECT")
}
