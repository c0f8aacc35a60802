//! Datasource adapter contract (§6). Implementations are discovered via a
//! factory keyed by datasource type (Postgres, etc.) — none are in scope
//! here; this module only fixes the shape every adapter must expose.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMetadata {
    pub schema_name: String,
    pub table_name: String,
    pub row_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub ordinal_position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ColumnStats {
    pub row_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub non_null_count: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValueOverlapResult {
    pub sample_size: i64,
    pub overlap_count: i64,
}

/// Raw output of a single join-analysis query (§4.3, §6). The discovery
/// pipeline turns this into match/orphan rates as pure functions — see
/// `schema-discovery::metrics`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JoinAnalysis {
    pub join_count: i64,
    pub source_matched: i64,
    pub source_distinct: i64,
    pub target_matched: i64,
    pub target_distinct: i64,
    pub orphan_count: i64,
    pub reverse_orphan_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Json>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResult {
    pub rows_affected: u64,
    pub rows: Option<QueryExecutionResult>,
}

/// A value already coerced to its declared parameter type, ready for
/// positional binding (§4.6 substitution).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BoundValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    TextArray(Vec<String>),
    IntegerArray(Vec<i64>),
}

#[async_trait]
pub trait ConnectionTester: Send + Sync {
    async fn test_connection(&self) -> Result<()>;
    async fn close(&self);
}

#[async_trait]
pub trait SchemaDiscoverer: Send + Sync {
    async fn discover_tables(&self) -> Result<Vec<TableMetadata>>;
    async fn discover_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>>;
    async fn discover_foreign_keys(&self) -> Result<Vec<ForeignKeyMetadata>>;
    fn supports_foreign_keys(&self) -> bool;
    async fn analyze_column_stats(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<ColumnStats>>;
    async fn check_value_overlap(
        &self,
        source: (&str, &str, &str),
        target: (&str, &str, &str),
        sample_limit: i64,
    ) -> Result<ValueOverlapResult>;
    async fn analyze_join(
        &self,
        source: (&str, &str, &str),
        target: (&str, &str, &str),
    ) -> Result<JoinAnalysis>;
    async fn close(&self);
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, sql: &str, limit: Option<i64>) -> Result<QueryExecutionResult>;
    async fn query_with_params(
        &self,
        sql: &str,
        ordered_values: &[BoundValue],
        limit: Option<i64>,
    ) -> Result<QueryExecutionResult>;
    async fn execute_with_params(&self, sql: &str, ordered_values: &[BoundValue]) -> Result<ExecuteResult>;
    async fn validate_query(&self, sql: &str) -> Result<()>;
    async fn close(&self);
}

/// Fingerprint-based injection detector (§4.6, §6) — intentionally external:
/// the spec does not specify the fingerprinting algorithm.
pub trait InjectionDetector: Send + Sync {
    /// Returns `Some(fingerprint)` if the value looks like an injection
    /// attempt, `None` otherwise.
    fn scan(&self, value: &str) -> Option<String>;
}
