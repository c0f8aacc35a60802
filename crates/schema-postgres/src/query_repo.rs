//! `QueryRepository` — saved/suggested queries and their approval lineage
//! (§4.6, §9).

use async_trait::async_trait;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::QueryRepository;
use schema_types::ids::{DatasourceId, QueryId};
use schema_types::query::Query;

use crate::support::map_sqlx;
use crate::sqlx_types::PgQueryRow;

pub struct PgQueryRepository {
    pool: PgPool,
}

impl PgQueryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const QUERY_COLUMNS: &str = "id, project_id, datasource_id, natural_language_prompt, \
    additional_context, sql_query, dialect, is_enabled, parameters, output_columns, tags, \
    status, suggested_by, suggestion_context, parent_query_id, allows_modification, \
    usage_count, is_deleted, created_at, updated_at";

#[async_trait]
impl QueryRepository for PgQueryRepository {
    async fn get(&self, scope: &TenantScope, id: QueryId) -> Result<Query> {
        let sql = format!("SELECT {QUERY_COLUMNS} FROM queries WHERE project_id = $1 AND id = $2 AND NOT is_deleted");
        let row = sqlx::query_as::<_, PgQueryRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("get_query"))?;
        row.try_into()
    }

    async fn list(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<Query>> {
        let sql = format!(
            "SELECT {QUERY_COLUMNS} FROM queries \
             WHERE project_id = $1 AND datasource_id = $2 AND NOT is_deleted ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, PgQueryRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(datasource_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_queries"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert(&self, scope: &TenantScope, query: Query) -> Result<Query> {
        let parameters = serde_json::to_value(&query.parameters).map_err(|e| anyhow::anyhow!(e))?;
        let output_columns = serde_json::to_value(&query.output_columns).map_err(|e| anyhow::anyhow!(e))?;
        let sql = format!(
            "INSERT INTO queries ({QUERY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20) \
             RETURNING {QUERY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgQueryRow>(&sql)
            .bind(query.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(query.datasource_id.as_uuid())
            .bind(&query.natural_language_prompt)
            .bind(&query.additional_context)
            .bind(&query.sql_query)
            .bind(&query.dialect)
            .bind(query.is_enabled)
            .bind(parameters)
            .bind(output_columns)
            .bind(&query.tags)
            .bind(query.status.to_db())
            .bind(&query.suggested_by)
            .bind(&query.suggestion_context)
            .bind(query.parent_query_id.map(|id| id.as_uuid()))
            .bind(query.allows_modification)
            .bind(query.usage_count)
            .bind(query.is_deleted)
            .bind(query.created_at)
            .bind(query.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("insert_query"))?;
        row.try_into()
    }

    async fn update(&self, scope: &TenantScope, query: Query) -> Result<Query> {
        let parameters = serde_json::to_value(&query.parameters).map_err(|e| anyhow::anyhow!(e))?;
        let output_columns = serde_json::to_value(&query.output_columns).map_err(|e| anyhow::anyhow!(e))?;
        let sql = format!(
            "UPDATE queries SET \
               natural_language_prompt = $3, additional_context = $4, sql_query = $5, \
               is_enabled = $6, parameters = $7, output_columns = $8, tags = $9, status = $10, \
               suggested_by = $11, suggestion_context = $12, parent_query_id = $13, \
               allows_modification = $14, is_deleted = $15, updated_at = now() \
             WHERE project_id = $1 AND id = $2 \
             RETURNING {QUERY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgQueryRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(query.id.as_uuid())
            .bind(&query.natural_language_prompt)
            .bind(&query.additional_context)
            .bind(&query.sql_query)
            .bind(query.is_enabled)
            .bind(parameters)
            .bind(output_columns)
            .bind(&query.tags)
            .bind(query.status.to_db())
            .bind(&query.suggested_by)
            .bind(&query.suggestion_context)
            .bind(query.parent_query_id.map(|id| id.as_uuid()))
            .bind(query.allows_modification)
            .bind(query.is_deleted)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("update_query"))?;
        row.try_into()
    }

    async fn soft_delete(&self, scope: &TenantScope, id: QueryId) -> Result<()> {
        sqlx::query("UPDATE queries SET is_deleted = true, updated_at = now() WHERE project_id = $1 AND id = $2")
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("soft_delete_query"))?;
        Ok(())
    }

    async fn list_pending_children(&self, scope: &TenantScope, parent_id: QueryId) -> Result<Vec<Query>> {
        let sql = format!(
            "SELECT {QUERY_COLUMNS} FROM queries \
             WHERE project_id = $1 AND parent_query_id = $2 AND status = 'pending' AND NOT is_deleted"
        );
        let rows = sqlx::query_as::<_, PgQueryRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(parent_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_pending_children"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn increment_usage(&self, scope: &TenantScope, id: QueryId) -> Result<()> {
        sqlx::query("UPDATE queries SET usage_count = usage_count + 1 WHERE project_id = $1 AND id = $2")
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("increment_usage"))?;
        Ok(())
    }
}
