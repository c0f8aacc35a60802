//! `SchemaRepository` — tables and columns (§9).

use async_trait::async_trait;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::SchemaRepository;
use schema_types::ids::{DatasourceId, SchemaColumnId, SchemaTableId};
use schema_types::schema::{SchemaColumn, SchemaTable};

use crate::support::map_sqlx;
use crate::sqlx_types::{PgSchemaColumnRow, PgSchemaTableRow};

pub struct PgSchemaRepository {
    pool: PgPool,
}

impl PgSchemaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TABLE_COLUMNS: &str = "id, project_id, datasource_id, schema_name, table_name, row_count, \
    is_selected, business_name, description, created_at, updated_at";

const COLUMN_COLUMNS: &str = "id, project_id, table_id, column_name, data_type, is_nullable, \
    is_primary_key, ordinal_position, is_selected, distinct_count, non_null_count, \
    row_count_snapshot, is_joinable, joinability_reason, business_name, description, \
    created_at, updated_at";

#[async_trait]
impl SchemaRepository for PgSchemaRepository {
    async fn list_tables(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<SchemaTable>> {
        let sql = format!(
            "SELECT {TABLE_COLUMNS} FROM schema_tables \
             WHERE project_id = $1 AND datasource_id = $2 ORDER BY schema_name, table_name"
        );
        let rows = sqlx::query_as::<_, PgSchemaTableRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(datasource_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_tables"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_table(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<SchemaTable> {
        let sql = format!("SELECT {TABLE_COLUMNS} FROM schema_tables WHERE project_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, PgSchemaTableRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(table_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("get_table"))?;
        Ok(row.into())
    }

    async fn upsert_table(&self, scope: &TenantScope, table: SchemaTable) -> Result<SchemaTable> {
        let sql = format!(
            "INSERT INTO schema_tables ({TABLE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
               row_count = EXCLUDED.row_count, is_selected = EXCLUDED.is_selected, \
               business_name = EXCLUDED.business_name, description = EXCLUDED.description, \
               updated_at = now() \
             RETURNING {TABLE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgSchemaTableRow>(&sql)
            .bind(table.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(table.datasource_id.as_uuid())
            .bind(&table.schema_name)
            .bind(&table.table_name)
            .bind(table.row_count)
            .bind(table.is_selected)
            .bind(&table.business_name)
            .bind(&table.description)
            .bind(table.created_at)
            .bind(table.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("upsert_table"))?;
        Ok(row.into())
    }

    async fn list_columns(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>> {
        let sql = format!(
            "SELECT {COLUMN_COLUMNS} FROM schema_columns \
             WHERE project_id = $1 AND table_id = $2 ORDER BY ordinal_position"
        );
        let rows = sqlx::query_as::<_, PgSchemaColumnRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(table_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_columns"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_column(&self, scope: &TenantScope, column_id: SchemaColumnId) -> Result<SchemaColumn> {
        let sql = format!("SELECT {COLUMN_COLUMNS} FROM schema_columns WHERE project_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, PgSchemaColumnRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(column_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("get_column"))?;
        row.try_into()
    }

    async fn upsert_column(&self, scope: &TenantScope, mut column: SchemaColumn) -> Result<SchemaColumn> {
        column.enforce_pk_invariant();
        let joinability_reason = column.joinability_reason.map(|r| {
            use schema_types::schema::JoinabilityReason::*;
            match r {
                Pk => "pk",
                Statistical => "statistical",
                Excluded => "excluded",
            }
        });
        let sql = format!(
            "INSERT INTO schema_columns ({COLUMN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             ON CONFLICT (id) DO UPDATE SET \
               is_selected = EXCLUDED.is_selected, distinct_count = EXCLUDED.distinct_count, \
               non_null_count = EXCLUDED.non_null_count, row_count_snapshot = EXCLUDED.row_count_snapshot, \
               is_joinable = EXCLUDED.is_joinable, joinability_reason = EXCLUDED.joinability_reason, \
               business_name = EXCLUDED.business_name, description = EXCLUDED.description, \
               updated_at = now() \
             RETURNING {COLUMN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgSchemaColumnRow>(&sql)
            .bind(column.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(column.table_id.as_uuid())
            .bind(&column.column_name)
            .bind(&column.data_type)
            .bind(column.is_nullable)
            .bind(column.is_primary_key)
            .bind(column.ordinal_position)
            .bind(column.is_selected)
            .bind(column.distinct_count)
            .bind(column.non_null_count)
            .bind(column.row_count_snapshot)
            .bind(column.is_joinable)
            .bind(joinability_reason)
            .bind(&column.business_name)
            .bind(&column.description)
            .bind(column.created_at)
            .bind(column.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("upsert_column"))?;
        row.try_into()
    }

    async fn selected_tables(&self, scope: &TenantScope, datasource_id: DatasourceId) -> Result<Vec<SchemaTable>> {
        let sql = format!(
            "SELECT {TABLE_COLUMNS} FROM schema_tables \
             WHERE project_id = $1 AND datasource_id = $2 AND is_selected \
             ORDER BY schema_name, table_name"
        );
        let rows = sqlx::query_as::<_, PgSchemaTableRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(datasource_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("selected_tables"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn selected_columns(&self, scope: &TenantScope, table_id: SchemaTableId) -> Result<Vec<SchemaColumn>> {
        let sql = format!(
            "SELECT {COLUMN_COLUMNS} FROM schema_columns \
             WHERE project_id = $1 AND table_id = $2 AND is_selected ORDER BY ordinal_position"
        );
        let rows = sqlx::query_as::<_, PgSchemaColumnRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(table_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("selected_columns"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
