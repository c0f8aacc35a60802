//! `MCPConfigRepository` — the opaque per-project MCP server config bag (§6, §9).

use async_trait::async_trait;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::MCPConfigRepository;

use crate::support::map_sqlx;

pub struct PgMCPConfigRepository {
    pool: PgPool,
}

impl PgMCPConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MCPConfigRepository for PgMCPConfigRepository {
    async fn get_config(&self, scope: &TenantScope) -> Result<serde_json::Value> {
        let config: Option<serde_json::Value> = sqlx::query_scalar(
            "SELECT config FROM mcp_project_configs WHERE project_id = $1",
        )
        .bind(scope.project_id().as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx("get_mcp_config"))?;
        Ok(config.unwrap_or_else(|| serde_json::json!({})))
    }

    async fn set_config(&self, scope: &TenantScope, config: serde_json::Value) -> Result<()> {
        sqlx::query(
            "INSERT INTO mcp_project_configs (project_id, config, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (project_id) DO UPDATE SET config = EXCLUDED.config, updated_at = now()",
        )
        .bind(scope.project_id().as_uuid())
        .bind(&config)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx("set_mcp_config"))?;
        Ok(())
    }
}
