//! `KnowledgeRepository` — seeded domain glossary facts (§4.9, §9).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::KnowledgeRepository;
use schema_types::knowledge::{KnowledgeFact, KnowledgeFactInput};

use crate::support::map_sqlx;
use crate::sqlx_types::PgKnowledgeFactRow;

pub struct PgKnowledgeRepository {
    pool: PgPool,
}

impl PgKnowledgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FACT_COLUMNS: &str = "project_id, fact_type, key, context, created_at, updated_at";

#[async_trait]
impl KnowledgeRepository for PgKnowledgeRepository {
    async fn upsert_fact(&self, scope: &TenantScope, fact: KnowledgeFactInput) -> Result<KnowledgeFact> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO knowledge_facts ({FACT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (project_id, fact_type, key) DO UPDATE SET \
               context = EXCLUDED.context, updated_at = now() \
             RETURNING {FACT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PgKnowledgeFactRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(fact.fact_type.to_db())
            .bind(&fact.key)
            .bind(&fact.context)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("upsert_fact"))?;
        row.try_into()
    }

    async fn list_facts(&self, scope: &TenantScope) -> Result<Vec<KnowledgeFact>> {
        let sql = format!("SELECT {FACT_COLUMNS} FROM knowledge_facts WHERE project_id = $1 ORDER BY fact_type, key");
        let rows = sqlx::query_as::<_, PgKnowledgeFactRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_facts"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
