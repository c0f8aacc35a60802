//! `OntologyRepository` — ontology version lifecycle (§4.5, §9).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::OntologyRepository;
use schema_types::ids::OntologyId;
use schema_types::ontology::Ontology;

use crate::support::map_sqlx;

pub struct PgOntologyRepository {
    pool: PgPool,
}

impl PgOntologyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OntologyRow {
    id: uuid::Uuid,
    project_id: uuid::Uuid,
    version: i32,
    is_active: bool,
    domain_summary: serde_json::Value,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<OntologyRow> for Ontology {
    fn from(r: OntologyRow) -> Self {
        Ontology {
            id: r.id.into(),
            project_id: r.project_id.into(),
            version: r.version,
            is_active: r.is_active,
            domain_summary: r.domain_summary,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ONTOLOGY_COLUMNS: &str = "id, project_id, version, is_active, domain_summary, created_at, updated_at";

#[async_trait]
impl OntologyRepository for PgOntologyRepository {
    async fn get_active(&self, scope: &TenantScope) -> Result<Option<Ontology>> {
        let sql = format!(
            "SELECT {ONTOLOGY_COLUMNS} FROM ontologies WHERE project_id = $1 AND is_active LIMIT 1"
        );
        let row = sqlx::query_as::<_, OntologyRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx("get_active_ontology"))?;
        Ok(row.map(Into::into))
    }

    async fn create_new_version(&self, scope: &TenantScope) -> Result<Ontology> {
        let next_version: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM ontologies WHERE project_id = $1",
        )
        .bind(scope.project_id().as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("create_new_version:select_next"))?;

        let id = OntologyId::new();
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO ontologies ({ONTOLOGY_COLUMNS}) VALUES ($1, $2, $3, true, $4, $5, $6) \
             RETURNING {ONTOLOGY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OntologyRow>(&sql)
            .bind(id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(next_version)
            .bind(serde_json::json!({}))
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("create_new_version:insert"))?;
        Ok(row.into())
    }

    async fn deactivate_all(&self, scope: &TenantScope) -> Result<()> {
        sqlx::query("UPDATE ontologies SET is_active = false, updated_at = now() WHERE project_id = $1")
            .bind(scope.project_id().as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx("deactivate_all_ontologies"))?;
        Ok(())
    }
}
