//! `EntityRepository` — ontology entities, aliases, occurrences (§4.1, §4.5, §9).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use schema_core::context::TenantScope;
use schema_core::error::{Result, SchemaIntelError};
use schema_core::ports::EntityRepository;
use schema_types::enums::ProvenanceSource;
use schema_types::ids::{EntityAliasId, EntityId, EntityOccurrenceId, OntologyId};
use schema_types::ontology::{OntologyEntity, OntologyEntityAlias, OntologyEntityOccurrence};

use crate::support::map_sqlx;

pub struct PgEntityRepository {
    pool: PgPool,
}

impl PgEntityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ENTITY_COLUMNS: &str = "id, project_id, ontology_id, name, description, domain, \
    primary_schema, primary_table, primary_column, confidence, is_stale, is_promoted, \
    is_deleted, deletion_reason, created_by, updated_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct EntityRow {
    id: uuid::Uuid,
    project_id: uuid::Uuid,
    ontology_id: uuid::Uuid,
    name: String,
    description: Option<String>,
    domain: Option<String>,
    primary_schema: Option<String>,
    primary_table: Option<String>,
    primary_column: Option<String>,
    confidence: f64,
    is_stale: bool,
    is_promoted: bool,
    is_deleted: bool,
    deletion_reason: Option<String>,
    created_by: String,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntityRow> for OntologyEntity {
    type Error = SchemaIntelError;

    fn try_from(r: EntityRow) -> Result<Self> {
        let updated_by = r.updated_by.map(|s| ProvenanceSource::from_db(&s)).transpose()?;
        Ok(OntologyEntity {
            id: r.id.into(),
            project_id: r.project_id.into(),
            ontology_id: r.ontology_id.into(),
            name: r.name,
            description: r.description,
            domain: r.domain,
            primary_schema: r.primary_schema,
            primary_table: r.primary_table,
            primary_column: r.primary_column,
            confidence: r.confidence,
            is_stale: r.is_stale,
            is_promoted: r.is_promoted,
            is_deleted: r.is_deleted,
            deletion_reason: r.deletion_reason,
            created_by: ProvenanceSource::from_db(&r.created_by)?,
            updated_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    async fn list_entities(&self, scope: &TenantScope, ontology_id: OntologyId) -> Result<Vec<OntologyEntity>> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM ontology_entities \
             WHERE project_id = $1 AND ontology_id = $2 AND NOT is_deleted ORDER BY name"
        );
        let rows = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(ontology_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx("list_entities"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_entity(&self, scope: &TenantScope, id: EntityId) -> Result<OntologyEntity> {
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM ontology_entities WHERE project_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("get_entity"))?;
        row.try_into()
    }

    async fn find_by_primary_table(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
        schema_name: &str,
        table_name: &str,
    ) -> Result<Option<OntologyEntity>> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM ontology_entities \
             WHERE project_id = $1 AND ontology_id = $2 AND primary_schema = $3 AND primary_table = $4 \
               AND NOT is_deleted LIMIT 1"
        );
        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(ontology_id.as_uuid())
            .bind(schema_name)
            .bind(table_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx("find_by_primary_table"))?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_name(
        &self,
        scope: &TenantScope,
        ontology_id: OntologyId,
        name: &str,
    ) -> Result<Option<OntologyEntity>> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM ontology_entities \
             WHERE project_id = $1 AND ontology_id = $2 AND lower(name) = lower($3) \
               AND NOT is_deleted LIMIT 1"
        );
        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(scope.project_id().as_uuid())
            .bind(ontology_id.as_uuid())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx("find_by_name"))?;
        row.map(TryInto::try_into).transpose()
    }

    async fn upsert_entity(&self, scope: &TenantScope, entity: OntologyEntity) -> Result<OntologyEntity> {
        let sql = format!(
            "INSERT INTO ontology_entities ({ENTITY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, description = EXCLUDED.description, domain = EXCLUDED.domain, \
               primary_schema = EXCLUDED.primary_schema, primary_table = EXCLUDED.primary_table, \
               primary_column = EXCLUDED.primary_column, confidence = EXCLUDED.confidence, \
               is_stale = EXCLUDED.is_stale, is_promoted = EXCLUDED.is_promoted, \
               is_deleted = EXCLUDED.is_deleted, deletion_reason = EXCLUDED.deletion_reason, \
               updated_by = EXCLUDED.updated_by, updated_at = now() \
             RETURNING {ENTITY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(entity.id.as_uuid())
            .bind(scope.project_id().as_uuid())
            .bind(entity.ontology_id.as_uuid())
            .bind(&entity.name)
            .bind(&entity.description)
            .bind(&entity.domain)
            .bind(&entity.primary_schema)
            .bind(&entity.primary_table)
            .bind(&entity.primary_column)
            .bind(entity.confidence)
            .bind(entity.is_stale)
            .bind(entity.is_promoted)
            .bind(entity.is_deleted)
            .bind(&entity.deletion_reason)
            .bind(entity.created_by.to_db())
            .bind(entity.updated_by.map(|s| s.to_db()))
            .bind(entity.created_at)
            .bind(entity.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx("upsert_entity"))?;
        row.try_into()
    }

    async fn soft_delete_entity(&self, scope: &TenantScope, id: EntityId, reason: &str) -> Result<()> {
        sqlx::query(
            "UPDATE ontology_entities SET is_deleted = true, deletion_reason = $3, updated_at = now() \
             WHERE project_id = $1 AND id = $2",
        )
        .bind(scope.project_id().as_uuid())
        .bind(id.as_uuid())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx("soft_delete_entity"))?;
        Ok(())
    }

    async fn list_aliases(&self, scope: &TenantScope, entity_id: EntityId) -> Result<Vec<OntologyEntityAlias>> {
        let rows = sqlx::query_as::<_, AliasRow>(
            "SELECT a.id, a.entity_id, a.alias_text, a.source, a.created_at FROM ontology_entity_aliases a \
             JOIN ontology_entities e ON e.id = a.entity_id \
             WHERE e.project_id = $1 AND a.entity_id = $2",
        )
        .bind(scope.project_id().as_uuid())
        .bind(entity_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx("list_aliases"))?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn add_alias(&self, scope: &TenantScope, alias: OntologyEntityAlias) -> Result<EntityAliasId> {
        let _ = scope;
        let id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO ontology_entity_aliases (id, entity_id, alias_text, source, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (entity_id, alias_text) DO NOTHING \
             RETURNING id",
        )
        .bind(alias.id.as_uuid())
        .bind(alias.entity_id.as_uuid())
        .bind(&alias.alias_text)
        .bind(alias.source.to_db())
        .bind(alias.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("add_alias"))?;
        Ok(EntityAliasId::from_uuid(id))
    }

    async fn transfer_aliases(&self, scope: &TenantScope, from: EntityId, to: EntityId) -> Result<u64> {
        let _ = scope;
        let result = sqlx::query("UPDATE ontology_entity_aliases SET entity_id = $2 WHERE entity_id = $1")
        .bind(from.as_uuid())
        .bind(to.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx("transfer_aliases"))?;
        Ok(result.rows_affected())
    }

    async fn list_occurrences(
        &self,
        scope: &TenantScope,
        entity_id: EntityId,
    ) -> Result<Vec<OntologyEntityOccurrence>> {
        let rows = sqlx::query_as::<_, OccurrenceRow>(
            "SELECT o.id, o.entity_id, o.schema_name, o.table_name, o.column_name, o.role, o.created_at \
             FROM ontology_entity_occurrences o \
             JOIN ontology_entities e ON e.id = o.entity_id \
             WHERE e.project_id = $1 AND o.entity_id = $2",
        )
        .bind(scope.project_id().as_uuid())
        .bind(entity_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx("list_occurrences"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_occurrence(
        &self,
        scope: &TenantScope,
        occurrence: OntologyEntityOccurrence,
    ) -> Result<EntityOccurrenceId> {
        let _ = scope;
        let id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO ontology_entity_occurrences \
               (id, entity_id, schema_name, table_name, column_name, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (entity_id, schema_name, table_name, column_name) DO UPDATE SET role = EXCLUDED.role \
             RETURNING id",
        )
        .bind(occurrence.id.as_uuid())
        .bind(occurrence.entity_id.as_uuid())
        .bind(&occurrence.schema_name)
        .bind(&occurrence.table_name)
        .bind(&occurrence.column_name)
        .bind(&occurrence.role)
        .bind(occurrence.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx("add_occurrence"))?;
        Ok(EntityOccurrenceId::from_uuid(id))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AliasRow {
    id: uuid::Uuid,
    entity_id: uuid::Uuid,
    alias_text: String,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AliasRow> for OntologyEntityAlias {
    type Error = SchemaIntelError;

    fn try_from(r: AliasRow) -> Result<Self> {
        use schema_types::enums::AliasSource;
        Ok(OntologyEntityAlias {
            id: r.id.into(),
            entity_id: r.entity_id.into(),
            alias_text: r.alias_text,
            source: AliasSource::from_db(&r.source)?,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OccurrenceRow {
    id: uuid::Uuid,
    entity_id: uuid::Uuid,
    schema_name: String,
    table_name: String,
    column_name: String,
    role: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OccurrenceRow> for OntologyEntityOccurrence {
    fn from(r: OccurrenceRow) -> Self {
        OntologyEntityOccurrence {
            id: r.id.into(),
            entity_id: r.entity_id.into(),
            schema_name: r.schema_name,
            table_name: r.table_name,
            column_name: r.column_name,
            role: r.role,
            created_at: r.created_at,
        }
    }
}
