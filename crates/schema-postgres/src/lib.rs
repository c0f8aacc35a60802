//! PostgreSQL implementations of every `schema-core` repository port trait.
//!
//! Every query here is runtime-checked (`sqlx::query`/`query_as`, never the
//! `query!` macros) so the crate builds without a live database.

pub mod alert_repo;
pub mod entity_repo;
pub mod knowledge_repo;
pub mod mcp_config_repo;
pub mod ontology_repo;
pub mod query_repo;
pub mod relationship_repo;
pub mod schema_repo;
pub mod sqlx_types;
pub mod support;
pub mod workflow_repo;
pub mod workflow_state_repo;

pub use alert_repo::PgAlertRepository;
pub use entity_repo::PgEntityRepository;
pub use knowledge_repo::PgKnowledgeRepository;
pub use mcp_config_repo::PgMCPConfigRepository;
pub use ontology_repo::PgOntologyRepository;
pub use query_repo::PgQueryRepository;
pub use relationship_repo::PgRelationshipRepository;
pub use schema_repo::PgSchemaRepository;
pub use workflow_repo::PgWorkflowRepository;
pub use workflow_state_repo::PgWorkflowStateRepository;

use sqlx::PgPool;

/// Convenience bundle that constructs every Postgres adapter from one pool.
pub struct PgRepositories {
    pub schema: PgSchemaRepository,
    pub relationships: PgRelationshipRepository,
    pub ontology: PgOntologyRepository,
    pub entities: PgEntityRepository,
    pub workflows: PgWorkflowRepository,
    pub workflow_state: PgWorkflowStateRepository,
    pub queries: PgQueryRepository,
    pub knowledge: PgKnowledgeRepository,
    pub alerts: PgAlertRepository,
    pub mcp_config: PgMCPConfigRepository,
}

impl PgRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            schema: PgSchemaRepository::new(pool.clone()),
            relationships: PgRelationshipRepository::new(pool.clone()),
            ontology: PgOntologyRepository::new(pool.clone()),
            entities: PgEntityRepository::new(pool.clone()),
            workflows: PgWorkflowRepository::new(pool.clone()),
            workflow_state: PgWorkflowStateRepository::new(pool.clone()),
            queries: PgQueryRepository::new(pool.clone()),
            knowledge: PgKnowledgeRepository::new(pool.clone()),
            alerts: PgAlertRepository::new(pool.clone()),
            mcp_config: PgMCPConfigRepository::new(pool),
        }
    }
}
