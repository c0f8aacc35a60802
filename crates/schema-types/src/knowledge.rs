//! Knowledge facts seeded into a project's domain glossary (§3.1, §6, §4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::FactType;
use crate::ids::ProjectId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFact {
    pub project_id: ProjectId,
    pub fact_type: FactType,
    pub key: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to an upsert — idempotent on `(project, fact_type, key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFactInput {
    pub fact_type: FactType,
    pub key: String,
    pub context: String,
}
