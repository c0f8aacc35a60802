//! Orchestrates one adjudication pass over a workflow's relationship
//! candidates: render prompt, call the LLM with retry-on-transport-failure,
//! parse (no retry), apply decisions, persist, and resolve `new_relationships`
//! against the live schema.
//!
//! Retry/backoff shape is grounded on the teacher's task-retry loop in
//! `ob-workflow`'s listener: a small fixed attempt cap with a sleeping
//! backoff between attempts, applied only around the transport call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use schema_core::context::TenantScope;
use schema_core::error::Result;
use schema_core::ports::{LlmClient, RelationshipRepository, SchemaRepository};
use schema_types::enums::{Cardinality, InferenceMethod};
use schema_types::ids::{DatasourceId, WorkflowId};
use schema_types::ontology::RelationshipCandidate;
use schema_types::schema::RelationshipMetrics;

use crate::decision::apply_decisions;
use crate::parsing::{parse_llm_response, NewRelationship};
use crate::prompt::{render_prompt, TableContext};

/// Matches the transport retry cap used for other task kinds in the
/// workflow engine (§4.2/§4.3/§4.4 "retried up to 3 times with backoff").
const MAX_TRANSPORT_ATTEMPTS: u32 = 3;
const TRANSPORT_BACKOFF_BASE_MS: u64 = 200;

#[derive(Debug, Default)]
pub struct AdjudicationSummary {
    pub decisions_applied: usize,
    pub new_relationships_created: usize,
    pub new_relationships_skipped: usize,
}

pub struct AdjudicationService {
    schema: Arc<dyn SchemaRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    llm: Arc<dyn LlmClient>,
}

impl AdjudicationService {
    pub fn new(
        schema: Arc<dyn SchemaRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            schema,
            relationships,
            llm,
        }
    }

    async fn call_llm_with_retry(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.llm.generate_response(prompt, "", 0.0, false).await {
                Ok(response) => return Ok(response.content),
                Err(err) if attempt < MAX_TRANSPORT_ATTEMPTS => {
                    warn!(attempt, error = %err, "llm transport call failed, retrying");
                    let backoff = TRANSPORT_BACKOFF_BASE_MS * attempt as u64;
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs adjudication for every non-FK candidate of `workflow_id` on
    /// `datasource_id`. FK-imported candidates never reach this pipeline
    /// (§4.4: "These are never re-examined by the LLM") and are filtered out
    /// by callers before candidates are even materialized, so no filtering
    /// happens here.
    pub async fn adjudicate(
        &self,
        scope: &TenantScope,
        datasource_id: DatasourceId,
        workflow_id: WorkflowId,
    ) -> Result<AdjudicationSummary> {
        let mut candidates = self.relationships.list_candidates(scope, workflow_id).await?;
        if candidates.is_empty() {
            return Ok(AdjudicationSummary::default());
        }

        let tables = self.schema.selected_tables(scope, datasource_id).await?;
        let mut columns_by_table = HashMap::new();
        for table in &tables {
            let cols = self.schema.selected_columns(scope, table.id).await?;
            columns_by_table.insert(table.id, cols);
        }
        let contexts: Vec<TableContext<'_>> = tables
            .iter()
            .map(|t| TableContext {
                table: t,
                columns: columns_by_table.get(&t.id).map(|v| v.as_slice()).unwrap_or(&[]),
            })
            .collect();

        let prompt = render_prompt(&contexts, &candidates);
        let raw = self.call_llm_with_retry(&prompt).await?;
        let output = parse_llm_response(&raw)?;

        let applied = apply_decisions(&mut candidates, &output);
        for candidate in &candidates {
            self.relationships.upsert_candidate(scope, candidate.clone()).await?;
        }
        info!(applied, total = candidates.len(), "applied llm adjudication decisions");

        let mut created = 0;
        let mut skipped = 0;
        for new_rel in &output.new_relationships {
            match self
                .resolve_new_relationship(scope, &tables, &columns_by_table, workflow_id, datasource_id, new_rel)
                .await?
            {
                Some(candidate) => {
                    self.relationships.upsert_candidate(scope, candidate).await?;
                    created += 1;
                }
                None => skipped += 1,
            }
        }

        Ok(AdjudicationSummary {
            decisions_applied: applied,
            new_relationships_created: created,
            new_relationships_skipped: skipped,
        })
    }

    /// Resolves a schema-only `new_relationships[]` entry (named by
    /// table/column) into a persistable `RelationshipCandidate` with
    /// `detection_method = llm` and null metrics (§4.4). Returns `None` and
    /// logs when the named table/column cannot be found, mirroring the
    /// "unknown references are logged and skipped" treatment given to
    /// decisions.
    async fn resolve_new_relationship(
        &self,
        scope: &TenantScope,
        tables: &[schema_types::schema::SchemaTable],
        columns_by_table: &HashMap<schema_types::ids::SchemaTableId, Vec<schema_types::schema::SchemaColumn>>,
        workflow_id: WorkflowId,
        datasource_id: DatasourceId,
        new_rel: &NewRelationship,
    ) -> Result<Option<RelationshipCandidate>> {
        let find_column = |table_name: &str, column_name: &str| {
            tables
                .iter()
                .find(|t| t.table_name == table_name)
                .and_then(|t| columns_by_table.get(&t.id))
                .and_then(|cols| cols.iter().find(|c| c.column_name == column_name))
        };

        let source = find_column(&new_rel.source_table, &new_rel.source_column);
        let target = find_column(&new_rel.target_table, &new_rel.target_column);

        let (source, target) = match (source, target) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                warn!(
                    source = %new_rel.source_table,
                    target = %new_rel.target_table,
                    "new_relationships entry references an unknown table/column, skipping"
                );
                return Ok(None);
            }
        };

        let cardinality = match new_rel.cardinality.as_str() {
            "1:1" => Cardinality::OneToOne,
            "N:1" => Cardinality::ManyToOne,
            "1:N" => Cardinality::OneToMany,
            "N:M" => Cardinality::ManyToMany,
            _ => Cardinality::Unknown,
        };

        let now = chrono::Utc::now();
        Ok(Some(RelationshipCandidate {
            id: schema_types::ids::RelationshipCandidateId::new(),
            workflow_id,
            datasource_id,
            source_column_id: source.id,
            target_column_id: target.id,
            detection_method: InferenceMethod::Llm,
            confidence: 1.0,
            metrics: RelationshipMetrics::default(),
            cardinality,
            llm_reasoning: Some(new_rel.reasoning.clone()),
            status: schema_types::enums::CandidateStatus::Pending,
            is_required: true,
            created_at: now,
            updated_at: now,
        }))
    }
}
