//! Query lifecycle and approval workflow (§4.6): `direct_create`/
//! `direct_update` bypass review; `suggest_update` opens a pending
//! suggestion alongside the live original; `approve` either promotes a new
//! query or folds an update suggestion into its parent.

use std::sync::Arc;

use chrono::Utc;

use schema_core::context::TenantScope;
use schema_core::error::{Result, ResultExt, SchemaIntelError};
use schema_core::ports::QueryRepository;
use schema_types::enums::QueryStatus;
use schema_types::ids::QueryId;
use schema_types::query::Query;

pub struct QueryApprovalService {
    queries: Arc<dyn QueryRepository>,
}

impl QueryApprovalService {
    pub fn new(queries: Arc<dyn QueryRepository>) -> Self {
        Self { queries }
    }

    /// Admin-only bypass: inserts `query` already approved and enabled.
    pub async fn direct_create(&self, scope: &TenantScope, mut query: Query) -> Result<Query> {
        normalize(&mut query)?;
        query.status = QueryStatus::Approved;
        query.is_enabled = true;
        self.queries.insert(scope, query).await.ctx("direct_create")
    }

    /// Admin-only bypass: persists `query` as-is, already approved.
    pub async fn direct_update(&self, scope: &TenantScope, mut query: Query) -> Result<Query> {
        normalize(&mut query)?;
        query.status = QueryStatus::Approved;
        self.queries.update(scope, query).await.ctx("direct_update")
    }

    /// Opens a new pending row carrying the proposed changes; the original
    /// stays live and unaffected until the suggestion is approved.
    pub async fn suggest_update(&self, scope: &TenantScope, query_id: QueryId, mut suggested: Query) -> Result<Query> {
        let parent = self.queries.get(scope, query_id).await.ctx("suggest_update")?;
        normalize(&mut suggested)?;
        suggested.id = QueryId::new();
        suggested.project_id = parent.project_id;
        suggested.datasource_id = parent.datasource_id;
        suggested.parent_query_id = Some(query_id);
        suggested.status = QueryStatus::Pending;
        suggested.is_enabled = false;
        suggested.usage_count = 0;
        suggested.is_deleted = false;
        self.queries.insert(scope, suggested).await.ctx("suggest_update")
    }

    /// Approves a pending row: a standalone suggestion (`parent_query_id =
    /// None`) is promoted in place; an update suggestion copies its fields
    /// onto the parent and soft-deletes itself, unless the parent has since
    /// been deleted, in which case the suggestion is rejected instead.
    pub async fn approve(&self, scope: &TenantScope, query_id: QueryId) -> Result<Query> {
        let suggestion = self.queries.get(scope, query_id).await.ctx("approve")?;

        let Some(parent_id) = suggestion.parent_query_id else {
            let mut approved = suggestion;
            approved.status = QueryStatus::Approved;
            approved.is_enabled = true;
            return self.queries.update(scope, approved).await.ctx("approve");
        };

        let parent = match self.queries.get(scope, parent_id).await {
            Ok(parent) if !parent.is_deleted => parent,
            _ => {
                let mut rejected = suggestion;
                rejected.status = QueryStatus::Rejected;
                rejected.suggestion_context = Some("Original query was deleted".into());
                return self.queries.update(scope, rejected).await.ctx("approve");
            }
        };

        let mut merged = parent;
        merged.sql_query = suggestion.sql_query.clone();
        merged.parameters = suggestion.parameters.clone();
        merged.output_columns = suggestion.output_columns.clone();
        merged.tags = suggestion.tags.clone();
        merged.allows_modification = suggestion.allows_modification;
        merged.natural_language_prompt = suggestion.natural_language_prompt.clone();
        merged.additional_context = suggestion.additional_context.clone();
        merged.updated_at = Utc::now();
        let merged = self.queries.update(scope, merged).await.ctx("approve")?;

        self.queries.soft_delete(scope, suggestion.id).await.ctx("approve")?;
        Ok(merged)
    }

    /// Soft-deletes `query_id` and auto-rejects every pending child
    /// suggestion, returning the number rejected.
    pub async fn delete_with_pending_rejection(&self, scope: &TenantScope, query_id: QueryId) -> Result<u32> {
        self.queries.soft_delete(scope, query_id).await.ctx("delete_with_pending_rejection")?;
        let children = self.queries.list_pending_children(scope, query_id).await.ctx("delete_with_pending_rejection")?;
        let mut rejected = 0u32;
        for mut child in children {
            if child.status != QueryStatus::Pending {
                continue;
            }
            child.status = QueryStatus::Rejected;
            child.suggestion_context = Some("Original query was deleted".into());
            self.queries.update(scope, child).await.ctx("delete_with_pending_rejection")?;
            rejected += 1;
        }
        Ok(rejected)
    }

    /// Returns a rejected suggestion to `pending`, clearing the rejection
    /// annotation left by `approve`/`delete_with_pending_rejection`.
    pub async fn move_to_pending(&self, scope: &TenantScope, query_id: QueryId) -> Result<Query> {
        let mut query = self.queries.get(scope, query_id).await.ctx("move_to_pending")?;
        if query.status != QueryStatus::Rejected {
            return Err(SchemaIntelError::invalid_argument("only a rejected suggestion can move to pending"));
        }
        query.status = QueryStatus::Pending;
        query.suggestion_context = None;
        self.queries.update(scope, query).await.ctx("move_to_pending")
    }
}

/// §4.6: normalizes `allows_modification` against the SQL shape, then
/// rejects a query that still requires `output_columns` (i.e. a SELECT) but
/// declares none.
fn normalize(query: &mut Query) -> Result<()> {
    query.allows_modification = Query::normalize_allows_modification(&query.sql_query, query.allows_modification);
    if query.requires_output_columns() && query.output_columns.is_empty() {
        return Err(SchemaIntelError::invalid_argument(
            "output_columns are required for a query that does not allow modification",
        ));
    }
    Ok(())
}
