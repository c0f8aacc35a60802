//! Parameterized execution (§4.6): binds parameters, scans them for
//! injection attempts, dispatches to the read or write adapter path, and
//! increments usage count fire-and-forget.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as Json;
use tracing::warn;

use schema_core::context::TenantScope;
use schema_core::error::{Result, ResultExt, SchemaIntelError};
use schema_core::ports::{
    AuditSink, BoundValue, ExecuteResult, InjectionAttemptDetails, InjectionDetector, QueryExecutionResult,
    QueryExecutor, QueryRepository,
};
use schema_types::query::Query;

use crate::substitution::bind;

#[derive(Debug)]
pub enum ExecutionOutcome {
    Read(QueryExecutionResult),
    Write(ExecuteResult),
}

pub struct QueryExecutionService {
    queries: Arc<dyn QueryRepository>,
    audit: Arc<dyn AuditSink>,
    detector: Arc<dyn InjectionDetector>,
}

impl QueryExecutionService {
    pub fn new(queries: Arc<dyn QueryRepository>, audit: Arc<dyn AuditSink>, detector: Arc<dyn InjectionDetector>) -> Self {
        Self { queries, audit, detector }
    }

    /// Runs `query` against `executor`, a per-call adapter instance (§5) the
    /// caller owns and is responsible for `close()`-ing on every exit path.
    pub async fn execute(
        &self,
        scope: &TenantScope,
        query: &Query,
        executor: &dyn QueryExecutor,
        supplied: &HashMap<String, Json>,
        client_ip: Option<String>,
    ) -> Result<ExecutionOutcome> {
        let (sql, bound_values) = bind(&query.sql_query, &query.parameters, supplied)?;
        let placeholder_names = crate::substitution::find_placeholders(&query.sql_query);

        for (name, value) in placeholder_names.iter().zip(&bound_values) {
            if let Some(text) = text_value(value) {
                if let Some(fingerprint) = self.detector.scan(&text) {
                    let details = InjectionAttemptDetails {
                        param_name: name.clone(),
                        param_value: text,
                        fingerprint: fingerprint.clone(),
                        query_name: query.id.to_string(),
                    };
                    self.audit
                        .log_injection_attempt(scope.project_id(), query.id, details, client_ip)
                        .await
                        .ctx("log injection attempt")?;
                    return Err(SchemaIntelError::SecurityViolation(format!(
                        "parameter {name} matched fingerprint {fingerprint}"
                    )));
                }
            }
        }

        let outcome = if query.allows_modification {
            ExecutionOutcome::Write(executor.execute_with_params(&sql, &bound_values).await?)
        } else {
            ExecutionOutcome::Read(executor.query_with_params(&sql, &bound_values, None).await?)
        };

        if let Err(err) = self.queries.increment_usage(scope, query.id).await {
            warn!(query_id = %query.id, error = %err, "failed to increment query usage count");
        }

        Ok(outcome)
    }
}

fn text_value(value: &BoundValue) -> Option<String> {
    match value {
        BoundValue::Text(s) => Some(s.clone()),
        BoundValue::TextArray(items) => Some(items.join(",")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use chrono::Utc;
    use schema_types::enums::{ParameterType, QueryStatus};
    use schema_types::ids::{DatasourceId, ProjectId, QueryId};
    use schema_types::provenance::Provenance;
    use schema_types::query::QueryParameter;

    fn scope() -> TenantScope {
        TenantScope::new(ProjectId::new(), Provenance::manual("tester"))
    }

    fn read_query(sql: &str, params: Vec<QueryParameter>) -> Query {
        Query {
            id: QueryId::new(),
            project_id: ProjectId::new(),
            datasource_id: DatasourceId::new(),
            natural_language_prompt: None,
            additional_context: None,
            sql_query: sql.into(),
            dialect: "postgres".into(),
            is_enabled: true,
            parameters: params,
            output_columns: vec![],
            tags: vec![],
            status: QueryStatus::Approved,
            suggested_by: None,
            suggestion_context: None,
            parent_query_id: None,
            allows_modification: false,
            usage_count: 0,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct FakeExecutor;

    #[async_trait]
    impl QueryExecutor for FakeExecutor {
        async fn query(&self, _sql: &str, _limit: Option<i64>) -> Result<QueryExecutionResult> {
            Ok(QueryExecutionResult { columns: vec![], rows: vec![] })
        }
        async fn query_with_params(
            &self,
            _sql: &str,
            _values: &[BoundValue],
            _limit: Option<i64>,
        ) -> Result<QueryExecutionResult> {
            Ok(QueryExecutionResult { columns: vec!["id".into()], rows: vec![] })
        }
        async fn execute_with_params(&self, _sql: &str, _values: &[BoundValue]) -> Result<ExecuteResult> {
            Ok(ExecuteResult { rows_affected: 1, rows: None })
        }
        async fn validate_query(&self, _sql: &str) -> Result<()> {
            Ok(())
        }
        async fn close(&self) {}
    }

    struct FakeAudit {
        logged: Mutex<u32>,
    }

    #[async_trait]
    impl AuditSink for FakeAudit {
        async fn log_injection_attempt(
            &self,
            _project_id: ProjectId,
            _query_id: QueryId,
            _details: InjectionAttemptDetails,
            _client_ip: Option<String>,
        ) -> Result<()> {
            *self.logged.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct FakeQueries;

    #[async_trait]
    impl QueryRepository for FakeQueries {
        async fn get(&self, _scope: &TenantScope, id: QueryId) -> Result<Query> {
            Err(SchemaIntelError::not_found(id.to_string()))
        }
        async fn list(&self, _scope: &TenantScope, _datasource_id: DatasourceId) -> Result<Vec<Query>> {
            Ok(vec![])
        }
        async fn insert(&self, _scope: &TenantScope, query: Query) -> Result<Query> {
            Ok(query)
        }
        async fn update(&self, _scope: &TenantScope, query: Query) -> Result<Query> {
            Ok(query)
        }
        async fn soft_delete(&self, _scope: &TenantScope, _id: QueryId) -> Result<()> {
            Ok(())
        }
        async fn list_pending_children(&self, _scope: &TenantScope, _parent_id: QueryId) -> Result<Vec<Query>> {
            Ok(vec![])
        }
        async fn increment_usage(&self, _scope: &TenantScope, _id: QueryId) -> Result<()> {
            Ok(())
        }
    }

    struct RejectAll;
    impl InjectionDetector for RejectAll {
        fn scan(&self, _value: &str) -> Option<String> {
            Some("always".into())
        }
    }
    struct AllowAll;
    impl InjectionDetector for AllowAll {
        fn scan(&self, _value: &str) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn clean_read_executes_and_increments_usage() {
        let query = read_query(
            "select * from t where a = {{alpha}}",
            vec![QueryParameter { name: "alpha".into(), param_type: ParameterType::Integer, required: true, default_value: None }],
        );
        let service = QueryExecutionService::new(
            Arc::new(FakeQueries),
            Arc::new(FakeAudit { logged: Mutex::new(0) }),
            Arc::new(AllowAll),
        );
        let mut supplied = HashMap::new();
        supplied.insert("alpha".to_string(), Json::from(1));
        let outcome = service.execute(&scope(), &query, &FakeExecutor, &supplied, None).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Read(_)));
    }

    #[tokio::test]
    async fn detected_injection_logs_and_refuses_execution() {
        let query = read_query(
            "select * from t where a = {{alpha}}",
            vec![QueryParameter { name: "alpha".into(), param_type: ParameterType::String, required: true, default_value: None }],
        );
        let audit = Arc::new(FakeAudit { logged: Mutex::new(0) });
        let service = QueryExecutionService::new(Arc::new(FakeQueries), audit.clone(), Arc::new(RejectAll));
        let mut supplied = HashMap::new();
        supplied.insert("alpha".to_string(), Json::from("whatever"));
        let err = service.execute(&scope(), &query, &FakeExecutor, &supplied, None).await.unwrap_err();
        assert!(matches!(err, SchemaIntelError::SecurityViolation(_)));
        assert_eq!(*audit.logged.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn write_path_returns_rows_affected() {
        let mut query = read_query("update t set x = {{alpha}}", vec![
            QueryParameter { name: "alpha".into(), param_type: ParameterType::Integer, required: true, default_value: None },
        ]);
        query.allows_modification = true;
        let service = QueryExecutionService::new(
            Arc::new(FakeQueries),
            Arc::new(FakeAudit { logged: Mutex::new(0) }),
            Arc::new(AllowAll),
        );
        let mut supplied = HashMap::new();
        supplied.insert("alpha".to_string(), Json::from(5));
        let outcome = service.execute(&scope(), &query, &FakeExecutor, &supplied, None).await.unwrap();
        match outcome {
            ExecutionOutcome::Write(result) => assert_eq!(result.rows_affected, 1),
            _ => panic!("expected write outcome"),
        }
    }
}
