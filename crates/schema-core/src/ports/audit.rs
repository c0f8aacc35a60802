//! Audit / SIEM sink contract (§6). The concrete sink is external (§1); the
//! query service only needs somewhere to report injection attempts.

use async_trait::async_trait;

use schema_types::ids::{ProjectId, QueryId};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct InjectionAttemptDetails {
    pub param_name: String,
    pub param_value: String,
    pub fingerprint: String,
    pub query_name: String,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_injection_attempt(
        &self,
        project_id: ProjectId,
        query_id: QueryId,
        details: InjectionAttemptDetails,
        client_ip: Option<String>,
    ) -> Result<()>;
}
