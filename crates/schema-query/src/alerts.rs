//! Audit alert state machine (§4.7): validation runs title → severity →
//! (for resolve) resolution/resolved_by → status transition, each failing
//! fast with `InvalidArgument` before any repository call.

use std::sync::Arc;

use chrono::Utc;

use schema_core::context::TenantScope;
use schema_core::error::{Result, ResultExt, SchemaIntelError};
use schema_core::ports::AlertRepository;
use schema_types::alerts::AuditAlert;
use schema_types::enums::{AlertSeverity, AlertStatus};
use schema_types::ids::AlertId;

pub struct AlertService {
    alerts: Arc<dyn AlertRepository>,
}

impl AlertService {
    pub fn new(alerts: Arc<dyn AlertRepository>) -> Self {
        Self { alerts }
    }

    pub async fn create(&self, scope: &TenantScope, mut alert: AuditAlert) -> Result<AuditAlert> {
        validate_title(&alert.title)?;
        alert.status = AlertStatus::Open;
        alert.resolved_by = None;
        alert.resolved_at = None;
        alert.resolution_notes = None;
        self.alerts.insert(scope, alert).await.ctx("create alert")
    }

    /// `resolution` must be `"resolved"` or `"dismissed"`; transitions the
    /// alert and atomically stamps resolver, timestamp, and notes.
    pub async fn resolve(
        &self,
        scope: &TenantScope,
        alert_id: AlertId,
        resolved_by: &str,
        resolution: &str,
        notes: Option<String>,
    ) -> Result<AuditAlert> {
        if resolved_by.trim().is_empty() {
            return Err(SchemaIntelError::invalid_argument("resolved_by is required"));
        }
        let target_status = match resolution {
            "resolved" => AlertStatus::Resolved,
            "dismissed" => AlertStatus::Dismissed,
            other => return Err(SchemaIntelError::invalid_argument(format!("invalid resolution: {other}"))),
        };

        let mut alert = self.alerts.get(scope, alert_id).await.ctx("resolve alert")?;
        if alert.status != AlertStatus::Open {
            return Err(SchemaIntelError::invalid_argument("alert is not open"));
        }

        alert.status = target_status;
        alert.resolved_by = Some(resolved_by.to_string());
        alert.resolved_at = Some(Utc::now());
        alert.resolution_notes = notes;
        self.alerts.update(scope, alert).await.ctx("resolve alert")
    }

    pub async fn list(
        &self,
        scope: &TenantScope,
        status: Option<&str>,
        severity: Option<&str>,
    ) -> Result<Vec<AuditAlert>> {
        let status = status.map(parse_status).transpose()?;
        let severity = severity.map(parse_severity).transpose()?;
        self.alerts.list(scope, status, severity).await.ctx("list alerts")
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(SchemaIntelError::invalid_argument("title is required"));
    }
    Ok(())
}

fn parse_status(s: &str) -> Result<AlertStatus> {
    AlertStatus::parse(s).ok_or_else(|| SchemaIntelError::invalid_argument(format!("invalid status: {s}")))
}

fn parse_severity(s: &str) -> Result<AlertSeverity> {
    AlertSeverity::parse(s).ok_or_else(|| SchemaIntelError::invalid_argument(format!("invalid severity: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use schema_types::ids::ProjectId;

    fn scope() -> TenantScope {
        TenantScope::new(ProjectId::new(), schema_types::provenance::Provenance::manual("operator"))
    }

    fn alert(title: &str) -> AuditAlert {
        AuditAlert {
            id: AlertId::new(),
            project_id: ProjectId::new(),
            alert_type: "injection_attempt".into(),
            severity: AlertSeverity::Critical,
            status: AlertStatus::Open,
            title: title.into(),
            details: serde_json::json!({}),
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct FakeAlerts {
        rows: Mutex<Vec<AuditAlert>>,
    }

    #[async_trait]
    impl AlertRepository for FakeAlerts {
        async fn insert(&self, _scope: &TenantScope, alert: AuditAlert) -> Result<AuditAlert> {
            self.rows.lock().unwrap().push(alert.clone());
            Ok(alert)
        }
        async fn get(&self, _scope: &TenantScope, id: AlertId) -> Result<AuditAlert> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or_else(|| SchemaIntelError::not_found(id.to_string()))
        }
        async fn update(&self, _scope: &TenantScope, alert: AuditAlert) -> Result<AuditAlert> {
            let mut guard = self.rows.lock().unwrap();
            if let Some(existing) = guard.iter_mut().find(|a| a.id == alert.id) {
                *existing = alert.clone();
            }
            Ok(alert)
        }
        async fn list(
            &self,
            _scope: &TenantScope,
            status: Option<AlertStatus>,
            severity: Option<AlertSeverity>,
        ) -> Result<Vec<AuditAlert>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|a| status.map_or(true, |s| a.status == s))
                .filter(|a| severity.map_or(true, |s| a.severity == s))
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn empty_title_fails_before_insert() {
        let repo = Arc::new(FakeAlerts { rows: Mutex::new(vec![]) });
        let service = AlertService::new(repo.clone());
        let err = service.create(&scope(), alert("  ")).await.unwrap_err();
        assert!(matches!(err, SchemaIntelError::InvalidArgument(_)));
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_stamps_resolver_and_timestamp() {
        let repo = Arc::new(FakeAlerts { rows: Mutex::new(vec![alert("injection on query x")]) });
        let id = repo.rows.lock().unwrap()[0].id;
        let service = AlertService::new(repo);
        let resolved = service
            .resolve(&scope(), id, "alice", "resolved", Some("false positive".into()))
            .await
            .unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("alice"));
        assert!(resolved.resolved_at.is_some());
    }

    #[tokio::test]
    async fn resolve_rejects_invalid_resolution_before_touching_storage() {
        let repo = Arc::new(FakeAlerts { rows: Mutex::new(vec![alert("x")]) });
        let id = repo.rows.lock().unwrap()[0].id;
        let service = AlertService::new(repo);
        let err = service.resolve(&scope(), id, "alice", "ignored", None).await.unwrap_err();
        assert!(matches!(err, SchemaIntelError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn resolve_requires_resolved_by() {
        let repo = Arc::new(FakeAlerts { rows: Mutex::new(vec![alert("x")]) });
        let id = repo.rows.lock().unwrap()[0].id;
        let service = AlertService::new(repo);
        let err = service.resolve(&scope(), id, "  ", "resolved", None).await.unwrap_err();
        assert!(matches!(err, SchemaIntelError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn list_validates_filters_against_enumerated_sets() {
        let repo = Arc::new(FakeAlerts { rows: Mutex::new(vec![]) });
        let service = AlertService::new(repo);
        assert!(service.list(&scope(), Some("bogus"), None).await.is_err());
        assert!(service.list(&scope(), Some("open"), Some("critical")).await.is_ok());
    }
}
