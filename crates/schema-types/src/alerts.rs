//! Audit alert model (§3.1, §4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::enums::{AlertSeverity, AlertStatus};
use crate::ids::{AlertId, ProjectId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditAlert {
    pub id: AlertId,
    pub project_id: ProjectId,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub details: Json,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
