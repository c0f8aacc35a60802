//! The workspace-wide error taxonomy (§7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaIntelError>;

#[derive(Debug, Error)]
pub enum SchemaIntelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("security violation: {0}")]
    SecurityViolation(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<schema_types::enums::UnknownDbValue> for SchemaIntelError {
    fn from(e: schema_types::enums::UnknownDbValue) -> Self {
        Self::Internal(anyhow::Error::from(e))
    }
}

impl SchemaIntelError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Classification used by the (external, out-of-scope) transport layer
    /// to pick an HTTP status — mirrors the teacher's `SemOsError::http_status`.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::PreconditionFailed(_) => 412,
            Self::SecurityViolation(_) => 403,
            Self::ParseError(_) => 422,
            Self::Cancelled(_) => 499,
            Self::Internal(_) => 500,
        }
    }
}

/// Wraps a repository error with a short action label, producing messages
/// like `"get query: not found"` per §7's literal example.
pub trait ResultExt<T> {
    fn ctx(self, action: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn ctx(self, action: &str) -> Result<T> {
        self.map_err(|e| match e {
            SchemaIntelError::NotFound(m) => SchemaIntelError::NotFound(format!("{action}: {m}")),
            SchemaIntelError::InvalidArgument(m) => {
                SchemaIntelError::InvalidArgument(format!("{action}: {m}"))
            }
            SchemaIntelError::Conflict(m) => SchemaIntelError::Conflict(format!("{action}: {m}")),
            other => other,
        })
    }
}
