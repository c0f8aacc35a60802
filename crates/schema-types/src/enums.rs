//! Enumerations shared across the workspace.

use serde::{Deserialize, Serialize};

/// Error returned by an enum's `from_db` when the stored text doesn't match
/// any known variant. Lives here (rather than returning `SchemaIntelError`
/// directly) because `schema-types` cannot depend on `schema-core` without
/// creating a cycle; `schema-core` converts this into `SchemaIntelError`.
#[derive(Debug)]
pub struct UnknownDbValue {
    pub type_name: &'static str,
    pub value: String,
}

impl std::fmt::Display for UnknownDbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized db value {:?} for {}", self.value, self.type_name)
    }
}

impl std::error::Error for UnknownDbValue {}

macro_rules! db_enum {
    ($ty:ty, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn to_db(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            pub fn from_db(s: &str) -> Result<Self, UnknownDbValue> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownDbValue {
                        type_name: stringify!($ty),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Where a piece of provenance came from. Ordered by write precedence
/// (`manual` beats `mcp` beats `inferred` beats `unknown`) — see
/// `schema_core::precedence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceSource {
    Manual,
    Mcp,
    Inferred,
    /// Not one of the three named sources in §3.1/§4.1 — always loses
    /// precedence. Never constructed by a write path; exists only as the
    /// floor value for elements whose provenance has never been set.
    Unknown,
}

impl ProvenanceSource {
    /// Precedence level: `manual (3) > mcp (2) > inferred (1) > unknown (0)`.
    pub fn level(self) -> u8 {
        match self {
            Self::Manual => 3,
            Self::Mcp => 2,
            Self::Inferred => 1,
            Self::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    ForeignKey,
    Inferred,
    Manual,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:M")]
    ManyToMany,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMethod {
    ForeignKey,
    ValueOverlap,
    PkMatch,
    ColumnFeatures,
    NameInference,
    Llm,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasSource {
    Llm,
    Mcp,
    Merge,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Relationships,
    Ontology,
    Enrichment,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relationships => "relationships",
            Self::Ontology => "ontology",
            Self::Enrichment => "enrichment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Running,
    PausedForReview,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStateStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    Timestamp,
    Uuid,
    StringArray,
    IntegerArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "resolved" => Some(Self::Resolved),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    Terminology,
    BusinessRule,
    Convention,
}

db_enum!(ProvenanceSource, {
    Manual => "manual",
    Mcp => "mcp",
    Inferred => "inferred",
    Unknown => "unknown",
});

db_enum!(RelationshipType, {
    ForeignKey => "foreign_key",
    Inferred => "inferred",
    Manual => "manual",
    Review => "review",
});

db_enum!(Cardinality, {
    OneToOne => "1:1",
    ManyToOne => "N:1",
    OneToMany => "1:N",
    ManyToMany => "N:M",
    Unknown => "unknown",
});

db_enum!(InferenceMethod, {
    ForeignKey => "foreign_key",
    ValueOverlap => "value_overlap",
    PkMatch => "pk_match",
    ColumnFeatures => "column_features",
    NameInference => "name_inference",
    Llm => "llm",
    Hybrid => "hybrid",
});

db_enum!(AliasSource, {
    Llm => "llm",
    Mcp => "mcp",
    Merge => "merge",
    Manual => "manual",
});

db_enum!(CandidateStatus, {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

db_enum!(WorkflowPhase, {
    Relationships => "relationships",
    Ontology => "ontology",
    Enrichment => "enrichment",
});

db_enum!(WorkflowState, {
    Pending => "pending",
    Running => "running",
    PausedForReview => "paused_for_review",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

db_enum!(EntityStateStatus, {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
    Skipped => "skipped",
});

db_enum!(QueryStatus, {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

db_enum!(ParameterType, {
    String => "string",
    Integer => "integer",
    Decimal => "decimal",
    Boolean => "boolean",
    Date => "date",
    Timestamp => "timestamp",
    Uuid => "uuid",
    StringArray => "string[]",
    IntegerArray => "integer[]",
});

db_enum!(AlertSeverity, {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

db_enum!(AlertStatus, {
    Open => "open",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

db_enum!(FactType, {
    Terminology => "terminology",
    BusinessRule => "business_rule",
    Convention => "convention",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_provenance_source() {
        for s in [
            ProvenanceSource::Manual,
            ProvenanceSource::Mcp,
            ProvenanceSource::Inferred,
            ProvenanceSource::Unknown,
        ] {
            assert_eq!(ProvenanceSource::from_db(s.to_db()).unwrap(), s);
        }
    }

    #[test]
    fn unknown_db_text_is_an_internal_error() {
        assert!(RelationshipType::from_db("bogus").is_err());
    }

    #[test]
    fn precedence_levels_are_strictly_ordered() {
        assert!(ProvenanceSource::Manual.level() > ProvenanceSource::Mcp.level());
        assert!(ProvenanceSource::Mcp.level() > ProvenanceSource::Inferred.level());
        assert!(ProvenanceSource::Inferred.level() > ProvenanceSource::Unknown.level());
    }

    #[test]
    fn cardinality_serializes_with_colon_notation() {
        let json = serde_json::to_string(&Cardinality::ManyToOne).unwrap();
        assert_eq!(json, "\"N:1\"");
    }
}
