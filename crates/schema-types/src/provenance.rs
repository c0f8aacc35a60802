//! The provenance stamp carried through context on every write (§4.1).

use serde::{Deserialize, Serialize};

pub use crate::enums::ProvenanceSource;

/// `(source, user_id)` — who made a change and how. Every mutating
/// repository call reads one of these from the ambient context and stamps
/// `created_by`/`updated_by`. There is deliberately no `Default` impl: a
/// write path that has no `Provenance` to hand must fail to compile rather
/// than silently falling back to `Unknown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source: ProvenanceSource,
    pub user_id: String,
}

impl Provenance {
    pub fn new(source: ProvenanceSource, user_id: impl Into<String>) -> Self {
        Self {
            source,
            user_id: user_id.into(),
        }
    }

    pub fn manual(user_id: impl Into<String>) -> Self {
        Self::new(ProvenanceSource::Manual, user_id)
    }

    pub fn mcp(user_id: impl Into<String>) -> Self {
        Self::new(ProvenanceSource::Mcp, user_id)
    }

    pub fn inferred(user_id: impl Into<String>) -> Self {
        Self::new(ProvenanceSource::Inferred, user_id)
    }
}
