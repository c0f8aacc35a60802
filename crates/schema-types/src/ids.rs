//! Typed identifiers.
//!
//! Every domain row is keyed by a `Uuid`, but passing bare `Uuid`s around lets
//! a `DatasourceId` slip into a slot that expects an `EntityId` without the
//! compiler noticing. Each newtype below wraps a `Uuid` and nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

typed_id!(ProjectId);
typed_id!(DatasourceId);
typed_id!(SchemaTableId);
typed_id!(SchemaColumnId);
typed_id!(SchemaRelationshipId);
typed_id!(OntologyId);
typed_id!(EntityId);
typed_id!(EntityAliasId);
typed_id!(EntityOccurrenceId);
typed_id!(EntityRelationshipId);
typed_id!(RelationshipCandidateId);
typed_id!(WorkflowId);
typed_id!(WorkflowStateId);
typed_id!(QueryId);
typed_id!(AlertId);
