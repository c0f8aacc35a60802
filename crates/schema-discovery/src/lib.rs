//! Relationship discovery pipeline (§4.3): FK import, PK-match inference,
//! and review-candidate materialization ahead of LLM adjudication.

pub mod exclusion;
pub mod metrics;
pub mod pipeline;

pub use exclusion::is_pk_match_excluded;
pub use pipeline::{DiscoveryOutcome, DiscoveryService};
