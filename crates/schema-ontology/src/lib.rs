pub mod merge;
pub mod pluralize;
pub mod promotion;
pub mod service;

pub use merge::{
    copy_missing_identity, merge_entities, raise_confidence_and_clear_stale, redirect_relationships,
    soft_delete_source, source_name_alias,
};
pub use pluralize::pluralize;
pub use promotion::{choose_primary_column, passes_column_filter, promote_table};
pub use service::{OntologyService, PromotionSummary};
