pub mod alerts;
pub mod approval;
pub mod coercion;
pub mod execution;
pub mod knowledge;
pub mod substitution;

#[cfg(feature = "test-support")]
pub mod injection;

pub use alerts::AlertService;
pub use approval::QueryApprovalService;
pub use coercion::coerce;
pub use execution::{ExecutionOutcome, QueryExecutionService};
pub use knowledge::parse_seed_yaml;
pub use substitution::{bind, find_placeholders};

#[cfg(feature = "test-support")]
pub use injection::PatternInjectionDetector;
