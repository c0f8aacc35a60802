//! LLM adjudication pipeline (§4.4): prompt rendering, strict-JSON response
//! parsing, confidence-threshold decisioning, and the orchestrator that
//! ties them together with retry-on-transport-failure.

pub mod adjudication;
pub mod decision;
pub mod parsing;
pub mod prompt;

pub use adjudication::{AdjudicationService, AdjudicationSummary};
pub use decision::{apply_decisions, CONFIDENCE_THRESHOLD};
pub use parsing::{parse_llm_response, AdjudicationAction, AdjudicationOutput, Decision, NewRelationship};
pub use prompt::{render_prompt, TableContext};
