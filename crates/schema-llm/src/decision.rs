//! Confidence-threshold decisioning: turns an `AdjudicationOutput` into
//! mutations applied to already-loaded `RelationshipCandidate`s (§4.4).

use std::collections::HashMap;

use tracing::warn;

use schema_types::enums::{CandidateStatus, InferenceMethod};
use schema_types::ids::RelationshipCandidateId;
use schema_types::ontology::RelationshipCandidate;

use crate::parsing::{AdjudicationAction, AdjudicationOutput, Decision};

/// The confidence level at or above which a `confirm`/`reject` decision is
/// applied outright rather than routed to manual review.
pub const CONFIDENCE_THRESHOLD: f64 = 0.85;

fn upgrade_detection_method(current: InferenceMethod) -> InferenceMethod {
    match current {
        InferenceMethod::ValueOverlap | InferenceMethod::NameInference => InferenceMethod::Hybrid,
        InferenceMethod::Llm => InferenceMethod::Llm,
        other => other,
    }
}

/// Applies one decision's outcome to the candidate it targets.
fn apply_decision(candidate: &mut RelationshipCandidate, decision: &Decision) {
    let (status, is_required) = match (decision.action, decision.confidence >= CONFIDENCE_THRESHOLD) {
        (AdjudicationAction::Confirm, true) => (CandidateStatus::Accepted, false),
        (AdjudicationAction::Confirm, false) => (CandidateStatus::Pending, true),
        (AdjudicationAction::Reject, true) => (CandidateStatus::Rejected, false),
        (AdjudicationAction::Reject, false) => (CandidateStatus::Pending, true),
        (AdjudicationAction::NeedsReview, _) => (CandidateStatus::Pending, true),
    };

    candidate.status = status;
    candidate.is_required = is_required;
    candidate.detection_method = upgrade_detection_method(candidate.detection_method);
    candidate.llm_reasoning = Some(decision.reasoning.clone());
}

/// Applies every decision in `output` to the matching candidate in
/// `candidates`. Unknown `candidate_id` references and unknown `action`
/// values are logged and skipped rather than failing the whole batch (§4.4)
/// — `action` is already constrained to a closed enum by `parse_llm_response`,
/// so only the unknown-id case can occur here in practice.
pub fn apply_decisions(
    candidates: &mut [RelationshipCandidate],
    output: &AdjudicationOutput,
) -> usize {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (idx, c) in candidates.iter().enumerate() {
        by_id.insert(c.id.to_string(), idx);
    }

    let mut applied = 0;
    for decision in &output.decisions {
        match by_id.get(&decision.candidate_id) {
            Some(&idx) => {
                apply_decision(&mut candidates[idx], decision);
                applied += 1;
            }
            None => {
                warn!(candidate_id = %decision.candidate_id, "adjudication referenced unknown candidate_id, skipping");
            }
        }
    }
    applied
}

/// Looks up a candidate's index by its typed id, for callers that already
/// hold the id rather than its string form.
pub fn find_candidate_index(
    candidates: &[RelationshipCandidate],
    id: RelationshipCandidateId,
) -> Option<usize> {
    candidates.iter().position(|c| c.id == id)
}
