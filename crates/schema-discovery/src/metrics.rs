//! Pure statistical functions over a raw `JoinAnalysis` (§4.3, §6). Kept free
//! of any adapter or repository dependency so the acceptance thresholds are
//! unit-testable without a database.

use schema_core::ports::JoinAnalysis;
use schema_types::enums::Cardinality;

pub const MATCH_RATE_ACCEPT: f64 = 0.70;
pub const ORPHAN_RATE_ACCEPT: f64 = 0.30;
pub const REVERSE_ORPHAN_DISCARD: f64 = 0.95;
pub const CARDINALITY_TIE_BREAK: f64 = 0.05;

pub const MIN_DISTINCT_COUNT: i64 = 20;
pub const MIN_DISTINCT_RATIO: f64 = 0.10;

fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// `source_matched / source_distinct`.
pub fn match_rate(a: &JoinAnalysis) -> f64 {
    ratio(a.source_matched, a.source_distinct)
}

/// `orphan_count / source_distinct` — unmatched share of the source side.
pub fn orphan_rate(a: &JoinAnalysis) -> f64 {
    ratio(a.orphan_count, a.source_distinct)
}

/// `reverse_orphan_count / target_distinct` — unmatched share of the target
/// side, read in reverse.
pub fn reverse_orphan_rate(a: &JoinAnalysis) -> f64 {
    ratio(a.reverse_orphan_count, a.target_distinct)
}

/// §4.3 acceptance rule: `match_rate >= 0.70` and `orphan_rate <= 0.30`.
pub fn accepts_as_inferred(a: &JoinAnalysis) -> bool {
    match_rate(a) >= MATCH_RATE_ACCEPT && orphan_rate(a) <= ORPHAN_RATE_ACCEPT
}

/// §4.3 bidirectional-validation guard: discard before any LLM call when the
/// reverse side has almost no back-coverage.
pub fn should_discard_as_false_positive(a: &JoinAnalysis) -> bool {
    reverse_orphan_rate(a) > REVERSE_ORPHAN_DISCARD
}

/// Cardinality tie-break (§4.3): low reverse-orphan rate on one side implies
/// that side is the "one" in a many-to-one relationship.
pub fn resolve_cardinality(forward: &JoinAnalysis, reverse_accepted: bool) -> Cardinality {
    let forward_tight = reverse_orphan_rate(forward) < CARDINALITY_TIE_BREAK;
    match (forward_tight, reverse_accepted) {
        (true, true) => Cardinality::OneToOne,
        (true, false) => Cardinality::ManyToOne,
        (false, true) => Cardinality::OneToMany,
        (false, false) => Cardinality::ManyToMany,
    }
}

/// §4.3 Stage B gating, minus the exclusion-list check (kept in
/// `exclusion::is_pk_match_excluded` since it needs no statistics).
pub fn meets_pk_match_thresholds(
    is_joinable: Option<bool>,
    distinct_count: Option<i64>,
    row_count: Option<i64>,
) -> bool {
    let Some(true) = is_joinable else {
        return false;
    };
    let Some(distinct) = distinct_count else {
        return false;
    };
    if distinct < MIN_DISTINCT_COUNT {
        return false;
    }
    match row_count {
        Some(rows) if rows > 0 => ratio(distinct, rows) >= MIN_DISTINCT_RATIO,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(source_matched: i64, source_distinct: i64, orphan: i64, target_distinct: i64, reverse_orphan: i64) -> JoinAnalysis {
        JoinAnalysis {
            join_count: source_matched,
            source_matched,
            source_distinct,
            target_matched: source_matched,
            target_distinct,
            orphan_count: orphan,
            reverse_orphan_count: reverse_orphan,
        }
    }

    #[test]
    fn accepts_high_match_low_orphan() {
        let a = analysis(700, 1000, 200, 1000, 10);
        assert!((match_rate(&a) - 0.70).abs() < 1e-9);
        assert!((orphan_rate(&a) - 0.20).abs() < 1e-9);
        assert!(accepts_as_inferred(&a));
    }

    #[test]
    fn rejects_below_match_rate_floor() {
        let a = analysis(500, 1000, 400, 1000, 10);
        assert!(!accepts_as_inferred(&a));
    }

    #[test]
    fn rejects_above_orphan_ceiling() {
        let a = analysis(900, 1000, 400, 1000, 10);
        assert!(!accepts_as_inferred(&a));
    }

    #[test]
    fn discards_when_reverse_side_has_no_back_coverage() {
        let a = analysis(50, 50, 0, 100_000, 99_990);
        assert!(should_discard_as_false_positive(&a));
    }

    #[test]
    fn cardinality_tie_break_matches_spec_examples() {
        let tight = analysis(900, 1000, 50, 1000, 10);
        assert_eq!(resolve_cardinality(&tight, false), Cardinality::ManyToOne);
        assert_eq!(resolve_cardinality(&tight, true), Cardinality::OneToOne);

        let loose = analysis(900, 1000, 50, 1000, 900);
        assert_eq!(resolve_cardinality(&loose, false), Cardinality::ManyToMany);
        assert_eq!(resolve_cardinality(&loose, true), Cardinality::OneToMany);
    }

    #[test]
    fn pk_match_thresholds_require_joinable_and_enough_distinct_values() {
        assert!(!meets_pk_match_thresholds(None, Some(100), Some(1000)));
        assert!(!meets_pk_match_thresholds(Some(false), Some(100), Some(1000)));
        assert!(!meets_pk_match_thresholds(Some(true), Some(10), Some(1000)));
        assert!(!meets_pk_match_thresholds(Some(true), Some(50), Some(1000)));
        assert!(meets_pk_match_thresholds(Some(true), Some(200), Some(1000)));
        assert!(meets_pk_match_thresholds(Some(true), Some(200), None));
    }
}
