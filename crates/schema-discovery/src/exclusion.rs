//! PK-match exclusion list (§4.3 item 4) — a case-folded glob matcher over
//! the lowercased column name. `*` matches any prefix/suffix run.

const PATTERNS: &[&str] = &[
    "num_*", "total_*", "*_count", "*_amount", "*_total", "*_sum", "*_avg", "*_min", "*_max",
    "rating", "*_rating", "score", "*_score", "level", "*_level",
];

fn matches_glob(pattern: &str, name: &str) -> bool {
    match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
        (Some(suffix), _) => name.ends_with(suffix),
        (_, Some(prefix)) => name.starts_with(prefix),
        _ => pattern == name,
    }
}

/// True when `column_name` should never become a PK-match candidate,
/// regardless of how its statistics look (Testable Property 4).
pub fn is_pk_match_excluded(column_name: &str) -> bool {
    let lower = column_name.to_ascii_lowercase();
    PATTERNS.iter().any(|pattern| matches_glob(pattern, &lower))
}
