//! Reference `InjectionDetector` (§4.6, §6). The fingerprinting algorithm
//! is an external collaborator concern by design — this conservative
//! pattern-matcher exists only so the execution pipeline is exercisable
//! without a production detector wired in. Gated behind `test-support`;
//! real deployments bring their own.

use schema_core::ports::InjectionDetector;

const SUSPECT_PATTERNS: &[&str] = &["--", ";--", "/*", "*/", "xp_cmdshell", "' or '1'='1", "union select", "drop table"];

pub struct PatternInjectionDetector;

impl InjectionDetector for PatternInjectionDetector {
    fn scan(&self, value: &str) -> Option<String> {
        let lower = value.to_ascii_lowercase();
        SUSPECT_PATTERNS
            .iter()
            .find(|pattern| lower.contains(*pattern))
            .map(|pattern| format!("pattern:{pattern}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_classic_sql_metacharacter_patterns() {
        let detector = PatternInjectionDetector;
        assert!(detector.scan("1' OR '1'='1").is_some());
        assert!(detector.scan("x; DROP TABLE users;--").is_some());
        assert!(detector.scan("ordinary value").is_none());
    }
}
