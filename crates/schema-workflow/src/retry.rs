//! Exponential backoff for retryable tasks (§4.2): base 200ms, doubling per
//! attempt, capped at 3 attempts — the same shape the teacher's listener
//! uses for its fixed `ERROR_BACKOFF_MS`, generalized here to back off
//! further on each successive attempt instead of sleeping a flat interval.

use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 200;

/// Backoff duration before attempt number `attempt` (1-indexed): attempt 1
/// has no prior failure so there's nothing to back off from.
pub fn backoff_for_attempt(attempt: u32) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }
    let exponent = attempt - 2;
    Duration::from_millis(BASE_BACKOFF_MS * 2u64.saturating_pow(exponent))
}

pub fn should_retry(attempt: u32, retryable: bool) -> bool {
    retryable && attempt < MAX_ATTEMPTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_has_no_backoff() {
        assert_eq!(backoff_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        assert_eq!(backoff_for_attempt(2), Duration::from_millis(200));
        assert_eq!(backoff_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn retry_capped_at_max_attempts() {
        assert!(should_retry(1, true));
        assert!(should_retry(2, true));
        assert!(!should_retry(3, true));
        assert!(!should_retry(1, false));
    }
}
