//! Retry policy and per-call retry state
//!
//! Only rate-limited attempts are retried. The wait between attempts grows
//! exponentially from the configured base.

use serde::Serialize;
use std::time::Duration;

/// Default number of attempts per completion call
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default base backoff in milliseconds (doubles each retry)
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 2_000;
/// Maximum backoff duration in milliseconds (30 seconds)
///
/// Prevents infinite sleep from exponential overflow. With base=2000ms:
/// - Attempt 4 would be 16 seconds (under cap)
/// - Attempt 5 would be 32 seconds (capped to 30s)
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Retry configuration for a completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (must be at least 1)
    max_attempts: usize,
    /// Base backoff in milliseconds (doubles each retry)
    base_backoff_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Errors
    /// Returns an error if `max_attempts` is 0 (at least 1 attempt is required)
    pub fn new(max_attempts: usize, base_backoff_ms: u64) -> Result<Self, &'static str> {
        if max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        Ok(Self {
            max_attempts,
            base_backoff_ms,
        })
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn base_backoff_ms(&self) -> u64 {
        self.base_backoff_ms
    }

    /// Wait inserted after the given failed attempt
    pub fn backoff(&self, attempt: usize) -> Duration {
        Duration::from_millis(calculate_backoff(self, attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
        }
    }
}

/// Calculate exponential backoff with overflow protection
///
/// Returns the backoff in milliseconds after the given attempt (1-indexed).
/// The formula is: `base * 2^(attempt-1)`, capped at [`MAX_BACKOFF_MS`].
///
/// With base=2000ms:
/// - Attempt 1: 2,000ms
/// - Attempt 2: 4,000ms
/// - Attempt 3: 8,000ms
/// - Attempt 5+: 30,000ms (capped)
pub fn calculate_backoff(policy: &RetryPolicy, attempt: usize) -> u64 {
    let exponent = u32::try_from(attempt)
        .unwrap_or(u32::MAX)
        .saturating_sub(1);
    policy
        .base_backoff_ms
        .saturating_mul(2_u64.saturating_pow(exponent))
        .min(MAX_BACKOFF_MS)
}

/// Where a completion call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Sending,
    Retrying,
    Success,
    Failed,
    /// Failed, and a fallback reply has been produced
    FailedHandled,
}

impl PipelineState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Sending)
                | (Idle, Failed)
                | (Sending, Success)
                | (Sending, Retrying)
                | (Sending, Failed)
                | (Retrying, Sending)
                | (Failed, FailedHandled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Success | PipelineState::Failed | PipelineState::FailedHandled
        )
    }
}

/// Transient state of one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempt: usize,
    elapsed_backoff: Duration,
    state: PipelineState,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            attempt: 0,
            elapsed_backoff: Duration::ZERO,
            state: PipelineState::Idle,
        }
    }

    /// Number of attempts started so far
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Total time spent waiting between attempts
    pub fn elapsed_backoff(&self) -> Duration {
        self.elapsed_backoff
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Start the next attempt and return its 1-indexed number
    pub fn begin_attempt(&mut self) -> usize {
        self.transition(PipelineState::Sending);
        self.attempt += 1;
        self.attempt
    }

    /// Record a backoff wait before the next attempt
    pub fn record_backoff(&mut self, backoff: Duration) {
        self.transition(PipelineState::Retrying);
        self.elapsed_backoff += backoff;
    }

    pub fn succeed(&mut self) {
        self.transition(PipelineState::Success);
    }

    pub fn fail(&mut self) {
        self.transition(PipelineState::Failed);
    }

    /// Mark a failed call as answered by the fallback responder
    pub fn mark_handled(&mut self) {
        self.transition(PipelineState::FailedHandled);
    }

    fn transition(&mut self, next: PipelineState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                from = ?self.state,
                to = ?next,
                attempt = self.attempt,
                "Unexpected completion state transition"
            );
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.base_backoff_ms(), DEFAULT_BASE_BACKOFF_MS);
    }

    #[test]
    fn test_default_equivalent_to_new() {
        let from_new =
            RetryPolicy::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_BACKOFF_MS).expect("valid");
        assert_eq!(RetryPolicy::default(), from_new);
    }

    #[test]
    fn test_retry_policy_rejects_zero_attempts() {
        let result = RetryPolicy::new(0, 100);
        assert!(result.is_err(), "should reject zero attempts");
        assert!(result.unwrap_err().contains("at least 1"));
    }

    // -------------------------------------------------------------------------
    // Backoff Calculation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_calculate_backoff_doubles_from_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(calculate_backoff(&policy, 1), 2_000);
        assert_eq!(calculate_backoff(&policy, 2), 4_000);
        assert_eq!(calculate_backoff(&policy, 3), 8_000);
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_calculate_backoff_capped_at_maximum() {
        let policy = RetryPolicy::new(100, 2_000).expect("valid");
        assert_eq!(calculate_backoff(&policy, 5), MAX_BACKOFF_MS);
        assert_eq!(calculate_backoff(&policy, 64), MAX_BACKOFF_MS);
        assert_eq!(calculate_backoff(&policy, usize::MAX), MAX_BACKOFF_MS);
    }

    #[test]
    fn test_calculate_backoff_attempt_zero_treated_as_one() {
        let policy = RetryPolicy::new(3, 100).expect("valid");
        assert_eq!(calculate_backoff(&policy, 0), 100);
    }

    // -------------------------------------------------------------------------
    // State Machine Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_legal_transitions() {
        use PipelineState::*;
        assert!(Idle.can_transition_to(Sending));
        assert!(Sending.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Sending));
        assert!(Sending.can_transition_to(Success));
        assert!(Sending.can_transition_to(Failed));
        assert!(Failed.can_transition_to(FailedHandled));
    }

    #[test]
    fn test_terminal_states_do_not_resume() {
        use PipelineState::*;
        assert!(!Success.can_transition_to(Sending));
        assert!(!FailedHandled.can_transition_to(Sending));
        assert!(!Retrying.can_transition_to(Success));
        assert!(Success.is_terminal());
        assert!(!Retrying.is_terminal());
    }

    #[test]
    fn test_retry_state_tracks_attempts_and_backoff() {
        let mut state = RetryState::new();
        assert_eq!(state.state(), PipelineState::Idle);

        assert_eq!(state.begin_attempt(), 1);
        state.record_backoff(Duration::from_secs(2));
        assert_eq!(state.state(), PipelineState::Retrying);
        assert_eq!(state.begin_attempt(), 2);
        state.record_backoff(Duration::from_secs(4));
        assert_eq!(state.begin_attempt(), 3);
        state.fail();
        state.mark_handled();

        assert_eq!(state.attempt(), 3);
        assert_eq!(state.elapsed_backoff(), Duration::from_secs(6));
        assert_eq!(state.state(), PipelineState::FailedHandled);
    }
}
