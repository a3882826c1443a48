//! Conflict retry policy.
//!
//! An injectable value describing how the write path reacts to optimistic-
//! concurrency conflicts: a bounded attempt count and a linear backoff.
//!
//! # Example
//!
//! ```
//! use doc_store::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_attempts, 3);
//! assert_eq!(policy.delay(2), Duration::from_millis(600));
//! ```

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff before the next attempt: `attempt * base_delay` (linear).
    #[must_use]
    pub fn delay(&self, attempt: usize) -> Duration {
        self.base_delay.saturating_mul(attempt as u32)
    }

    /// Fast policy for tests (minimal delays)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }
}
