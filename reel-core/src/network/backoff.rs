//! Reconnect delay policy.
//!
//! This is the only retry policy in the system — every other failure is
//! surfaced, not retried.

use std::time::Duration;

/// First reconnect delay after a drop.
pub const BASE_BACKOFF: Duration = Duration::from_millis(1000);

/// Ceiling the delay never exceeds.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff state: doubles on every failed attempt, capped
/// at a ceiling, reset to the base immediately upon a successful open.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    ceiling: Duration,
    next: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        Self {
            base,
            ceiling,
            next: base,
            attempt: 0,
        }
    }

    /// Failed attempts since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The delay the next failure will incur.
    pub fn delay(&self) -> Duration {
        self.next
    }

    /// Record a failed attempt: returns the delay to sleep now and
    /// doubles the stored delay, capped at the ceiling.
    pub fn advance(&mut self) -> Duration {
        let current = self.next;
        self.next = (current * 2).min(self.ceiling);
        self.attempt += 1;
        current
    }

    /// A connection opened; start over from the base delay.
    pub fn reset(&mut self) {
        self.next = self.base;
        self.attempt = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BASE_BACKOFF, MAX_BACKOFF)
    }
}

// ── Tests ────────────────────────────────────────────────────────
