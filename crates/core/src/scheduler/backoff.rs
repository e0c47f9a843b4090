//! Listing back-off
//!
//! Exponential delay with equal jitter: attempt `n` waits between half and
//! all of `min(initial * 2^n, max)`.

use std::time::Duration;

use rand::Rng;

const BASE: f64 = 2.0;

/// Delay schedule applied after failed listings.
#[derive(Debug, Clone)]
pub struct ListingBackoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl ListingBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max: max.max(initial), attempt: 0 }
    }

    /// Delay before the next listing, advancing the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.ceiling(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        equal_jitter(delay)
    }

    /// Return to the initial delay after a successful listing.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.attempt
    }

    /// Un-jittered delay for `attempt`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn ceiling(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial.as_millis() as f64 * BASE.powi(exponent);
        let delay_ms = delay_ms.min(self.max.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

fn equal_jitter(delay: Duration) -> Duration {
    let full_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let half_ms = full_ms / 2;
    let jitter_ms = rand::thread_rng().gen_range(0..=full_ms - half_ms);
    Duration::from_millis(half_ms + jitter_ms)
}
