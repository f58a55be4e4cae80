//! Retry pacing for failed deliveries.

use rand::Rng;
use std::time::Duration;

/// Capped exponential backoff with proportional jitter.
///
/// `delay(n) = min(base * 2^(n-1), max) * (1 - jitter * r)` with `r` uniform
/// in `[0, 1)` and `n` the number of consecutive failures. Jitter only ever
/// shortens a delay, so the cap holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub base: Duration,
    /// Upper bound on any delay.
    pub max: Duration,
    /// Fraction of the delay that may be shaved off at random, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
            jitter: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the next attempt, without jitter.
    ///
    /// Zero failures means no delay.
    pub fn ceiling(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let shift = failures.saturating_sub(1);
        let multiplier = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
        self.base.saturating_mul(multiplier).min(self.max)
    }

    /// Delay before the next attempt, with jitter drawn from `rng`.
    pub fn delay<R: Rng>(&self, failures: u32, rng: &mut R) -> Duration {
        let ceiling = self.ceiling(failures);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter.is_nan() || jitter == 0.0 || ceiling.is_zero() {
            return ceiling;
        }
        let shave: f64 = rng.random::<f64>() * jitter;
        ceiling.mul_f64(1.0 - shave)
    }
}
