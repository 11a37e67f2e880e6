//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Fraction of the exponential delay used as the jitter range.
pub const JITTER_RATIO: f64 = 0.3;

/// Delay to sleep after failed attempt `attempt` (0-indexed).
///
/// Computes `min(initial * multiplier^attempt + jitter, max)` where jitter is
/// drawn uniformly from `[0, 0.3 * exponential)`. The randomization
/// desynchronizes concurrent callers so a shared outage does not produce a
/// synchronized retry storm.
pub fn backoff_delay(attempt: u32, initial: Duration, multiplier: f64, max: Duration) -> Duration {
    let exponential = initial.as_millis() as f64 * multiplier.powi(attempt as i32);

    let jitter_range = exponential * JITTER_RATIO;
    let jitter = if jitter_range > 0.0 {
        rand::thread_rng().gen_range(0.0..jitter_range)
    } else {
        0.0
    };

    let delay_ms = (exponential + jitter).min(max.as_millis() as f64);
    Duration::from_millis(delay_ms as u64)
}
