//! # Jitter for retry delays.
//!
//! Scales a computed delay by a uniformly random factor in `[0.5, 1.0)` so that
//! callers failing together do not retry in lockstep. The lower half of the delay
//! is always preserved, which keeps the expected delay at ~75% of the raw value.

use rand::Rng;

/// Lower bound (inclusive) of the jitter factor.
pub(crate) const MIN_FACTOR: f64 = 0.5;
/// Upper bound (exclusive) of the jitter factor.
pub(crate) const MAX_FACTOR: f64 = 1.0;

/// Draws a jitter factor from `[0.5, 1.0)`.
pub(crate) fn factor() -> f64 {
    rand::rng().random_range(MIN_FACTOR..MAX_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_stays_in_range() {
        for _ in 0..1000 {
            let f = factor();
            assert!((MIN_FACTOR..MAX_FACTOR).contains(&f), "factor {f} out of range");
        }
    }
}
