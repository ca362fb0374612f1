//! Randomized backoff policy
//!
//! Kept separate from the decision logic so retry behavior is configurable
//! and testable on its own.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive bounds for a randomized delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Shortest delay
    pub min: Duration,
    /// Longest delay
    pub max: Duration,
}

impl BackoffPolicy {
    /// Create a policy; `min` must not exceed `max`
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(Error::Config(format!(
                "backoff min {min:?} exceeds max {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Parse from a `min..max` millisecond range, e.g. `500..2000`
    pub fn parse_millis(s: &str) -> Result<Self> {
        let (min, max) = s
            .split_once("..")
            .ok_or_else(|| Error::Config(format!("expected 'min..max' range, got '{s}'")))?;
        let min: u64 = min
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid range bound '{min}'")))?;
        let max: u64 = max
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid range bound '{max}'")))?;
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    /// Draw a delay from the configured range
    pub fn delay_with<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    /// Draw a delay using the thread-local generator
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay_with(&mut rand::thread_rng())
    }
}
