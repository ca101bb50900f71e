use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::ConfigError;

/// Half-open range `[min, max)` of whole seconds to wait between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: u64,
    max: u64,
}

impl DelayRange {
    /// Requires `0 < min < max`.
    pub fn new(min: i64, max: i64) -> Result<Self, ConfigError> {
        if min >= max || min <= 0 || max <= 0 {
            return Err(ConfigError::InvalidDelay { min, max });
        }
        Ok(Self {
            min: min as u64,
            max: max as u64,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.min..self.max)
    }
}

/// Where deliberate pauses go. Production sleeps; tests record.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
