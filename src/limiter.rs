//! Token bucket rate limiter gating outbound fetches
//!
//! The bucket is refilled lazily from wall-clock deltas: there is no
//! background timer, so refill granularity is bounded by how often callers
//! attempt an acquisition. A caller that finds no token available fails
//! immediately instead of waiting; the fetch path treats that as a
//! retryable-but-not-retried condition for the current task.

use crate::config::RateLimitConfig;
use crate::CrawlError;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Single-process token bucket shared by every fetch routed through it
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    refill_rate_per_sec: f64,
    enabled: bool,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Creates a full bucket from the given configuration
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            capacity: config.bucket_capacity,
            refill_rate_per_sec: config.refill_rate_per_sec,
            enabled: config.enabled,
            state: Mutex::new(BucketState {
                tokens: config.bucket_capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes one token, or fails fast with [`CrawlError::RateLimitExceeded`]
    ///
    /// Refill happens on demand before the availability check, so the
    /// limiter holds no state besides the token count and the last refill
    /// timestamp.
    pub fn acquire(&self) -> crate::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut state = self.state.lock().unwrap();
        self.refill(&mut state);

        if state.tokens > 0 {
            state.tokens -= 1;
            tracing::debug!("Token acquired, {} remaining", state.tokens);
            Ok(())
        } else {
            tracing::warn!("Rate limit exceeded, no tokens available");
            Err(CrawlError::RateLimitExceeded)
        }
    }

    /// Returns the number of tokens currently available
    pub fn available(&self) -> u32 {
        let mut state = self.state.lock().unwrap();
        self.refill(&mut state);
        state.tokens
    }

    /// Adds whole elapsed tokens, capped at capacity
    ///
    /// `last_refill` only advances when at least one whole token accrued,
    /// so fractional elapsed time keeps accumulating between calls.
    fn refill(&self, state: &mut BucketState) {
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        let tokens_to_add = (elapsed * self.refill_rate_per_sec).floor() as u32;

        if tokens_to_add > 0 {
            state.tokens = state.tokens.saturating_add(tokens_to_add).min(self.capacity);
            state.last_refill = Instant::now();
            tracing::debug!(
                "Refilled {} tokens, {} available",
                tokens_to_add,
                state.tokens
            );
        }
    }

    #[cfg(test)]
    fn backdate_last_refill(&self, by: std::time::Duration) {
        let mut state = self.state.lock().unwrap();
        state.last_refill = Instant::now() - by;
    }
}
