//! Per-task performance accounting
//!
//! Counts task outcomes and keeps an incrementally updated average
//! response time; the summary is logged once at crawl completion.

use std::time::{Duration, Instant};

/// How a dispatched task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failure,
    RateLimited,
}

/// Counters for one crawl run
#[derive(Debug)]
pub struct PerformanceMonitor {
    started: Instant,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    rate_limit_hits: u64,
    average_response_time_ms: f64,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            rate_limit_hits: 0,
            average_response_time_ms: 0.0,
        }
    }

    /// Records one finished task
    pub fn record(&mut self, latency: Duration, outcome: TaskOutcome) {
        let latency_ms = latency.as_secs_f64() * 1000.0;
        self.average_response_time_ms = (self.average_response_time_ms
            * self.total_requests as f64
            + latency_ms)
            / (self.total_requests + 1) as f64;
        self.total_requests += 1;

        match outcome {
            TaskOutcome::Success => self.successful_requests += 1,
            TaskOutcome::Failure => self.failed_requests += 1,
            TaskOutcome::RateLimited => {
                self.failed_requests += 1;
                self.rate_limit_hits += 1;
            }
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn successful_requests(&self) -> u64 {
        self.successful_requests
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests
    }

    pub fn rate_limit_hits(&self) -> u64 {
        self.rate_limit_hits
    }

    pub fn average_response_time_ms(&self) -> f64 {
        self.average_response_time_ms
    }

    /// Logs the run summary
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl performance: {} requests ({} ok, {} failed, {} rate limited), \
             avg response {:.1} ms, elapsed {:.1} s",
            self.total_requests,
            self.successful_requests,
            self.failed_requests,
            self.rate_limit_hits,
            self.average_response_time_ms,
            self.started.elapsed().as_secs_f64()
        );
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record(Duration::from_millis(100), TaskOutcome::Success);
        monitor.record(Duration::from_millis(200), TaskOutcome::Failure);
        monitor.record(Duration::from_millis(300), TaskOutcome::RateLimited);

        assert_eq!(monitor.total_requests(), 3);
        assert_eq!(monitor.successful_requests(), 1);
        assert_eq!(monitor.failed_requests(), 2);
        assert_eq!(monitor.rate_limit_hits(), 1);
    }

    #[test]
    fn test_incremental_average() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record(Duration::from_millis(100), TaskOutcome::Success);
        monitor.record(Duration::from_millis(300), TaskOutcome::Success);

        let average = monitor.average_response_time_ms();
        assert!((average - 200.0).abs() < 1.0, "got {}", average);
    }

    #[test]
    fn test_fresh_monitor_is_empty() {
        let monitor = PerformanceMonitor::new();
        assert_eq!(monitor.total_requests(), 0);
        assert_eq!(monitor.average_response_time_ms(), 0.0);
    }
}
