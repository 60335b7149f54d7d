//! Crawl orchestration module
//!
//! This module contains the orchestrator and its in-process collaborators:
//! - The coordinator state machine (seeding, wave draining, finalization)
//! - The frontier with its process-lifetime seen set
//! - The progress estimator and the performance monitor
//! - The event sink through which progress is observable

mod coordinator;
mod events;
mod frontier;
mod monitor;
mod progress;

pub use coordinator::{Coordinator, CrawlReport};
pub use events::{ChannelSink, CrawlEvent, EventSink, LogSink};
pub use frontier::{Frontier, FrontierEntry};
pub use monitor::{PerformanceMonitor, TaskOutcome};
pub use progress::ProgressEstimator;
