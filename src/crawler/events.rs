//! Crawl progress and completion notifications
//!
//! Events are fire-and-forget: the orchestrator emits them and never waits
//! for acknowledgment. Progress is observable only through a sink, not by
//! polling the orchestrator.

use std::collections::BTreeMap;
use std::sync::{mpsc, Mutex};

/// Notification emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// Recomputed after each wave
    Progress {
        crawling_id: String,
        percentage: f64,
        current_url: Option<String>,
    },
    /// Emitted once, at the end of finalization
    Completed {
        crawling_id: String,
        average_scores: BTreeMap<String, f64>,
    },
}

/// Receiver of crawl events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Sink that logs events through tracing; the CLI default
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::Progress {
                crawling_id,
                percentage,
                current_url,
            } => {
                tracing::info!(
                    "[{}] progress {:.1}%{}",
                    crawling_id,
                    percentage,
                    current_url
                        .map(|url| format!(" ({})", url))
                        .unwrap_or_default()
                );
            }
            CrawlEvent::Completed {
                crawling_id,
                average_scores,
            } => {
                tracing::info!(
                    "[{}] completed with {} averaged score(s)",
                    crawling_id,
                    average_scores.len()
                );
            }
        }
    }
}

/// Sink that forwards events over a channel, used by tests and embedders
#[derive(Debug)]
pub struct ChannelSink {
    tx: Mutex<mpsc::Sender<CrawlEvent>>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::Receiver<CrawlEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: CrawlEvent) {
        // Fire-and-forget: a dropped receiver must not disturb the crawl
        let _ = self.tx.lock().unwrap().send(event);
    }
}
