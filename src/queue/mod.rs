//! Notification Queue
//!
//! Message-passing adapter for concatenation pipelines that run on their own
//! threads. Producers push [`Notification`]s through cloneable
//! [`NotificationSender`]s; a single consumer drains them into the
//! [`Registry`], so the consumer is the only code that mutates collectors.
//! Messages from one sender arrive in the order they were sent, which keeps
//! the per-bundle ordering of each pipeline intact.
//!
//! ```rust
//! use concat_stats::queue::NotificationQueue;
//! use concat_stats::registry::{NotificationSink, Registry};
//! use concat_stats::stats::RecordKind;
//!
//! let registry = Registry::new();
//! let (sender, consumer) = NotificationQueue::new();
//!
//! std::thread::scope(|scope| {
//!     let drain = scope.spawn(|| consumer.drain_into(&registry));
//!     sender.notify("app.js", "src/main.js", 120, RecordKind::Add).unwrap();
//!     drop(sender);
//!     drain.join().unwrap().unwrap();
//! });
//!
//! assert_eq!(registry.track("app.js").unwrap().total_bytes(), 120);
//! ```

use crate::registry::{NotificationSink, Registry};
use crate::stats::{RecordKind, StatsError, StatsResult};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error};

/// One event emitted by a concatenation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Bundle exists, possibly without any sources
    Track { bundle_id: String },
    /// Source file contributed bytes to a bundle
    Record {
        bundle_id: String,
        source_path: String,
        size_bytes: u64,
        kind: RecordKind,
    },
}

impl Notification {
    pub fn bundle_id(&self) -> &str {
        match self {
            Notification::Track { bundle_id } | Notification::Record { bundle_id, .. } => bundle_id,
        }
    }
}

/// Counters reported by the consumer once the queue is drained
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainStats {
    pub tracked: u64,
    pub recorded: u64,
}

/// Constructor for a sender/consumer pair
pub struct NotificationQueue;

impl NotificationQueue {
    /// Create an unbounded queue
    pub fn new() -> (NotificationSender, NotificationConsumer) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (NotificationSender { sender }, NotificationConsumer { receiver })
    }
}

/// Producer side; clone one per pipeline
#[derive(Debug, Clone)]
pub struct NotificationSender {
    sender: Sender<Notification>,
}

impl NotificationSender {
    pub fn send(&self, notification: Notification) -> StatsResult<()> {
        self.sender.send(notification).map_err(|_| StatsError::QueueClosed)
    }
}

impl NotificationSink for NotificationSender {
    fn track_bundle(&self, bundle_id: &str) -> StatsResult<()> {
        self.send(Notification::Track {
            bundle_id: bundle_id.to_string(),
        })
    }

    fn notify(&self, bundle_id: &str, source_path: &str, size_bytes: u64, kind: RecordKind) -> StatsResult<()> {
        self.send(Notification::Record {
            bundle_id: bundle_id.to_string(),
            source_path: source_path.to_string(),
            size_bytes,
            kind,
        })
    }
}

/// Consumer side; owns all registry mutation while draining
#[derive(Debug)]
pub struct NotificationConsumer {
    receiver: Receiver<Notification>,
}

impl NotificationConsumer {
    /// Apply notifications until every sender has been dropped.
    ///
    /// Stops at the first notification the registry rejects; producers still
    /// sending afterwards get [`StatsError::QueueClosed`].
    pub fn drain_into(self, registry: &Registry) -> StatsResult<DrainStats> {
        let mut stats = DrainStats::default();

        for notification in self.receiver.iter() {
            let applied = match &notification {
                Notification::Track { bundle_id } => registry.track_bundle(bundle_id).map(|_| stats.tracked += 1),
                Notification::Record {
                    bundle_id,
                    source_path,
                    size_bytes,
                    kind,
                } => registry
                    .notify(bundle_id, source_path, *size_bytes, *kind)
                    .map(|_| stats.recorded += 1),
            };

            if let Err(e) = applied {
                error!("Rejected notification for {}: {}", notification.bundle_id(), e);
                return Err(e);
            }
        }

        debug!(
            "Notification queue drained: {} tracked, {} recorded",
            stats.tracked, stats.recorded
        );
        Ok(stats)
    }
}
