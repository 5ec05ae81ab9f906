//! Aggregation Registry
//!
//! Maps bundle ids to their collectors for the duration of one build run.
//! The registry is constructed explicitly by the host and shared by
//! reference with every observer; it is `Sync`, so concurrent pipelines can
//! notify it directly.
//!
//! Locking is two-level: the bundle map sits behind a read/write lock that is
//! held only long enough to look up or insert a collector, and each collector
//! has its own mutex. Observations for one bundle are therefore applied
//! atomically with respect to each other, while different bundles never
//! contend beyond the map lookup.

use crate::stats::{BundleId, CollectorSnapshot, FileStatCollector, RecordKind, StatsError, StatsResult};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;


/// Receiver of concatenation events
pub trait NotificationSink {
    /// Make sure a bundle is tracked, even if it never receives a record
    fn track_bundle(&self, bundle_id: &str) -> StatsResult<()>;

    /// Report one source file contribution to a bundle
    fn notify(&self, bundle_id: &str, source_path: &str, size_bytes: u64, kind: RecordKind) -> StatsResult<()>;
}

/// Shared handle to one bundle's collector
#[derive(Debug, Clone)]
pub struct CollectorHandle {
    bundle_id: BundleId,
    inner: Arc<Mutex<FileStatCollector>>,
}

impl CollectorHandle {
    pub fn bundle_id(&self) -> &BundleId {
        &self.bundle_id
    }

    /// Record an observation; fails once the bundle has been finalized
    pub fn record(&self, source_path: &str, size_bytes: u64, kind: RecordKind) -> StatsResult<()> {
        self.inner.lock().record(source_path, size_bytes, kind)
    }

    /// Finalize this bundle ahead of [`Registry::finalize_all`]
    pub fn finalize(&self) -> StatsResult<CollectorSnapshot> {
        self.inner.lock().finalize()
    }

    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().total_bytes()
    }

    pub fn file_count(&self) -> usize {
        self.inner.lock().file_count()
    }

    pub fn is_finalized(&self) -> bool {
        self.inner.lock().is_finalized()
    }
}

/// Result of finalizing every tracked bundle
#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    /// Snapshots in ascending bundle id order
    pub snapshots: Vec<CollectorSnapshot>,
    /// Bundles that could not be finalized, with the reason
    pub failures: Vec<(BundleId, StatsError)>,
}

impl FinalizeOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Ids of the bundles that failed to finalize
    pub fn failed_bundles(&self) -> Vec<String> {
        self.failures.iter().map(|(id, _)| id.to_string()).collect()
    }

    /// `PartialFinalization` error describing the failures, if any
    pub fn partial_error(&self) -> Option<StatsError> {
        if self.is_complete() {
            None
        } else {
            Some(StatsError::PartialFinalization {
                failed: self.failed_bundles(),
            })
        }
    }
}

/// Table of live collectors for a single build run
#[derive(Debug, Default)]
pub struct Registry {
    collectors: RwLock<BTreeMap<BundleId, Arc<Mutex<FileStatCollector>>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the collector for `bundle_id`, creating it on first use.
    ///
    /// Fails if the id is not usable as a file name, or if the bundle has
    /// already been finalized.
    pub fn track(&self, bundle_id: &str) -> StatsResult<CollectorHandle> {
        let id = BundleId::parse(bundle_id)?;

        let existing = self.collectors.read().get(&id).cloned();
        let inner = match existing {
            Some(inner) => inner,
            None => {
                let mut collectors = self.collectors.write();
                // Another observer may have inserted it between the two locks
                let inner = collectors.entry(id.clone()).or_insert_with(|| {
                    debug!("Tracking new bundle: {}", id);
                    Arc::new(Mutex::new(FileStatCollector::new(id.clone())))
                });
                Arc::clone(inner)
            }
        };

        if inner.lock().is_finalized() {
            return Err(StatsError::already_finalized(id.as_str()));
        }

        Ok(CollectorHandle { bundle_id: id, inner })
    }

    /// Number of tracked bundles
    pub fn len(&self) -> usize {
        self.collectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.read().is_empty()
    }

    /// Tracked bundle ids in lexical order
    pub fn bundle_ids(&self) -> Vec<BundleId> {
        self.collectors.read().keys().cloned().collect()
    }

    /// Finalize every tracked bundle in ascending bundle id order.
    ///
    /// A bundle that cannot be finalized is reported in the outcome; the
    /// remaining bundles are still finalized.
    pub fn finalize_all(&self) -> FinalizeOutcome {
        let collectors: Vec<(BundleId, Arc<Mutex<FileStatCollector>>)> = self
            .collectors
            .read()
            .iter()
            .map(|(id, inner)| (id.clone(), Arc::clone(inner)))
            .collect();

        let mut outcome = FinalizeOutcome::default();
        for (id, inner) in collectors {
            match inner.lock().finalize() {
                Ok(snapshot) => outcome.snapshots.push(snapshot),
                Err(e) => {
                    warn!("Could not finalize bundle {}: {}", id, e);
                    outcome.failures.push((id, e));
                }
            }
        }

        info!(
            "Finalized {} bundle(s), {} failure(s)",
            outcome.snapshots.len(),
            outcome.failures.len()
        );
        outcome
    }
}

impl NotificationSink for Registry {
    fn track_bundle(&self, bundle_id: &str) -> StatsResult<()> {
        self.track(bundle_id).map(|_| ())
    }

    fn notify(&self, bundle_id: &str, source_path: &str, size_bytes: u64, kind: RecordKind) -> StatsResult<()> {
        self.track(bundle_id)?.record(source_path, size_bytes, kind)
    }
}
