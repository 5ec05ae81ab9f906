//! Per-bundle statistics collector
//!
//! Accumulates metric records for one bundle across the lifetime of a build
//! and freezes them into a [`CollectorSnapshot`] once the build completes.

use super::bundle::BundleId;
use super::error::{StatsError, StatsResult};
use super::record::{MetricRecord, RecordKind};
use log::{debug, trace};
use std::collections::HashMap;

/// Mutable statistics for a single tracked bundle
#[derive(Debug, Clone)]
pub struct FileStatCollector {
    bundle_id: BundleId,
    /// Latest record per source path, in first-observation order
    records: Vec<MetricRecord>,
    /// Source path -> index into `records`
    positions: HashMap<String, usize>,
    /// Exact sum of the latest size per path; reported clamped to `u64::MAX`
    total_bytes: u128,
    /// Number of observations applied so far; doubles as the record timestamp
    sequence: u64,
    finalized: bool,
}

impl FileStatCollector {
    /// Create an empty collector for a bundle
    pub fn new(bundle_id: BundleId) -> Self {
        Self {
            bundle_id,
            records: Vec::new(),
            positions: HashMap::new(),
            total_bytes: 0,
            sequence: 0,
            finalized: false,
        }
    }

    pub fn bundle_id(&self) -> &BundleId {
        &self.bundle_id
    }

    /// Apply one observation.
    ///
    /// A later observation for a path that was already seen replaces the
    /// earlier record in place: its size counts once, and the record keeps the
    /// position of the first observation.
    pub fn record(&mut self, source_path: &str, size_bytes: u64, kind: RecordKind) -> StatsResult<()> {
        if self.finalized {
            return Err(StatsError::already_finalized(self.bundle_id.as_str()));
        }

        self.sequence += 1;
        let record = MetricRecord::new(source_path, size_bytes, self.sequence, kind);

        match self.positions.get(source_path) {
            Some(&index) => {
                let previous = std::mem::replace(&mut self.records[index], record);
                if kind == RecordKind::Add {
                    debug!(
                        "{}: '{}' added again, replacing {} bytes with {}",
                        self.bundle_id,
                        source_path,
                        previous.size_bytes(),
                        size_bytes
                    );
                }
                self.total_bytes = self.total_bytes - u128::from(previous.size_bytes()) + u128::from(size_bytes);
            }
            None => {
                self.positions.insert(source_path.to_string(), self.records.len());
                self.records.push(record);
                self.total_bytes += u128::from(size_bytes);
            }
        }

        trace!(
            "{}: {} '{}' ({} bytes), total now {}",
            self.bundle_id,
            kind,
            source_path,
            size_bytes,
            self.total_bytes()
        );
        Ok(())
    }

    /// Freeze the collector. A second call fails.
    pub fn finalize(&mut self) -> StatsResult<CollectorSnapshot> {
        if self.finalized {
            return Err(StatsError::already_finalized(self.bundle_id.as_str()));
        }
        self.finalized = true;
        debug!(
            "Finalized {} with {} file(s), {} bytes",
            self.bundle_id,
            self.records.len(),
            self.total_bytes()
        );

        Ok(CollectorSnapshot {
            bundle_id: self.bundle_id.clone(),
            records: self.records.clone(),
            total_bytes: self.total_bytes(),
        })
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn total_bytes(&self) -> u64 {
        u64::try_from(self.total_bytes).unwrap_or(u64::MAX)
    }

    /// Number of distinct source files
    pub fn file_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }
}

/// Read-only view of a finalized collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSnapshot {
    bundle_id: BundleId,
    records: Vec<MetricRecord>,
    total_bytes: u64,
}

impl CollectorSnapshot {
    pub fn bundle_id(&self) -> &BundleId {
        &self.bundle_id
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn file_count(&self) -> usize {
        self.records.len()
    }
}
