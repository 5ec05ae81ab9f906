//! Metric records
//!
//! A metric record is one observation that a source file contributed (or
//! changed its contribution) to a bundle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of observation reported by the concatenation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// First contribution of a source file
    Add,
    /// Source file was re-concatenated with a new size
    Update,
}

impl Default for RecordKind {
    fn default() -> Self {
        RecordKind::Add
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Add => write!(f, "add"),
            RecordKind::Update => write!(f, "update"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(RecordKind::Add),
            "update" => Ok(RecordKind::Update),
            _ => Err(format!("Invalid record kind: {}. Valid options: add, update", s)),
        }
    }
}

/// Immutable measurement of one source file's contribution to one bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRecord {
    source_path: String,
    size_bytes: u64,
    timestamp: u64,
    kind: RecordKind,
}

impl MetricRecord {
    pub fn new(source_path: impl Into<String>, size_bytes: u64, timestamp: u64, kind: RecordKind) -> Self {
        Self {
            source_path: source_path.into(),
            size_bytes,
            timestamp,
            kind,
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Position of this observation in the collector's observation sequence
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }
}
