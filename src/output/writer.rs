//! Per-bundle statistics documents
//!
//! Each finalized bundle is persisted as `<bundleId>.out.json`:
//!
//! ```json
//! {
//!   "output": "3-vendor.css",
//!   "files": [
//!     { "path": "vendor/a.css", "bytes": 200 }
//!   ],
//!   "total": 200
//! }
//! ```
//!
//! Field order follows the struct declaration order and the document is
//! pretty-printed with a trailing newline, so identical snapshots always
//! produce byte-identical files.

use crate::stats::{CollectorSnapshot, StatsError, StatsResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One source file entry in a bundle document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub bytes: u64,
}

/// Serialized form of a finalized bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDocument {
    pub output: String,
    pub files: Vec<FileEntry>,
    pub total: u64,
}

impl From<&CollectorSnapshot> for BundleDocument {
    fn from(snapshot: &CollectorSnapshot) -> Self {
        Self {
            output: snapshot.bundle_id().to_string(),
            files: snapshot
                .records()
                .iter()
                .map(|record| FileEntry {
                    path: record.source_path().to_string(),
                    bytes: record.size_bytes(),
                })
                .collect(),
            total: snapshot.total_bytes(),
        }
    }
}

impl BundleDocument {
    /// Canonical text of the document
    pub fn to_canonical_json(&self) -> StatsResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Writes bundle documents into the output directory
#[derive(Debug, Clone)]
pub struct StatsWriter {
    output_dir: PathBuf,
}

impl StatsWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the document for `snapshot` is written to
    pub fn document_path(&self, snapshot: &CollectorSnapshot) -> PathBuf {
        self.output_dir.join(snapshot.bundle_id().document_name())
    }

    /// Write one snapshot, overwriting any stale document of the same name
    pub fn write(&self, snapshot: &CollectorSnapshot) -> StatsResult<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|e| StatsError::io(&self.output_dir, e))?;

        let path = self.document_path(snapshot);
        let json = BundleDocument::from(snapshot).to_canonical_json()?;
        fs::write(&path, json).map_err(|e| StatsError::io(&path, e))?;

        debug!("Wrote {} ({} bytes total)", path.display(), snapshot.total_bytes());
        Ok(path)
    }

    /// Write every snapshot in order, stopping at the first failure
    pub fn write_all(&self, snapshots: &[CollectorSnapshot]) -> StatsResult<Vec<PathBuf>> {
        let paths = snapshots
            .iter()
            .map(|snapshot| self.write(snapshot))
            .collect::<StatsResult<Vec<_>>>()?;
        info!("Wrote {} bundle document(s) to {}", paths.len(), self.output_dir.display());
        Ok(paths)
    }
}

/// Read a persisted bundle document
pub fn read_document(path: &Path) -> StatsResult<BundleDocument> {
    let content = fs::read_to_string(path).map_err(|e| StatsError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
