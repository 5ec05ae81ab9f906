//! Build input replay
//!
//! The concatenation step of the build writes one stats document per bundle
//! into the stats directory, named `<bundleId>.json`:
//!
//! ```json
//! { "outputFile": "dist/assets/vendor.css", "sizes": { "vendor/a.css": 200 } }
//! ```
//!
//! Replaying a document turns it back into the notifications the bundler
//! would have emitted while concatenating.

use crate::registry::NotificationSink;
use crate::stats::{BundleId, RecordKind, StatsError, StatsResult};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const INPUT_EXTENSION: &str = ".json";
const OUTPUT_EXTENSION: &str = ".out.json";

/// Stats document written by the concatenation step
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatStatsDocument {
    /// Declared output file of the bundle
    #[serde(default)]
    pub output_file: Option<String>,
    /// Source path -> contributed bytes, in concatenation order
    #[serde(default)]
    pub sizes: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of replaying one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub bundle_id: String,
    pub recorded: usize,
    pub skipped: usize,
}

/// Bundle id for an input document (`1-test-app.js.json` -> `1-test-app.js`)
pub fn bundle_id_for(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(OUTPUT_EXTENSION) {
        return None;
    }
    name.strip_suffix(INPUT_EXTENSION)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// List input documents in `dir`, sorted by file name
pub fn discover_inputs(dir: &Path) -> StatsResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| StatsError::io(dir, e))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StatsError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && bundle_id_for(&path).is_some() {
            inputs.push(path);
        }
    }
    inputs.sort();

    debug!("Discovered {} input document(s) in {}", inputs.len(), dir.display());
    Ok(inputs)
}

/// Parse one input document
pub fn load_document(path: &Path) -> StatsResult<ConcatStatsDocument> {
    let content = fs::read_to_string(path).map_err(|e| StatsError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StatsError::invalid_input(path, e.to_string()))
}

/// Replay one input document into `sink`.
///
/// The bundle is tracked even when it has no sources. Entries whose size is
/// not a non-negative integer are skipped with a warning.
pub fn replay<S: NotificationSink + ?Sized>(path: &Path, sink: &S) -> StatsResult<ReplaySummary> {
    let bundle_id = bundle_id_for(path)
        .ok_or_else(|| StatsError::invalid_input(path, "not a concat stats document"))?;
    BundleId::parse(&bundle_id).map_err(|e| StatsError::invalid_input(path, e.to_string()))?;
    let document = load_document(path)?;

    sink.track_bundle(&bundle_id)?;

    let mut summary = ReplaySummary {
        bundle_id,
        recorded: 0,
        skipped: 0,
    };
    for (source_path, size) in &document.sizes {
        match size.as_u64() {
            Some(bytes) => {
                sink.notify(&summary.bundle_id, source_path, bytes, RecordKind::Add)?;
                summary.recorded += 1;
            }
            None => {
                warn!(
                    "{}: ignoring '{}' with invalid size {}",
                    path.display(),
                    source_path,
                    size
                );
                summary.skipped += 1;
            }
        }
    }

    debug!(
        "Replayed {} ({} recorded, {} skipped{})",
        summary.bundle_id,
        summary.recorded,
        summary.skipped,
        document
            .output_file
            .as_deref()
            .map(|f| format!(", output {}", f))
            .unwrap_or_default()
    );
    Ok(summary)
}
