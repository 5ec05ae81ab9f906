//! Statistics tracking module
//!
//! Provides the data structures for tracking the byte contribution of source
//! files to concatenated bundles.

pub mod bundle;
pub mod collector;
pub mod error;
pub mod record;

pub use bundle::BundleId;
pub use collector::{CollectorSnapshot, FileStatCollector};
pub use error::{StatsError, StatsResult};
pub use record::{MetricRecord, RecordKind};

/// Format a byte count for display (e.g. `1.5 KB`)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
