//! Bundle identifiers

use super::error::{StatsError, StatsResult};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Characters that cannot appear in a bundle id because it becomes a file name
fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[/\\:*?<>|\x00-\x1f\x7f]").expect("valid bundle id pattern"))
}

/// Validated identifier of a tracked bundle, derived from its output file name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    /// Validate a raw identifier
    pub fn parse(raw: &str) -> StatsResult<Self> {
        if raw.trim().is_empty() {
            return Err(StatsError::invalid_bundle_id(raw, "must not be empty"));
        }
        if raw == "." || raw == ".." {
            return Err(StatsError::invalid_bundle_id(raw, "must not be a relative directory"));
        }
        if let Some(found) = unsafe_chars().find(raw) {
            return Err(StatsError::invalid_bundle_id(
                raw,
                format!("contains path-unsafe character {:?}", found.as_str()),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the persisted statistics document for this bundle
    pub fn document_name(&self) -> String {
        format!("{}.out.json", self.0)
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BundleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BundleId {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
