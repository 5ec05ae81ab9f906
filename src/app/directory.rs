//! Stats directory resolution

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home_dir) => home_dir.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve the stats directory to an absolute path, creating it if absent
pub fn resolve_output_dir(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path);

    if expanded.exists() && !expanded.is_dir() {
        anyhow::bail!("Not a directory: {}", expanded.display());
    }

    fs::create_dir_all(&expanded)
        .with_context(|| format!("Failed to create stats directory: {}", expanded.display()))?;

    let resolved = expanded.canonicalize()
        .with_context(|| format!("Failed to resolve canonical path for: {}", expanded.display()))?;
    debug!("Using stats directory: {}", resolved.display());
    Ok(resolved)
}
