//! Size statistics for concatenated build bundles.
//!
//! Concatenation pipelines report each source file they fold into a bundle
//! to a [`registry::Registry`]. Once the build is done every bundle is
//! finalized, written to `<bundleId>.out.json`, and summarized in an
//! `index.html` report.

pub mod app;
pub mod cli;
pub mod config;
pub mod input;
pub mod logging;
pub mod output;
pub mod queue;
pub mod registry;
pub mod stats;
