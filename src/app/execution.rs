//! Aggregation pipeline execution

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::thread;
use crate::input;
use crate::output::{ReportBuilder, StatsWriter, Summary};
use crate::queue::NotificationQueue;
use crate::registry::Registry;

/// Settings for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub title: Option<String>,
    /// Upper bound on replay threads; 0 picks one per available core
    pub workers: usize,
}

/// What a pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report_path: PathBuf,
    pub documents: Vec<PathBuf>,
    pub summary: Summary,
    /// Inputs ignored because they could not be read as stats documents
    pub skipped_inputs: Vec<PathBuf>,
    /// Bundles left out of the report because they failed to finalize
    pub incomplete: Vec<String>,
}

/// Replay every input in `output_dir`, then write the bundle documents and the report
pub fn run_pipeline(output_dir: &Path, options: &PipelineOptions) -> Result<PipelineOutcome> {
    let registry = Registry::new();

    let inputs = input::discover_inputs(output_dir)
        .with_context(|| format!("Failed to read stats directory: {}", output_dir.display()))?;
    info!("Replaying {} input document(s) from {}", inputs.len(), output_dir.display());

    let skipped_inputs = replay_inputs(&inputs, &registry, options.workers)?;

    let outcome = registry.finalize_all();
    if let Some(e) = outcome.partial_error() {
        warn!("{}", e);
    }
    let incomplete = outcome.failed_bundles();

    let writer = StatsWriter::new(output_dir);
    let documents = writer.write_all(&outcome.snapshots)
        .context("Failed to write bundle statistics")?;

    let mut builder = ReportBuilder::new(output_dir);
    if let Some(title) = &options.title {
        builder = builder.with_title(title.as_str());
    }
    let report_path = builder.build_with_incomplete(&outcome.snapshots, &incomplete)
        .context("Failed to build summary report")?;

    Ok(PipelineOutcome {
        report_path,
        documents,
        summary: Summary::from_snapshots(&outcome.snapshots),
        skipped_inputs,
        incomplete,
    })
}

fn worker_count(requested: usize, inputs: usize) -> usize {
    let available = if requested == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        requested
    };
    available.min(inputs).max(1)
}

/// Replay inputs on worker threads feeding a single queue consumer.
///
/// Each input is replayed by exactly one worker, so per-bundle ordering is
/// the document order. Returns the inputs that were skipped as malformed.
fn replay_inputs(inputs: &[PathBuf], registry: &Registry, workers: usize) -> Result<Vec<PathBuf>> {
    let workers = worker_count(workers, inputs.len());
    let chunk_size = inputs.len().div_ceil(workers).max(1);
    debug!("Replaying with {} worker(s)", workers);

    let (sender, consumer) = NotificationQueue::new();

    thread::scope(|scope| -> Result<Vec<PathBuf>> {
        let drain = scope.spawn(|| consumer.drain_into(registry));

        let producers: Vec<_> = inputs
            .chunks(chunk_size)
            .map(|chunk| {
                let sender = sender.clone();
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| (path, input::replay(path, &sender)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        drop(sender);

        let mut skipped = Vec::new();
        let mut fatal = None;
        for producer in producers {
            let results = producer.join().map_err(|_| anyhow!("Input replay thread panicked"))?;
            for (path, result) in results {
                match result {
                    Ok(replayed) => debug!(
                        "{}: {} source(s) recorded for {}",
                        path.display(),
                        replayed.recorded,
                        replayed.bundle_id
                    ),
                    Err(e) if !e.is_fatal() => {
                        warn!("Skipping input: {}", e);
                        skipped.push(path.clone());
                    }
                    Err(e) => {
                        fatal.get_or_insert(e);
                    }
                }
            }
        }

        // A rejected notification closes the queue, so report the consumer's error first
        let drained = drain.join().map_err(|_| anyhow!("Notification consumer panicked"))??;
        if let Some(e) = fatal {
            return Err(anyhow::Error::new(e).context("Failed to replay build inputs"));
        }

        debug!("Applied {} track and {} record notification(s)", drained.tracked, drained.recorded);
        Ok(skipped)
    })
}
