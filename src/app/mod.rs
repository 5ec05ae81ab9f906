//! Application orchestration module

pub mod directory;
pub mod execution;
pub mod initialization;

pub use directory::resolve_output_dir;
pub use execution::{run_pipeline, PipelineOptions, PipelineOutcome};
pub use initialization::{configure_logging, load_configuration};
