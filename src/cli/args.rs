use clap::Parser;
use anyhow::Result;
use log::{debug, LevelFilter};
use std::path::PathBuf;

/// Concatenation statistics reporter
#[derive(Parser, Debug)]
#[command(name = "concat-stats")]
#[command(about = "Collects per-file size statistics for concatenated build bundles and renders an HTML summary report")]
#[command(version)]
pub struct Args {
    /// Stats directory: holds the concat stats written by the build and receives the report
    #[arg(value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Report title (overrides report.title from the configuration file)
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Print a per-bundle summary table to stdout
    #[arg(short, long)]
    pub summary: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,

    /// Read settings from FILE instead of searching for a configuration file
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Let values from SECTION override every other configuration section
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,
}

/// Log verbosity and destinations
#[derive(clap::Args, Debug, Clone, Default)]
#[command(next_help_heading = "Logging")]
pub struct LoggingArgs {
    /// Include debug messages
    #[arg(short, long, conflicts_with_all = ["quiet", "debug"])]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Include trace messages
    #[arg(long)]
    pub debug: bool,

    /// Log line format [default: text]
    #[arg(long, value_name = "FORMAT", value_parser = ["text", "json"], ignore_case = true)]
    pub log_format: Option<String>,

    /// Also append log lines to FILE
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Level for the log file; defaults to the console level
    #[arg(
        long,
        value_name = "LEVEL",
        requires = "log_file",
        value_parser = ["error", "warn", "info", "debug", "trace", "off"],
        ignore_case = true
    )]
    pub log_file_level: Option<String>,

    /// Write log lines to the log file only, keeping stderr quiet
    #[arg(long, requires = "log_file")]
    pub log_file_only: bool,
}

impl LoggingArgs {
    /// Console level selected by the verbosity flags, if any
    pub fn console_level(&self) -> Option<LevelFilter> {
        if self.debug {
            Some(LevelFilter::Trace)
        } else if self.verbose {
            Some(LevelFilter::Debug)
        } else if self.quiet {
            Some(LevelFilter::Error)
        } else {
            None
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Checks clap cannot express
pub fn validate_args(args: &Args) -> Result<()> {
    if args.output_dir.as_os_str().is_empty() {
        anyhow::bail!("Stats directory must not be empty");
    }

    if matches!(&args.title, Some(title) if title.trim().is_empty()) {
        anyhow::bail!("--title must not be blank");
    }

    if let Some(log_file) = &args.logging.log_file {
        if log_file.is_dir() {
            anyhow::bail!("Log file is a directory: {}", log_file.display());
        }
    }

    Ok(())
}
