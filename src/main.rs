use anyhow::Result;
use colored::Colorize;
use concat_stats::{app, cli, logging, output};
use log::{error, info};
use std::process;

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let report_config = config_manager.get_report_config()?;
    let options = app::PipelineOptions {
        title: args.title.clone().or(report_config.title),
        workers: 0,
    };

    let output_dir = app::resolve_output_dir(&args.output_dir)?;
    let outcome = app::run_pipeline(&output_dir, &options)?;

    if !outcome.skipped_inputs.is_empty() {
        info!("{} input document(s) skipped", outcome.skipped_inputs.len());
    }

    if args.summary || report_config.summary {
        print!("{}", output::format_summary(&outcome.summary));
    }
    println!("visit file://{}", outcome.report_path.display());

    Ok(())
}
