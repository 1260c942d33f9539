use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::FinalResult;
use crate::processors::{ParallelProcessor, ProcessingSummary};
use crate::utils::progress::ProgressReporter;
use crate::writers::ReportWriter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, Level};
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let base_config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Process {
            input,
            output,
            format,
            tuning,
        } => {
            let config = tuning.apply(base_config);
            config.validate()?;
            let writer = ReportWriter::new().with_format(&format)?;

            let (result, summary) = aggregate(input, config, cli.quiet).await?;
            info!("{}", summary.summary());

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent)?;
                        }
                    }
                    writer.write_to_path(&result, &path)?;
                    info!(path = %path.display(), stations = result.len(), "Report written");
                }
                None => writer.write(&result, std::io::stdout().lock())?,
            }
        }

        Commands::Validate { input, tuning } => {
            let config = tuning.apply(base_config);
            config.validate()?;

            println!("Validating measurements file: {}", input.display());
            let (_result, summary) = aggregate(input, config, cli.quiet).await?;

            println!("\n{}", summary.summary());
            println!("✅ All records passed validation");
        }
    }

    Ok(())
}

/// Run the CPU-bound pipeline off the async runtime.
async fn aggregate(
    input: PathBuf,
    config: PipelineConfig,
    quiet: bool,
) -> Result<(FinalResult, ProcessingSummary)> {
    tokio::task::spawn_blocking(move || -> Result<(FinalResult, ProcessingSummary)> {
        let total_bytes = std::fs::metadata(&input)?.len();
        let progress = ProgressReporter::new_bytes(total_bytes, "Aggregating measurements...", quiet);
        ParallelProcessor::new(config).process_file(&input, Some(&progress))
    })
    .await?
}

fn log_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_target(false);

    let outcome = match log_file {
        Some(path) => {
            let level = log_level(verbose);
            let file = File::create(path)?;
            builder
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => {
            let level = log_level(verbose);
            builder
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .try_init()
        }
    };

    outcome.map_err(|e| ProcessingError::Config(format!("Failed to initialise logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_is_logged_by_default() {
        assert_eq!(log_level(false), Level::INFO);
        assert_eq!(log_level(true), Level::DEBUG);
    }
}
