use crate::config::{FinalRecordPolicy, PipelineConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "measurements-processor")]
#[command(about = "Per-station min/mean/max over large station;temperature files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Pipeline configuration file (TOML, JSON or YAML)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate a measurements file and print one line per station
    Process {
        #[arg(short, long, help = "Input measurements file")]
        input: PathBuf,

        #[arg(short, long, help = "Write the report to this file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "text", help = "Report format: text or json")]
        format: String,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Parse and aggregate a measurements file, printing only the run summary
    Validate {
        #[arg(short, long, help = "Input measurements file")]
        input: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

/// Overrides applied on top of the loaded configuration
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    #[arg(long, help = "Read buffer size in bytes")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Worker threads [default: CPUs + 1]")]
    pub workers: Option<usize>,

    #[arg(long, help = "Chunks allowed to wait for a worker")]
    pub queue_capacity: Option<usize>,

    #[arg(long, help = "Threads used to merge partial results")]
    pub merge_threads: Option<usize>,

    #[arg(long, help = "Accept a final record without a trailing newline")]
    pub allow_unterminated: bool,
}

impl TuningArgs {
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(queue_capacity) = self.queue_capacity {
            config.queue_capacity = queue_capacity;
        }
        if let Some(merge_threads) = self.merge_threads {
            config.merge_threads = merge_threads;
        }
        if self.allow_unterminated {
            config.final_record = FinalRecordPolicy::Accept;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_command() {
        let cli = Cli::try_parse_from([
            "measurements-processor",
            "process",
            "--input",
            "measurements.txt",
            "--output",
            "report.json",
            "--format",
            "json",
            "--workers",
            "4",
            "--allow-unterminated",
        ])
        .unwrap();

        match cli.command {
            Commands::Process {
                input,
                output,
                format,
                tuning,
            } => {
                assert_eq!(input, PathBuf::from("measurements.txt"));
                assert_eq!(output, Some(PathBuf::from("report.json")));
                assert_eq!(format, "json");

                let config = tuning.apply(PipelineConfig::default().with_chunk_size(4096));
                assert_eq!(config.workers, 4);
                assert_eq!(config.chunk_size, 4096);
                assert_eq!(config.final_record, FinalRecordPolicy::Accept);
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_input_file_is_required() {
        assert!(Cli::try_parse_from(["measurements-processor", "process"]).is_err());
        assert!(Cli::try_parse_from(["measurements-processor", "process", "measurements.txt"]).is_err());
    }

    #[test]
    fn test_parse_validate_short_input() {
        let cli = Cli::try_parse_from(["measurements-processor", "validate", "-i", "data.txt"]).unwrap();

        match cli.command {
            Commands::Validate { input, .. } => assert_eq!(input, PathBuf::from("data.txt")),
            _ => panic!("expected validate command"),
        }
    }
}
