use clap::Parser;
use measurements_processor::cli::{run, Cli};
use measurements_processor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
