use clap::Parser;
use launchpad_edge::cli::{Cli, execute_command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    execute_command(&cli).await
}
