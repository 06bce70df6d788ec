mod bootstrap_helpers;

use anyhow::Result;
use bootstrap_helpers::init_tracing;
use clap::Parser;
use herald_cli::{execute_cli, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let output = execute_cli(cli).await?;
    println!("{output}");
    Ok(())
}
