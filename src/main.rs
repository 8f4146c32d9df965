mod cli;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let client = cli.settings.client().await?;

    let message = match &cli.command {
        Commands::FindStartDate {
            sensor,
            earliest,
            latest,
        } => command::find_start_date(&client, sensor, *earliest, *latest).await?,
        Commands::Download { config } => command::download(&client, config).await?,
        Commands::Process { config } => command::process(&client, config).await?,
    };
    println!("{}", message);

    Ok(())
}
