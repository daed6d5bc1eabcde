//! gwfleet - manage a local fleet of gateway instances.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.global.debug {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gwfleet=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::debug!(command = ?cli.command, home = ?cli.global.home, "Running command");
    let global = &cli.global;
    match cli.command {
        Commands::List(args) => commands::list::execute(args, global).await,
        Commands::Create(args) => commands::create::execute(args, global).await,
        Commands::Destroy(args) => commands::destroy::execute(args, global).await,
        Commands::Start(args) => commands::start::execute(args, global).await,
        Commands::Stop(args) => commands::stop::execute(args, global).await,
        Commands::Restart(args) => commands::restart::execute(args, global).await,
        Commands::Logs(args) => commands::logs::execute(args, global).await,
    }
}
