use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gwfleet::runtime::constants::envs;
use gwfleet::{FleetOptions, GatewayFleet};

use crate::commands::{
    create::CreateArgs, destroy::DestroyArgs, list::ListArgs, logs::LogsArgs,
    restart::RestartArgs, start::StartArgs, stop::StopArgs,
};

/// gwfleet - run several isolated gateway instances side by side
#[derive(Parser, Debug)]
#[command(name = "gwfleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List instances with their live status
    #[command(alias = "ls")]
    List(ListArgs),

    /// Register a new instance and generate its configuration
    Create(CreateArgs),

    /// Tear down an instance and release its ports
    #[command(alias = "rm")]
    Destroy(DestroyArgs),

    /// Start an instance's containers
    Start(StartArgs),

    /// Stop an instance's containers
    Stop(StopArgs),

    /// Stop then start an instance
    Restart(RestartArgs),

    /// Show an instance's container logs
    Logs(LogsArgs),
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Installation directory (registry, instance data, logs)
    #[arg(long, global = true, env = envs::GWFLEET_HOME)]
    pub home: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalFlags {
    pub fn create_fleet(&self) -> anyhow::Result<GatewayFleet> {
        let options = match &self.home {
            Some(home) => {
                let home = std::path::absolute(home)
                    .with_context(|| format!("invalid home directory {}", home.display()))?;
                FleetOptions::with_home(home)
            }
            None => FleetOptions::default(),
        };
        Ok(GatewayFleet::new(options)?)
    }
}
