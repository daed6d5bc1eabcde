use clap::Args;
use gwfleet::LogOptions;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Follow log output
    #[arg(short, long)]
    pub follow: bool,

    /// Number of lines to show from the end of the logs
    #[arg(short = 'n', long)]
    pub tail: Option<u32>,

    /// Name of the instance
    pub name: String,
}

pub async fn execute(args: LogsArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;
    fleet
        .logs(
            &args.name,
            LogOptions {
                follow: args.follow,
                tail: args.tail,
            },
        )
        .await?;
    Ok(())
}
