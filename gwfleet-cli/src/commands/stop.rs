use clap::Args;

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Name of the instance(s) to stop
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: StopArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;

    let mut active_error = false;
    for target in args.targets {
        if let Err(e) = fleet.stop(&target).await {
            eprintln!("Error stopping instance '{}': {}", target, e);
            active_error = true;
        } else {
            println!("{}", target);
        }
    }

    if active_error {
        anyhow::bail!("Some instances could not be stopped");
    }
    Ok(())
}
