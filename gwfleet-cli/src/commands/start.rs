use clap::Args;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Name of the instance(s) to start
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: StartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;

    let mut errors = Vec::new();
    let total = args.targets.len();

    for target in args.targets {
        match fleet.start(&target).await {
            Ok(()) => println!("{}", target),
            Err(e) => {
                eprintln!("Error starting instance '{}': {}", target, e);
                errors.push(format!("{}: {}", target, e));
            }
        }
    }

    if !errors.is_empty() {
        anyhow::bail!(
            "Failed to start {} of {} instance(s)\nErrors:\n  {}",
            errors.len(),
            total,
            errors.join("\n  ")
        );
    }
    Ok(())
}
