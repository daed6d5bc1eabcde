use clap::Args;

#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Name of the instance(s) to restart
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: RestartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;

    let mut errors = Vec::new();
    let mut success_count = 0;

    for target in args.targets {
        // A failed stop skips the start.
        if let Err(e) = fleet.restart(&target).await {
            eprintln!("Error restarting instance '{}': {}", target, e);
            errors.push(format!("{}: {}", target, e));
        } else {
            println!("{}", target);
            success_count += 1;
        }
    }

    if !errors.is_empty() {
        let error_summary = if success_count > 0 {
            format!(
                "Failed to restart {} of {} instance(s)",
                errors.len(),
                errors.len() + success_count
            )
        } else {
            format!("Failed to restart all {} instance(s)", errors.len())
        };

        anyhow::bail!("{}\nErrors:\n  {}", error_summary, errors.join("\n  "));
    }
    Ok(())
}
