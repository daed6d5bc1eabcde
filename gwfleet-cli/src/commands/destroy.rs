use std::io::{self, BufRead, Write};

use clap::Args;
use gwfleet::DestroyOptions;

#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Keep the instance's config and workspace directories on disk
    #[arg(long)]
    pub keep_data: bool,

    /// Name of the instance to destroy
    pub name: String,
}

pub async fn execute(args: DestroyArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;

    if !fleet.registry()?.contains(&args.name) {
        anyhow::bail!("No such instance: {}", args.name);
    }

    if !args.force && !confirm(&args.name, args.keep_data)? {
        eprintln!("Aborted");
        return Ok(());
    }

    fleet
        .destroy(
            &args.name,
            DestroyOptions {
                keep_data: args.keep_data,
            },
        )
        .await?;

    println!("{}", args.name);
    Ok(())
}

fn confirm(name: &str, keep_data: bool) -> anyhow::Result<bool> {
    let what = if keep_data {
        "its containers"
    } else {
        "its containers and data"
    };
    eprint!("Are you sure you want to destroy '{name}' and {what}? [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes"))
}
