use clap::Args;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Instance name (letters, digits, '-' and '_', starting with a letter)
    pub name: String,

    /// Gateway port to use instead of automatic allocation (bridge is port + 1)
    #[arg(short, long)]
    pub port: Option<u32>,
}

pub async fn execute(args: CreateArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;
    let instance = fleet.create(&args.name, args.port)?;

    println!("{}", instance.name);
    println!("  gateway port: {}", instance.gateway_port);
    println!("  bridge port:  {}", instance.bridge_port);
    println!("  config dir:   {}", instance.config_dir.display());
    Ok(())
}
