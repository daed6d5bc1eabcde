use chrono::Local;
use clap::Args;
use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only display instance names
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: ListArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let fleet = global.create_fleet()?;
    let instances = fleet.list().await?;

    if args.quiet {
        for info in &instances {
            println!("{}", info.instance.name);
        }
        return Ok(());
    }

    if instances.is_empty() {
        println!("No instances. Create one with: gwfleet create <name>");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec!["NAME", "STATUS", "GATEWAY", "BRIDGE", "CREATED"]);

    for info in instances {
        let instance = info.instance;
        table.add_row(vec![
            instance.name,
            info.status.to_string(),
            instance.gateway_port.to_string(),
            instance.bridge_port.to_string(),
            instance
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}
