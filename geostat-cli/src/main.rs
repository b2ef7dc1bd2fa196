//! geostat CLI - Command line tool for Georgian environmental statistics.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "geostat-cli",
    version,
    about = "Georgian environmental statistics chart data toolkit"
)]
struct Cli {
    #[command(flatten)]
    options: geostat_cmd::GlobalOptions,

    #[command(subcommand)]
    command: geostat_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    geostat_cmd::run(cli.options, cli.command).await
}
