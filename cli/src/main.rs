use clap::Parser;
use docket_cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    docket_cli::init_logging(cli.verbose);
    docket_cli::run_main(cli).await?;
    Ok(())
}
