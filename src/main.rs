use clap::Parser;
use surveyor::cli::Cli;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = surveyor::commands::run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
