mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taskger")]
#[command(about = "A terminal client for the Taskger task service", long_about = None)]
struct Cli {
    /// Base URL of the remote task collection
    #[arg(
        long,
        env = "TASKGER_URL",
        default_value = "http://localhost:8080/api/tasks"
    )]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet unless RUST_LOG says otherwise; stderr keeps the TUI clean.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "off".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(url = %cli.url, "starting taskger");
    tui::run(cli.url).await
}
