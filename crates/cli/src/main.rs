use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Command-line entrypoint for the SHELF book service
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server until Ctrl-C
    Serve,
    /// Apply module migrations to the configured store and exit
    Migrate,
    /// Print the effective settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load SHELF settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            shelf_app::bootstrap::serve(settings).await
        }
        Command::Migrate => {
            shelf_telemetry::init(&settings.telemetry)?;
            let applied = shelf_app::bootstrap::migrate(&settings).await?;
            tracing::info!(applied, "migrations applied");
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
